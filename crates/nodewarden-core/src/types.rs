//! Domain types shared across nodewarden crates.
//!
//! A reconciliation pass works on immutable snapshots: the cluster
//! produces `NodeObservation`s, the config produces `ResourceMapping`s,
//! and everything derived from them (`PowerState`, `RemediationDecision`,
//! `NotificationEvent`) is computed fresh per node and never persisted.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Name of a node in the cluster.
pub type NodeName = String;

/// Condition type that carries node readiness.
pub const READY_CONDITION: &str = "Ready";

// ── Node ───────────────────────────────────────────────────────────

/// Snapshot of a single cluster node, taken once per pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeObservation {
    pub name: NodeName,
    /// Raw status conditions as reported by the cluster.
    pub conditions: Vec<NodeCondition>,
    /// Internal address, empty when the node reports none.
    pub address: String,
    pub kubelet_version: String,
    pub os_image: String,
    pub architecture: String,
    pub allocatable: Allocatable,
}

impl NodeObservation {
    /// Observation with no metadata, for building fixtures.
    pub fn bare(name: &str, conditions: Vec<NodeCondition>) -> Self {
        Self {
            name: name.to_string(),
            conditions,
            address: String::new(),
            kubelet_version: String::new(),
            os_image: String::new(),
            architecture: String::new(),
            allocatable: Allocatable::default(),
        }
    }

    /// The readiness condition, if the node reports one.
    pub fn ready_condition(&self) -> Option<&NodeCondition> {
        self.conditions
            .iter()
            .find(|c| c.condition_type == READY_CONDITION)
    }
}

/// A single node condition (`Ready`, `MemoryPressure`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeCondition {
    pub condition_type: String,
    /// "True", "False" or "Unknown".
    pub status: String,
    pub last_transition: Option<DateTime<Utc>>,
}

impl NodeCondition {
    pub fn ready(status: &str, last_transition: Option<DateTime<Utc>>) -> Self {
        Self {
            condition_type: READY_CONDITION.to_string(),
            status: status.to_string(),
            last_transition,
        }
    }

    pub fn is_true(&self) -> bool {
        self.status == "True"
    }
}

/// Allocatable capacity as reported by the node, unparsed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Allocatable {
    pub cpu: String,
    pub memory: String,
    pub pods: String,
}

/// Coarse node status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeStatus {
    Ready,
    NotReady,
}

impl fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeStatus::Ready => f.write_str("Ready"),
            NodeStatus::NotReady => f.write_str("NotReady"),
        }
    }
}

// ── Mapping ────────────────────────────────────────────────────────

/// Node name → VM on a hypervisor host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceMapping {
    #[serde(rename = "kubernetesNodeName")]
    pub node_name: NodeName,
    /// Hypervisor host the VM lives on.
    #[serde(rename = "proxmoxNode")]
    pub host: String,
    pub vmid: u32,
}

impl ResourceMapping {
    pub fn new(node_name: &str, host: &str, vmid: u32) -> Self {
        Self {
            node_name: node_name.to_string(),
            host: host.to_string(),
            vmid,
        }
    }

    /// Human-readable description used in notifications.
    pub fn resource_info(&self) -> String {
        format!("Proxmox Node: {}, VM ID: {}", self.host, self.vmid)
    }
}

// ── Power state ────────────────────────────────────────────────────

/// Power state of a VM as reported by the hypervisor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PowerState {
    Stopped,
    Running,
    /// Anything else (paused, suspended, ...), with the raw status.
    Unrecognized(String),
}

impl PowerState {
    pub fn from_status(status: &str) -> Self {
        match status {
            "stopped" => PowerState::Stopped,
            "running" => PowerState::Running,
            other => PowerState::Unrecognized(other.to_string()),
        }
    }
}

impl fmt::Display for PowerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PowerState::Stopped => f.write_str("stopped"),
            PowerState::Running => f.write_str("running"),
            PowerState::Unrecognized(raw) => f.write_str(raw),
        }
    }
}

// ── Decision ───────────────────────────────────────────────────────

/// Outcome of the remediation decision table for one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RemediationDecision {
    SkipReady,
    SkipDisabled,
    SkipWithinGrace,
    SkipUnmapped,
    SkipQueryError,
    Remediate,
}

impl RemediationDecision {
    pub const ALL: [RemediationDecision; 6] = [
        RemediationDecision::SkipReady,
        RemediationDecision::SkipDisabled,
        RemediationDecision::SkipWithinGrace,
        RemediationDecision::SkipUnmapped,
        RemediationDecision::SkipQueryError,
        RemediationDecision::Remediate,
    ];

    /// Whether this decision produces a notification. Ready nodes are the
    /// only branch that stays silent.
    pub fn notifies(&self) -> bool {
        !matches!(self, RemediationDecision::SkipReady)
    }

    pub fn label(&self) -> &'static str {
        match self {
            RemediationDecision::SkipReady => "ready",
            RemediationDecision::SkipDisabled => "disabled",
            RemediationDecision::SkipWithinGrace => "within-grace",
            RemediationDecision::SkipUnmapped => "unmapped",
            RemediationDecision::SkipQueryError => "query-error",
            RemediationDecision::Remediate => "remediate",
        }
    }
}

impl fmt::Display for RemediationDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ── Notification ───────────────────────────────────────────────────

/// A single notification, built right before dispatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationEvent {
    pub node: NodeName,
    pub status: NodeStatus,
    /// Elapsed-duration text, e.g. "5m 0s".
    pub duration: String,
    pub address: String,
    /// Present when the node has a configured mapping.
    pub resource_info: Option<String>,
    /// True when remediation is about to be attempted.
    pub triggered: bool,
    pub timestamp: DateTime<Utc>,
}
