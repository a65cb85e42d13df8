//! Console report for a reconciliation pass.
//!
//! ```text
//! Name: w3
//!   Status: NotReady (for 5m 0s)
//!   Current VM Status: stopped
//!   Action: Restarting node via Proxmox (Node: pve1, VMID: 103)
//!   Notification: sent
//!   Restart: VM was stopped, started successfully
//!   IP: 10.0.0.3
//!   ...
//! ```

use nodewarden_core::{NodeStatus, RemediationDecision};
use nodewarden_health::format_elapsed;
use nodewarden_notify::Delivery;
use nodewarden_proxmox::PowerAction;

use crate::engine::NodeOutcome;
use crate::policy::Policy;
use crate::summary::PassSummary;

pub const HEADER: &str = "Kubernetes Cluster Nodes:\n=========================";

/// Render one node block, terminated by a blank line.
pub fn format_outcome(outcome: &NodeOutcome, policy: &Policy) -> String {
    let mut out = String::new();
    let node = &outcome.node;

    out.push_str(&format!("Name: {}\n", node.name));
    match outcome.health.status {
        NodeStatus::Ready => out.push_str("  Status: Ready\n"),
        NodeStatus::NotReady => out.push_str(&format!(
            "  Status: NotReady (for {})\n",
            outcome.health.elapsed_text
        )),
    }

    match outcome.decision {
        RemediationDecision::SkipReady => {}
        RemediationDecision::SkipDisabled => {
            out.push_str("  Action: Automatic restart disabled\n");
        }
        RemediationDecision::SkipWithinGrace => {
            out.push_str(&format!(
                "  Action: Node is NotReady but for less than {}, no restart needed\n",
                format_elapsed(policy.grace_period)
            ));
        }
        RemediationDecision::SkipUnmapped => {
            out.push_str(&format!(
                "  Action: No mapping found for node '{}' in config\n",
                node.name
            ));
        }
        RemediationDecision::SkipQueryError => {
            if let Some(e) = &outcome.query_error {
                out.push_str(&format!("  Status Error: {e}\n"));
            }
        }
        RemediationDecision::Remediate => {
            if let Some(state) = &outcome.power_state {
                out.push_str(&format!("  Current VM Status: {state}\n"));
            }
            if let Some(m) = &outcome.mapping {
                out.push_str(&format!(
                    "  Action: Restarting node via Proxmox (Node: {}, VMID: {})\n",
                    m.host, m.vmid
                ));
            }
        }
    }

    match &outcome.notification {
        Some(Ok(Delivery::Sent)) => out.push_str("  Notification: sent\n"),
        Some(Err(e)) => out.push_str(&format!("  Notification Error: {e}\n")),
        Some(Ok(Delivery::Disabled)) | None => {}
    }

    match &outcome.remediation {
        Some(Ok(PowerAction::Start)) => {
            out.push_str("  Restart: VM was stopped, started successfully\n");
        }
        Some(Ok(PowerAction::Reset)) => out.push_str("  Restart: Requested successfully\n"),
        Some(Err(e)) => out.push_str(&format!("  Restart Error: {e}\n")),
        None => {}
    }

    let a = &node.allocatable;
    out.push_str(&format!("  IP: {}\n", node.address));
    out.push_str(&format!("  Kubelet Version: {}\n", node.kubelet_version));
    out.push_str(&format!("  OS/Arch: {}/{}\n", node.os_image, node.architecture));
    out.push_str("  Allocatable Resources:\n");
    out.push_str(&format!("    CPU: {}\n", a.cpu));
    out.push_str(&format!("    Memory: {}\n", a.memory));
    out.push_str(&format!("    Pods: {}\n", a.pods));
    out.push('\n');
    out
}

/// One-line tally printed after the last node.
pub fn format_summary(summary: &PassSummary) -> String {
    let decisions = RemediationDecision::ALL
        .iter()
        .map(|d| format!("{} {}", d.label(), summary.count(*d)))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "Summary: {} nodes, {} not ready ({decisions}); actions issued {}, failed {}; notifications sent {}, failed {}",
        summary.nodes,
        summary.not_ready(),
        summary.actions_issued,
        summary.remediation_failures,
        summary.notifications_sent,
        summary.notification_failures,
    )
}
