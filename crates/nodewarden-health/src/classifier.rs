//! Readiness classification for a single node.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::debug;

use nodewarden_core::{NodeObservation, NodeStatus};

use crate::duration::format_elapsed;

/// Classified health of one node at one instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeHealth {
    pub status: NodeStatus,
    /// When the Ready condition last changed. `None` for Ready nodes.
    pub last_transition: Option<DateTime<Utc>>,
    /// Time spent NotReady. Zero for Ready nodes.
    pub elapsed: Duration,
    /// `elapsed` formatted for humans. Empty for Ready nodes.
    pub elapsed_text: String,
}

impl NodeHealth {
    fn ready() -> Self {
        Self {
            status: NodeStatus::Ready,
            last_transition: None,
            elapsed: Duration::ZERO,
            elapsed_text: String::new(),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.status == NodeStatus::Ready
    }
}

/// Classify a node against the current wall clock.
pub fn classify(node: &NodeObservation) -> NodeHealth {
    classify_at(node, Utc::now())
}

/// Classify a node against an explicit `now`.
///
/// A NotReady node without a transition timestamp is reported with zero
/// elapsed time. A transition in the future (clock skew) also clamps to
/// zero.
pub fn classify_at(node: &NodeObservation, now: DateTime<Utc>) -> NodeHealth {
    let condition = match node.ready_condition() {
        Some(c) => c,
        None => {
            debug!(node = %node.name, "no Ready condition, treating as Ready");
            return NodeHealth::ready();
        }
    };

    if condition.is_true() {
        return NodeHealth::ready();
    }

    let elapsed = condition
        .last_transition
        .and_then(|since| (now - since).to_std().ok())
        .unwrap_or(Duration::ZERO);

    NodeHealth {
        status: NodeStatus::NotReady,
        last_transition: condition.last_transition,
        elapsed,
        elapsed_text: format_elapsed(elapsed),
    }
}
