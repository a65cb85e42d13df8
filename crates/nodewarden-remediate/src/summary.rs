//! Per-pass counters.

use std::collections::HashMap;

use nodewarden_core::RemediationDecision;
use nodewarden_notify::Delivery;

use crate::engine::NodeOutcome;

/// Tally of one reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassSummary {
    pub nodes: usize,
    decisions: HashMap<RemediationDecision, usize>,
    /// Power actions accepted by the hypervisor.
    pub actions_issued: usize,
    pub remediation_failures: usize,
    pub notifications_sent: usize,
    pub notification_failures: usize,
}

impl PassSummary {
    pub fn record(&mut self, outcome: &NodeOutcome) {
        self.nodes += 1;
        *self.decisions.entry(outcome.decision).or_default() += 1;

        match &outcome.remediation {
            Some(Ok(_)) => self.actions_issued += 1,
            Some(Err(_)) => self.remediation_failures += 1,
            None => {}
        }
        match &outcome.notification {
            Some(Ok(Delivery::Sent)) => self.notifications_sent += 1,
            Some(Err(_)) => self.notification_failures += 1,
            Some(Ok(Delivery::Disabled)) | None => {}
        }
    }

    pub fn count(&self, decision: RemediationDecision) -> usize {
        self.decisions.get(&decision).copied().unwrap_or(0)
    }

    /// Nodes that were not Ready.
    pub fn not_ready(&self) -> usize {
        self.nodes - self.count(RemediationDecision::SkipReady)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_summary() {
        let summary = PassSummary::default();
        assert_eq!(summary.nodes, 0);
        assert_eq!(summary.not_ready(), 0);
        for decision in RemediationDecision::ALL {
            assert_eq!(summary.count(decision), 0);
        }
    }
}
