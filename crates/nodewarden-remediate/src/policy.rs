//! Remediation policy and the pre-query part of the decision table.

use std::time::Duration;

use nodewarden_core::config::DEFAULT_GRACE_PERIOD;
use nodewarden_core::{RemediationDecision, ResourceMapping};
use nodewarden_health::NodeHealth;

/// Knobs that decide whether a NotReady node may be remediated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Policy {
    /// Set by `--restart`. Off by default.
    pub remediation_enabled: bool,
    /// A node must be NotReady strictly longer than this.
    pub grace_period: Duration,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            remediation_enabled: false,
            grace_period: DEFAULT_GRACE_PERIOD,
        }
    }
}

/// Result of the static checks, before the hypervisor is contacted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate<'m> {
    /// Decided without touching the hypervisor.
    Skip(RemediationDecision),
    /// Eligible; query the power state of this VM next.
    Probe(&'m ResourceMapping),
}

/// Evaluate the decision table up to (not including) the state query.
pub fn gate<'m>(
    policy: &Policy,
    health: &NodeHealth,
    mapping: Option<&'m ResourceMapping>,
) -> Gate<'m> {
    if health.is_ready() {
        return Gate::Skip(RemediationDecision::SkipReady);
    }
    if !policy.remediation_enabled {
        return Gate::Skip(RemediationDecision::SkipDisabled);
    }
    if health.elapsed <= policy.grace_period {
        return Gate::Skip(RemediationDecision::SkipWithinGrace);
    }
    match mapping {
        Some(mapping) => Gate::Probe(mapping),
        None => Gate::Skip(RemediationDecision::SkipUnmapped),
    }
}
