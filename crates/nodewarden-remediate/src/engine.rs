//! Reconciler — drives one node at a time through the decision table.

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use nodewarden_core::{
    NodeObservation, NotificationEvent, PowerState, RemediationDecision, ResourceMapper,
    ResourceMapping,
};
use nodewarden_health::{classify_at, NodeHealth};
use nodewarden_notify::{Delivery, DeliveryResult, Notifier};
use nodewarden_proxmox::{remediate, PowerAction, PowerDriver, ProxmoxError, ProxmoxResult, Session};

use crate::policy::{gate, Gate, Policy};
use crate::summary::PassSummary;

/// Everything that happened to one node during a pass.
#[derive(Debug)]
pub struct NodeOutcome {
    pub node: NodeObservation,
    pub health: NodeHealth,
    pub decision: RemediationDecision,
    pub mapping: Option<ResourceMapping>,
    /// State seen by the eligibility query, when one was made.
    pub power_state: Option<PowerState>,
    pub query_error: Option<ProxmoxError>,
    /// `None` only for Ready nodes, which are never announced.
    pub notification: Option<DeliveryResult<Delivery>>,
    /// Set only when the decision is `Remediate`.
    pub remediation: Option<ProxmoxResult<PowerAction>>,
}

impl NodeOutcome {
    fn new(node: &NodeObservation, health: NodeHealth, mapping: Option<&ResourceMapping>) -> Self {
        Self {
            node: node.clone(),
            health,
            decision: RemediationDecision::SkipReady,
            mapping: mapping.cloned(),
            power_state: None,
            query_error: None,
            notification: None,
            remediation: None,
        }
    }
}

/// Per-pass remediation engine.
///
/// Holds the hypervisor session for the lifetime of the reconciler. The
/// session is established on first use and reused afterwards; a failed
/// authentication is not remembered.
pub struct Reconciler<'a, D: ?Sized, N: ?Sized> {
    driver: &'a D,
    notifier: &'a N,
    mapper: &'a ResourceMapper,
    policy: Policy,
    session: Option<Session>,
}

impl<'a, D, N> Reconciler<'a, D, N>
where
    D: PowerDriver + ?Sized,
    N: Notifier + ?Sized,
{
    pub fn new(driver: &'a D, notifier: &'a N, mapper: &'a ResourceMapper, policy: Policy) -> Self {
        Self {
            driver,
            notifier,
            mapper,
            policy,
            session: None,
        }
    }

    /// Reconcile every node in order, handing each outcome to `on_outcome`
    /// as soon as it is known.
    pub async fn run_pass<F>(&mut self, nodes: &[NodeObservation], mut on_outcome: F) -> PassSummary
    where
        F: FnMut(&NodeOutcome),
    {
        info!(
            nodes = nodes.len(),
            remediation_enabled = self.policy.remediation_enabled,
            grace_secs = self.policy.grace_period.as_secs(),
            "starting reconciliation pass"
        );

        let mut summary = PassSummary::default();
        for node in nodes {
            let outcome = self.reconcile_node(node).await;
            summary.record(&outcome);
            on_outcome(&outcome);
        }

        info!(
            nodes = summary.nodes,
            remediated = summary.count(RemediationDecision::Remediate),
            remediation_failures = summary.remediation_failures,
            notification_failures = summary.notification_failures,
            "reconciliation pass complete"
        );
        summary
    }

    pub async fn reconcile_node(&mut self, node: &NodeObservation) -> NodeOutcome {
        self.reconcile_node_at(node, Utc::now()).await
    }

    /// Reconcile one node, classifying it against `now`.
    pub async fn reconcile_node_at(
        &mut self,
        node: &NodeObservation,
        now: DateTime<Utc>,
    ) -> NodeOutcome {
        let health = classify_at(node, now);
        let mapper = self.mapper;
        let mapping = mapper.find(&node.name);
        let mut outcome = NodeOutcome::new(node, health, mapping);

        let target = match gate(&self.policy, &outcome.health, mapping) {
            Gate::Skip(RemediationDecision::SkipReady) => {
                debug!(node = %node.name, "node is ready");
                return outcome;
            }
            Gate::Skip(decision) => {
                outcome.decision = decision;
                None
            }
            Gate::Probe(target) => match self.query(target).await {
                Ok(state) => {
                    outcome.decision = RemediationDecision::Remediate;
                    outcome.power_state = Some(state);
                    Some(target)
                }
                Err(e) => {
                    warn!(
                        node = %node.name,
                        host = %target.host,
                        vmid = target.vmid,
                        error = %e,
                        "VM state query failed, skipping remediation"
                    );
                    outcome.decision = RemediationDecision::SkipQueryError;
                    outcome.query_error = Some(e);
                    None
                }
            },
        };

        info!(
            node = %node.name,
            decision = %outcome.decision,
            elapsed = %outcome.health.elapsed_text,
            "node is not ready"
        );

        // Announce first, then act.
        let event = notification_event(&outcome, target.is_some(), now);
        outcome.notification = Some(self.notify(&event).await);

        if let Some(target) = target {
            outcome.remediation = Some(self.power_cycle(&node.name, target).await);
        }

        outcome
    }

    async fn session(&mut self) -> ProxmoxResult<Session> {
        if let Some(session) = &self.session {
            return Ok(session.clone());
        }
        let session = self.driver.authenticate().await?;
        debug!(kind = session.kind(), "hypervisor session established");
        self.session = Some(session.clone());
        Ok(session)
    }

    async fn query(&mut self, target: &ResourceMapping) -> ProxmoxResult<PowerState> {
        let session = self.session().await?;
        self.driver
            .query_state(&session, &target.host, target.vmid)
            .await
    }

    async fn power_cycle(
        &mut self,
        node: &str,
        target: &ResourceMapping,
    ) -> ProxmoxResult<PowerAction> {
        let session = self.session().await?;
        let result = remediate(self.driver, &session, &target.host, target.vmid).await;
        match &result {
            Ok(action) => info!(
                %node,
                host = %target.host,
                vmid = target.vmid,
                %action,
                "remediation issued"
            ),
            Err(e) => warn!(
                %node,
                host = %target.host,
                vmid = target.vmid,
                error = %e,
                "remediation failed"
            ),
        }
        result
    }

    async fn notify(&self, event: &NotificationEvent) -> DeliveryResult<Delivery> {
        let result = self.notifier.send(event).await;
        match &result {
            Ok(Delivery::Sent) => {
                debug!(node = %event.node, triggered = event.triggered, "notification sent")
            }
            Ok(Delivery::Disabled) => debug!(node = %event.node, "notifications disabled"),
            Err(e) => warn!(node = %event.node, error = %e, "notification failed"),
        }
        result
    }
}

fn notification_event(
    outcome: &NodeOutcome,
    triggered: bool,
    now: DateTime<Utc>,
) -> NotificationEvent {
    NotificationEvent {
        node: outcome.node.name.clone(),
        status: outcome.health.status,
        duration: outcome.health.elapsed_text.clone(),
        address: outcome.node.address.clone(),
        resource_info: outcome.mapping.as_ref().map(ResourceMapping::resource_info),
        triggered,
        timestamp: now,
    }
}
