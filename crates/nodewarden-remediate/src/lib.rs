//! nodewarden-remediate — the per-node remediation decision engine.
//!
//! Combines readiness classification, the node → VM mapping, the power
//! driver and the notifier into a single pass over the node list.
//!
//! # Decision table
//!
//! ```text
//! classify ──► Ready ─────────────────────────────► SkipReady        (silent)
//!          └─► NotReady
//!               ├─ remediation disabled ──────────► SkipDisabled     notify
//!               ├─ elapsed <= grace ──────────────► SkipWithinGrace  notify
//!               ├─ no mapping ────────────────────► SkipUnmapped     notify
//!               ├─ state query fails ─────────────► SkipQueryError   notify
//!               └─ otherwise ─────────────────────► Remediate        notify(triggered)
//!                                                      then start / reset
//! ```
//!
//! Rows are evaluated top to bottom; the first match wins.
//!
//! # Announce, then act
//!
//! For `Remediate`, the triggered notification is dispatched before the
//! power action is issued. A failed action is logged and recorded in the
//! [`NodeOutcome`] but is not followed by a second notification.
//!
//! Nodes are processed strictly one after another. No per-node failure
//! stops the pass.

pub mod engine;
pub mod policy;
pub mod report;
pub mod summary;

pub use engine::{NodeOutcome, Reconciler};
pub use policy::{gate, Gate, Policy};
pub use report::{format_outcome, format_summary};
pub use summary::PassSummary;
