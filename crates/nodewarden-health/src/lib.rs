//! nodewarden-health — node readiness classification.
//!
//! Turns the raw condition list of a `NodeObservation` into a coarse
//! `NodeStatus` plus how long the node has been NotReady.
//!
//! # Policy
//!
//! ```text
//! Ready condition  status   →  NodeStatus  elapsed
//! ───────────────  ──────      ──────────  ───────────────────────────
//! present          True     →  Ready       —
//! present          other    →  NotReady    now - lastTransitionTime
//! absent           —        →  Ready       —   (permissive default)
//! ```
//!
//! A node that reports no readiness signal at all is treated as healthy
//! and is never remediated.
//!
//! Elapsed time is measured against the wall clock at classification
//! time, so it grows from one pass to the next.

pub mod classifier;
pub mod duration;

pub use classifier::{classify, classify_at, NodeHealth};
pub use duration::format_elapsed;
