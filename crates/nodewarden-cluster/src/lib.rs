//! nodewarden-cluster — read-only access to cluster nodes.
//!
//! Lists nodes from the Kubernetes API (`GET /api/v1/nodes`) and converts
//! them into `NodeObservation` snapshots.
//!
//! # Connection resolution
//!
//! ```text
//! 1. cluster.kubeconfig from the nodewarden config
//! 2. in-cluster service account (KUBERNETES_SERVICE_HOST/PORT)
//! 3. $KUBECONFIG
//! 4. $HOME/.kube/config
//! ```
//!
//! Any failure while listing is fatal to the pass: a partial node list is
//! never returned.

pub mod client;
pub mod connection;
pub mod error;
pub mod kubeconfig;
pub mod nodes;

pub use client::{KubeClient, NodeSource, NodesFuture};
pub use connection::{ClusterAuth, ClusterConnection, ResolveEnv};
pub use error::{ClusterError, ClusterResult};
