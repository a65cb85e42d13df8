//! Cluster client error types.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClusterError {
    #[error("no cluster configuration found (not in-cluster and no kubeconfig)")]
    NotConfigured,

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid kubeconfig: {0}")]
    Kubeconfig(String),

    #[error("invalid TLS material: {0}")]
    Tls(String),

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("node list request failed: {0}")]
    Request(#[source] reqwest::Error),

    #[error("node list rejected: status {status}, response: {body}")]
    Status { status: u16, body: String },

    #[error("invalid node list response: {0}")]
    Decode(String),
}

pub type ClusterResult<T> = Result<T, ClusterError>;
