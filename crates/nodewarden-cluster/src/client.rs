//! Node listing client.

use std::future::Future;
use std::pin::Pin;

use tracing::debug;

use nodewarden_core::NodeObservation;
use nodewarden_core::config::ClusterConfig;

use crate::connection::ClusterConnection;
use crate::error::{ClusterError, ClusterResult};
use crate::nodes::NodeList;

const NODES_PATH: &str = "/api/v1/nodes";

/// Boxed future returned by [`NodeSource::list_nodes`].
pub type NodesFuture<'a> =
    Pin<Box<dyn Future<Output = ClusterResult<Vec<NodeObservation>>> + Send + 'a>>;

/// Source of node snapshots. Injected for testability.
pub trait NodeSource: Send + Sync {
    /// List every node, or fail as a whole.
    fn list_nodes(&self) -> NodesFuture<'_>;
}

/// Read-only client for the Kubernetes node API.
#[derive(Debug, Clone)]
pub struct KubeClient {
    http: reqwest::Client,
    server: String,
    token: Option<String>,
}

impl KubeClient {
    pub fn new(conn: &ClusterConnection) -> ClusterResult<Self> {
        Ok(Self {
            http: conn.http_client()?,
            server: conn.server.trim_end_matches('/').to_string(),
            token: conn.bearer_token().map(str::to_string),
        })
    }

    /// Resolve the connection from config and the process environment.
    pub fn from_config(config: &ClusterConfig) -> ClusterResult<Self> {
        let conn = ClusterConnection::resolve(config.kubeconfig.as_deref())?;
        Self::new(&conn)
    }

    pub fn server(&self) -> &str {
        &self.server
    }

    pub async fn nodes(&self) -> ClusterResult<Vec<NodeObservation>> {
        let url = format!("{}{NODES_PATH}", self.server);
        let mut req = self.http.get(&url);
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }

        let resp = req.send().await.map_err(ClusterError::Request)?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ClusterError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = resp.bytes().await.map_err(ClusterError::Request)?;
        let list: NodeList =
            serde_json::from_slice(&body).map_err(|e| ClusterError::Decode(e.to_string()))?;

        debug!(server = %self.server, count = list.items.len(), "listed nodes");
        Ok(list.items.into_iter().map(NodeObservation::from).collect())
    }
}

impl NodeSource for KubeClient {
    fn list_nodes(&self) -> NodesFuture<'_> {
        Box::pin(self.nodes())
    }
}
