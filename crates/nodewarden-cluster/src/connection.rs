//! Cluster endpoint resolution.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::debug;

use crate::error::{ClusterError, ClusterResult};
use crate::kubeconfig;

/// Timeout for API server requests.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const SERVICE_ACCOUNT_DIR: &str = "/var/run/secrets/kubernetes.io/serviceaccount";

/// How requests authenticate against the API server.
#[derive(Clone, PartialEq, Eq)]
pub enum ClusterAuth {
    None,
    Bearer(String),
    /// PEM certificate chain followed by the private key.
    ClientCert { identity_pem: Vec<u8> },
}

impl fmt::Debug for ClusterAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClusterAuth::None => f.write_str("None"),
            ClusterAuth::Bearer(_) => f.write_str("Bearer(<redacted>)"),
            ClusterAuth::ClientCert { .. } => f.write_str("ClientCert(<redacted>)"),
        }
    }
}

/// Everything needed to talk to one API server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterConnection {
    /// Base URL without trailing slash, e.g. `https://10.0.0.1:6443`.
    pub server: String,
    /// PEM bundle of trusted CAs, if any beyond the system roots.
    pub ca_pem: Option<Vec<u8>>,
    pub insecure: bool,
    pub auth: ClusterAuth,
}

/// Process environment consulted during resolution.
#[derive(Debug, Clone, Default)]
pub struct ResolveEnv {
    pub service_host: Option<String>,
    pub service_port: Option<String>,
    pub kubeconfig: Option<String>,
    pub home: Option<String>,
    pub service_account_dir: PathBuf,
}

impl ResolveEnv {
    pub fn from_process() -> Self {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());
        Self {
            service_host: var("KUBERNETES_SERVICE_HOST"),
            service_port: var("KUBERNETES_SERVICE_PORT"),
            kubeconfig: var("KUBECONFIG"),
            home: var("HOME"),
            service_account_dir: PathBuf::from(SERVICE_ACCOUNT_DIR),
        }
    }
}

impl ClusterConnection {
    /// Resolve the connection using the real process environment.
    pub fn resolve(explicit: Option<&Path>) -> ClusterResult<Self> {
        Self::resolve_with(explicit, &ResolveEnv::from_process())
    }

    /// Resolve in order: explicit kubeconfig, in-cluster service account,
    /// `$KUBECONFIG`, `$HOME/.kube/config`.
    pub fn resolve_with(explicit: Option<&Path>, env: &ResolveEnv) -> ClusterResult<Self> {
        if let Some(path) = explicit {
            debug!(path = %path.display(), "using configured kubeconfig");
            return kubeconfig::load(path);
        }

        if let Some(conn) = Self::in_cluster(env)? {
            debug!(server = %conn.server, "using in-cluster service account");
            return Ok(conn);
        }

        // Only the first entry of a multi-file $KUBECONFIG is read.
        if let Some(first) = env.kubeconfig.as_deref().and_then(|v| v.split(':').next()) {
            debug!(path = %first, "using $KUBECONFIG");
            return kubeconfig::load(Path::new(first));
        }

        if let Some(home) = &env.home {
            let path = Path::new(home).join(".kube").join("config");
            if path.exists() {
                debug!(path = %path.display(), "using default kubeconfig");
                return kubeconfig::load(&path);
            }
        }

        Err(ClusterError::NotConfigured)
    }

    /// In-cluster connection, or `None` when not running inside a pod.
    pub fn in_cluster(env: &ResolveEnv) -> ClusterResult<Option<Self>> {
        let (Some(host), Some(port)) = (&env.service_host, &env.service_port) else {
            return Ok(None);
        };

        let token_path = env.service_account_dir.join("token");
        let token = std::fs::read_to_string(&token_path).map_err(|source| ClusterError::Io {
            path: token_path,
            source,
        })?;

        let ca_path = env.service_account_dir.join("ca.crt");
        let ca_pem = std::fs::read(&ca_path).ok();

        let host = if host.contains(':') {
            format!("[{host}]")
        } else {
            host.clone()
        };

        Ok(Some(Self {
            server: format!("https://{host}:{port}"),
            ca_pem,
            insecure: false,
            auth: ClusterAuth::Bearer(token.trim().to_string()),
        }))
    }

    /// Build an HTTP client carrying this connection's TLS material.
    ///
    /// Bearer tokens are attached per request, not here.
    pub fn http_client(&self) -> ClusterResult<reqwest::Client> {
        let mut builder = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .danger_accept_invalid_certs(self.insecure);

        if let Some(pem) = &self.ca_pem {
            for cert in reqwest::Certificate::from_pem_bundle(pem)
                .map_err(|e| ClusterError::Tls(format!("CA bundle: {e}")))?
            {
                builder = builder.add_root_certificate(cert);
            }
        }

        if let ClusterAuth::ClientCert { identity_pem } = &self.auth {
            let identity = reqwest::Identity::from_pem(identity_pem)
                .map_err(|e| ClusterError::Tls(format!("client identity: {e}")))?;
            builder = builder.identity(identity);
        }

        builder.build().map_err(ClusterError::Client)
    }

    pub fn bearer_token(&self) -> Option<&str> {
        match &self.auth {
            ClusterAuth::Bearer(token) => Some(token),
            _ => None,
        }
    }
}
