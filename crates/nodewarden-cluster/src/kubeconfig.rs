//! Minimal kubeconfig reader.
//!
//! Supports the current context's cluster (server, CA file or inline
//! data, insecure flag) and user (token, token file, client certificate
//! and key as files or inline data). Exec and auth-provider plugins are
//! not supported.

use std::path::{Path, PathBuf};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Deserialize;

use crate::connection::{ClusterAuth, ClusterConnection};
use crate::error::{ClusterError, ClusterResult};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct Kubeconfig {
    #[serde(default)]
    clusters: Vec<NamedCluster>,
    #[serde(default)]
    users: Vec<NamedUser>,
    #[serde(default)]
    contexts: Vec<NamedContext>,
    current_context: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NamedCluster {
    name: String,
    cluster: ClusterEntry,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct ClusterEntry {
    server: String,
    certificate_authority: Option<PathBuf>,
    certificate_authority_data: Option<String>,
    #[serde(default)]
    insecure_skip_tls_verify: bool,
}

#[derive(Debug, Deserialize)]
struct NamedUser {
    name: String,
    #[serde(default)]
    user: UserEntry,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct UserEntry {
    token: Option<String>,
    #[serde(rename = "tokenFile")]
    token_file: Option<PathBuf>,
    client_certificate: Option<PathBuf>,
    client_certificate_data: Option<String>,
    client_key: Option<PathBuf>,
    client_key_data: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NamedContext {
    name: String,
    context: ContextEntry,
}

#[derive(Debug, Deserialize)]
struct ContextEntry {
    cluster: String,
    user: Option<String>,
}

/// Load the current context of a kubeconfig file.
pub fn load(path: &Path) -> ClusterResult<ClusterConnection> {
    let content = std::fs::read_to_string(path).map_err(|source| ClusterError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let base = path.parent().unwrap_or_else(|| Path::new("."));
    parse(&content, base)
}

/// Parse kubeconfig text. Relative file references resolve against `base`.
pub fn parse(content: &str, base: &Path) -> ClusterResult<ClusterConnection> {
    let config: Kubeconfig =
        serde_yaml::from_str(content).map_err(|e| ClusterError::Kubeconfig(e.to_string()))?;

    let context = match &config.current_context {
        Some(name) => config
            .contexts
            .iter()
            .find(|c| &c.name == name)
            .ok_or_else(|| ClusterError::Kubeconfig(format!("context '{name}' not found")))?,
        None if config.contexts.len() == 1 => &config.contexts[0],
        None => return Err(ClusterError::Kubeconfig("current-context not set".to_string())),
    };

    let cluster = config
        .clusters
        .iter()
        .find(|c| c.name == context.context.cluster)
        .map(|c| &c.cluster)
        .ok_or_else(|| {
            ClusterError::Kubeconfig(format!("cluster '{}' not found", context.context.cluster))
        })?;

    let anonymous = UserEntry::default();
    let user = match &context.context.user {
        Some(name) => config
            .users
            .iter()
            .find(|u| &u.name == name)
            .map(|u| &u.user)
            .ok_or_else(|| ClusterError::Kubeconfig(format!("user '{name}' not found")))?,
        None => &anonymous,
    };

    let ca_pem = read_material(
        base,
        cluster.certificate_authority.as_deref(),
        cluster.certificate_authority_data.as_deref(),
    )?;

    Ok(ClusterConnection {
        server: cluster.server.trim_end_matches('/').to_string(),
        ca_pem,
        insecure: cluster.insecure_skip_tls_verify,
        auth: user_auth(base, user)?,
    })
}

fn user_auth(base: &Path, user: &UserEntry) -> ClusterResult<ClusterAuth> {
    if let Some(token) = user.token.as_deref().filter(|t| !t.is_empty()) {
        return Ok(ClusterAuth::Bearer(token.to_string()));
    }
    if let Some(file) = &user.token_file {
        let token = read_file(&resolve(base, file))?;
        return Ok(ClusterAuth::Bearer(String::from_utf8_lossy(&token).trim().to_string()));
    }

    let cert = read_material(
        base,
        user.client_certificate.as_deref(),
        user.client_certificate_data.as_deref(),
    )?;
    let key = read_material(base, user.client_key.as_deref(), user.client_key_data.as_deref())?;
    match (cert, key) {
        (Some(mut identity_pem), Some(key)) => {
            identity_pem.push(b'\n');
            identity_pem.extend_from_slice(&key);
            Ok(ClusterAuth::ClientCert { identity_pem })
        }
        (None, None) => Ok(ClusterAuth::None),
        _ => Err(ClusterError::Kubeconfig(
            "client certificate and key must be set together".to_string(),
        )),
    }
}

/// Inline base64 data wins over a file reference.
fn read_material(
    base: &Path,
    file: Option<&Path>,
    data: Option<&str>,
) -> ClusterResult<Option<Vec<u8>>> {
    if let Some(data) = data.filter(|d| !d.is_empty()) {
        let bytes = STANDARD
            .decode(data.trim())
            .map_err(|e| ClusterError::Kubeconfig(format!("invalid base64 data: {e}")))?;
        return Ok(Some(bytes));
    }
    match file {
        Some(path) => read_file(&resolve(base, path)).map(Some),
        None => Ok(None),
    }
}

fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

fn read_file(path: &Path) -> ClusterResult<Vec<u8>> {
    std::fs::read(path).map_err(|source| ClusterError::Io {
        path: path.to_path_buf(),
        source,
    })
}
