//! nodewarden configuration parser.
//!
//! The file format follows the extension: `.toml` is parsed as TOML,
//! anything else as YAML. Keys are camelCase in both.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};
use crate::mapping::ResourceMapper;
use crate::types::ResourceMapping;

/// Default config path when neither flag nor environment sets one.
pub const DEFAULT_CONFIG_PATH: &str = "config.yaml";

/// Grace period applied when the config does not set one.
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    pub proxmox: ProxmoxConfig,
    pub discord: DiscordConfig,
    pub remediation: RemediationConfig,
    pub cluster: ClusterConfig,
    pub nodes: Vec<ResourceMapping>,
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProxmoxConfig {
    /// Base API URL, e.g. `https://pve:8006/api2/json`.
    pub api_url: String,
    pub username: String,
    pub password: String,
    pub token_id: String,
    pub token_secret: String,
    pub insecure_skip_tls_verify: bool,
}

impl ProxmoxConfig {
    /// The API token pair, when both halves are set.
    pub fn token(&self) -> Option<(&str, &str)> {
        if self.token_id.is_empty() || self.token_secret.is_empty() {
            None
        } else {
            Some((&self.token_id, &self.token_secret))
        }
    }
}

impl Default for ProxmoxConfig {
    fn default() -> Self {
        Self {
            api_url: String::new(),
            username: String::new(),
            password: String::new(),
            token_id: String::new(),
            token_secret: String::new(),
            insecure_skip_tls_verify: true,
        }
    }
}

impl fmt::Debug for ProxmoxConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxmoxConfig")
            .field("api_url", &self.api_url)
            .field("username", &self.username)
            .field("password", &redacted(&self.password))
            .field("token_id", &self.token_id)
            .field("token_secret", &redacted(&self.token_secret))
            .field("insecure_skip_tls_verify", &self.insecure_skip_tls_verify)
            .finish()
    }
}

fn redacted(secret: &str) -> &'static str {
    if secret.is_empty() { "" } else { "<redacted>" }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DiscordConfig {
    pub webhook_url: String,
    pub enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RemediationConfig {
    /// How long a node must be NotReady before remediation ("1m", "90s").
    pub grace_period: String,
}

impl Default for RemediationConfig {
    fn default() -> Self {
        Self {
            grace_period: "1m".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClusterConfig {
    /// Explicit kubeconfig; takes precedence over in-cluster discovery.
    pub kubeconfig: Option<PathBuf>,
}

impl Config {
    /// Load and validate a config file.
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let is_toml = path.extension().is_some_and(|ext| ext == "toml");
        if is_toml {
            Self::from_toml_str(&content)
        } else {
            Self::from_yaml_str(&content)
        }
    }

    pub fn from_yaml_str(content: &str) -> ConfigResult<Self> {
        // An empty YAML document deserializes as null; treat it as defaults.
        let config: Config = if content.trim().is_empty() {
            Config::default()
        } else {
            serde_yaml::from_str(content)?
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check invariants that serde cannot express.
    pub fn validate(&self) -> ConfigResult<()> {
        self.grace_period()?;
        ResourceMapper::new(self.nodes.clone())?;
        Ok(())
    }

    pub fn grace_period(&self) -> ConfigResult<Duration> {
        parse_duration(&self.remediation.grace_period)
            .ok_or_else(|| ConfigError::InvalidDuration(self.remediation.grace_period.clone()))
    }

    /// Build the node mapper from the configured mappings.
    pub fn mapper(&self) -> ConfigResult<ResourceMapper> {
        ResourceMapper::new(self.nodes.clone())
    }
}

/// Parse a duration string like "5s", "500ms", "1m", "2h".
///
/// A plain number is taken as seconds. Values that overflow are rejected.
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    if let Some(ms) = s.strip_suffix("ms") {
        ms.parse::<u64>().ok().map(Duration::from_millis)
    } else if let Some(secs) = s.strip_suffix('s') {
        secs.parse::<u64>().ok().map(Duration::from_secs)
    } else if let Some(mins) = s.strip_suffix('m') {
        let m = mins.parse::<u64>().ok()?;
        m.checked_mul(60).map(Duration::from_secs)
    } else if let Some(hours) = s.strip_suffix('h') {
        let h = hours.parse::<u64>().ok()?;
        h.checked_mul(3600).map(Duration::from_secs)
    } else {
        s.parse::<u64>().ok().map(Duration::from_secs)
    }
}
