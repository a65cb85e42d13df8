//! Power-state driver error types.

use thiserror::Error;

use crate::driver::PowerAction;

/// Errors raised while talking to the hypervisor.
#[derive(Debug, Error)]
pub enum ProxmoxError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("failed to query VM {vmid} on {host}: {reason}")]
    RemoteQuery {
        host: String,
        vmid: u32,
        reason: String,
    },

    #[error("VM {action} failed for {vmid} on {host}: {reason}")]
    RemoteAction {
        host: String,
        vmid: u32,
        action: PowerAction,
        reason: String,
    },

    /// The VM is in a state remediation does not handle (paused, suspended).
    #[error("unsupported VM state '{state}' for {vmid} on {host}")]
    UnsupportedState {
        host: String,
        vmid: u32,
        state: String,
    },
}

pub type ProxmoxResult<T> = Result<T, ProxmoxError>;
