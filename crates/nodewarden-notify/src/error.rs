//! Notification delivery errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("webhook request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("webhook rejected notification: status {status}, response: {body}")]
    Status { status: u16, body: String },
}

pub type DeliveryResult<T> = Result<T, DeliveryError>;
