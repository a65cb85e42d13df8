//! Webhook notification dispatcher.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use tracing::debug;

use nodewarden_core::NotificationEvent;
use nodewarden_core::config::DiscordConfig;

use crate::error::{DeliveryError, DeliveryResult};
use crate::payload::WebhookPayload;

/// Timeout for a single webhook delivery.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Boxed future returned by [`Notifier::send`].
pub type NotifyFuture<'a> = Pin<Box<dyn Future<Output = DeliveryResult<Delivery>> + Send + 'a>>;

/// What happened to a notification that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Sent,
    /// Notifications are off or no endpoint is configured.
    Disabled,
}

/// Sink for notification events. Injected for testability.
pub trait Notifier: Send + Sync {
    fn send<'a>(&'a self, event: &'a NotificationEvent) -> NotifyFuture<'a>;
}

/// Posts events to a Discord-compatible webhook.
#[derive(Debug, Clone)]
pub struct WebhookDispatcher {
    http: reqwest::Client,
    url: String,
    enabled: bool,
}

impl WebhookDispatcher {
    pub fn new(url: &str, enabled: bool) -> DeliveryResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(DeliveryError::Client)?;
        Ok(Self {
            http,
            url: url.to_string(),
            enabled,
        })
    }

    pub fn from_config(config: &DiscordConfig) -> DeliveryResult<Self> {
        Self::new(&config.webhook_url, config.enabled)
    }

    pub fn is_active(&self) -> bool {
        self.enabled && !self.url.is_empty()
    }

    pub async fn deliver(&self, event: &NotificationEvent) -> DeliveryResult<Delivery> {
        if !self.is_active() {
            return Ok(Delivery::Disabled);
        }

        let payload = WebhookPayload::for_event(event);
        let resp = self
            .http
            .post(&self.url)
            .json(&payload)
            .send()
            .await
            .map_err(DeliveryError::Transport)?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(DeliveryError::Status {
                status: status.as_u16(),
                body,
            });
        }

        debug!(node = %event.node, triggered = event.triggered, "notification delivered");
        Ok(Delivery::Sent)
    }
}

impl Notifier for WebhookDispatcher {
    fn send<'a>(&'a self, event: &'a NotificationEvent) -> NotifyFuture<'a> {
        Box::pin(self.deliver(event))
    }
}
