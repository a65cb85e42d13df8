//! nodewarden-notify — webhook notifications for remediation decisions.
//!
//! Every decision except "node is Ready" produces exactly one
//! [`NotificationEvent`](nodewarden_core::NotificationEvent), rendered as a
//! Discord-style embed and POSTed to the configured webhook.
//!
//! A disabled dispatcher, or one without a URL, accepts every event and
//! sends nothing. Delivery failures are returned to the caller, which logs
//! them and carries on; they never change a remediation decision.

pub mod dispatcher;
pub mod error;
pub mod payload;

pub use dispatcher::{Delivery, NotifyFuture, Notifier, WebhookDispatcher};
pub use error::{DeliveryError, DeliveryResult};
pub use payload::WebhookPayload;
