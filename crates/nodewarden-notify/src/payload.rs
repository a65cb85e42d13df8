//! Discord webhook payload.

use chrono::SecondsFormat;
use serde::Serialize;

use nodewarden_core::NotificationEvent;

const BOT_NAME: &str = "K8s Node Monitor";
const ICON_URL: &str = "https://kubernetes.io/images/favicon.png";
const TITLE: &str = "Kubernetes Node NotReady Alert";

/// Red: NotReady, nothing done.
pub const COLOR_ALERT: u32 = 0xFF0000;
/// Yellow: NotReady, restart triggered.
pub const COLOR_RESTARTING: u32 = 0xFFFF00;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WebhookPayload {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub username: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub avatar_url: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub content: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub embeds: Vec<Embed>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Embed {
    pub title: String,
    pub description: String,
    pub color: u32,
    pub fields: Vec<EmbedField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<EmbedImage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footer: Option<EmbedFooter>,
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub inline: bool,
}

impl EmbedField {
    fn inline(name: &str, value: &str) -> Self {
        Self {
            name: name.to_string(),
            value: value.to_string(),
            inline: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmbedImage {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmbedFooter {
    pub text: String,
}

impl WebhookPayload {
    /// Render a notification event as a single-embed payload.
    pub fn for_event(event: &NotificationEvent) -> Self {
        let mut description = format!(
            "Node `{}` is in **{}** state for {}",
            event.node, event.status, event.duration
        );
        if event.triggered {
            description.push_str("\nAutomatic restart has been triggered.");
        }

        let status = event.status.to_string();
        let mut fields = vec![
            EmbedField::inline("Node", &event.node),
            EmbedField::inline("Status", &status),
            EmbedField::inline("Duration", &event.duration),
            EmbedField::inline("IP Address", &event.address),
        ];
        if let Some(info) = event.resource_info.as_deref().filter(|s| !s.is_empty()) {
            fields.push(EmbedField {
                name: "VM Info".to_string(),
                value: info.to_string(),
                inline: false,
            });
        }

        let embed = Embed {
            title: TITLE.to_string(),
            description,
            color: if event.triggered { COLOR_RESTARTING } else { COLOR_ALERT },
            fields,
            thumbnail: Some(EmbedImage {
                url: ICON_URL.to_string(),
            }),
            footer: Some(EmbedFooter {
                text: BOT_NAME.to_string(),
            }),
            timestamp: event.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
        };

        Self {
            username: BOT_NAME.to_string(),
            avatar_url: ICON_URL.to_string(),
            content: String::new(),
            embeds: vec![embed],
        }
    }
}
