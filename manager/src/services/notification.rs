use chrono::{DateTime, Utc};
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::database::{Database, NotificationSettings};
use crate::errors::ValidationError;

const COLOR_BLUE: u32 = 0x3B82F6;
const COLOR_AMBER: u32 = 0xF59E0B;
const COLOR_RED: u32 = 0xEF4444;
const COLOR_PURPLE: u32 = 0x8B5CF6;
const COLOR_EMERALD: u32 = 0x10B981;

const WEBHOOK_HOSTS: &[&str] = &["discord.com", "discordapp.com"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationEvent {
    DnsRecordAdd,
    DnsRecordEdit,
    DnsRecordDelete,
    WatcherAdd,
    WatcherEdit,
    WatcherDelete,
    WatcherIpUpdateManual,
    WatcherIpUpdateAuto,
    WatcherMismatch,
}

impl NotificationEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationEvent::DnsRecordAdd => "dns_record_add",
            NotificationEvent::DnsRecordEdit => "dns_record_edit",
            NotificationEvent::DnsRecordDelete => "dns_record_delete",
            NotificationEvent::WatcherAdd => "watcher_add",
            NotificationEvent::WatcherEdit => "watcher_edit",
            NotificationEvent::WatcherDelete => "watcher_delete",
            NotificationEvent::WatcherIpUpdateManual => "watcher_ip_update_manual",
            NotificationEvent::WatcherIpUpdateAuto => "watcher_ip_update_auto",
            NotificationEvent::WatcherMismatch => "watcher_mismatch",
        }
    }

    /// The toggle in the settings matrix that gates this event
    pub fn is_enabled(&self, settings: &NotificationSettings) -> bool {
        match self {
            NotificationEvent::DnsRecordAdd => settings.dns_record_add,
            NotificationEvent::DnsRecordEdit => settings.dns_record_edit,
            NotificationEvent::DnsRecordDelete => settings.dns_record_delete,
            NotificationEvent::WatcherAdd => settings.watcher_add,
            NotificationEvent::WatcherEdit => settings.watcher_edit,
            NotificationEvent::WatcherDelete => settings.watcher_delete,
            NotificationEvent::WatcherIpUpdateManual => settings.watcher_ip_update_manual,
            NotificationEvent::WatcherIpUpdateAuto => settings.watcher_ip_update_auto,
            NotificationEvent::WatcherMismatch => settings.watcher_mismatch,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPayload {
    pub domain: Option<String>,
    pub record_type: Option<String>,
    pub content: Option<String>,
    pub old_content: Option<String>,
    pub new_content: Option<String>,
    pub watcher_name: Option<String>,
    #[serde(rename = "oldIP")]
    pub old_ip: Option<String>,
    #[serde(rename = "newIP")]
    pub new_ip: Option<String>,
    pub updated_by: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl NotificationPayload {
    pub fn new() -> Self {
        Self {
            timestamp: Utc::now(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Sent,
    /// No settings row, event toggled off, or webhook disabled/missing
    Skipped,
    Failed,
}

/// Only http(s) URLs on Discord's webhook hosts are accepted
pub fn validate_webhook_url(url: &str) -> Result<(), ValidationError> {
    let parsed = Url::parse(url.trim())
        .map_err(|e| ValidationError::invalid("discordWebhookUrl", e.to_string()))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ValidationError::invalid(
            "discordWebhookUrl",
            "must use http or https",
        ));
    }

    let host = parsed.host_str().unwrap_or_default().to_ascii_lowercase();
    let allowed = WEBHOOK_HOSTS
        .iter()
        .any(|allowed| host == *allowed || host.ends_with(&format!(".{}", allowed)));
    if !allowed {
        return Err(ValidationError::invalid(
            "discordWebhookUrl",
            "must be a Discord webhook URL",
        ));
    }

    Ok(())
}

fn or_na(value: &Option<String>) -> String {
    value.clone().unwrap_or_else(|| "N/A".to_string())
}

fn field(name: &str, value: String, inline: bool) -> Value {
    json!({ "name": name, "value": value, "inline": inline })
}

/// Discord embed for an event
pub fn format_discord_message(event: NotificationEvent, payload: &NotificationPayload) -> Value {
    let time = payload.timestamp.to_rfc3339();
    let record_type_or_a = payload
        .record_type
        .clone()
        .unwrap_or_else(|| "A".to_string());

    let (title, color, fields) = match event {
        NotificationEvent::DnsRecordAdd => (
            "DNS Record Added",
            COLOR_BLUE,
            vec![
                field("Domain", or_na(&payload.domain), true),
                field("Type", or_na(&payload.record_type), true),
                field("Content", or_na(&payload.content), false),
            ],
        ),
        NotificationEvent::DnsRecordDelete => (
            "DNS Record Deleted",
            COLOR_RED,
            vec![
                field("Domain", or_na(&payload.domain), true),
                field("Type", or_na(&payload.record_type), true),
                field("Content", or_na(&payload.content), false),
            ],
        ),
        NotificationEvent::DnsRecordEdit => (
            "DNS Record Edited",
            COLOR_AMBER,
            vec![
                field("Domain", or_na(&payload.domain), true),
                field("Type", or_na(&payload.record_type), true),
                field("Old Content", or_na(&payload.old_content), false),
                field("New Content", or_na(&payload.new_content), false),
            ],
        ),
        NotificationEvent::WatcherAdd => (
            "Watcher Added",
            COLOR_PURPLE,
            vec![
                field("Watcher", or_na(&payload.watcher_name), true),
                field("Record Type", or_na(&payload.record_type), true),
                field("Domain", or_na(&payload.domain), false),
            ],
        ),
        NotificationEvent::WatcherEdit => (
            "Watcher Edited",
            COLOR_PURPLE,
            vec![
                field("Watcher", or_na(&payload.watcher_name), true),
                field("Domain", or_na(&payload.domain), false),
            ],
        ),
        NotificationEvent::WatcherDelete => (
            "Watcher Deleted",
            COLOR_RED,
            vec![
                field("Watcher", or_na(&payload.watcher_name), true),
                field("Domain", or_na(&payload.domain), false),
            ],
        ),
        NotificationEvent::WatcherIpUpdateManual => (
            "IP Updated (Manual)",
            COLOR_EMERALD,
            vec![
                field("Domain", or_na(&payload.domain), true),
                field("Type", record_type_or_a, true),
                field("Old IP", or_na(&payload.old_ip), true),
                field("New IP", or_na(&payload.new_ip), true),
                field(
                    "Updated by",
                    payload
                        .updated_by
                        .clone()
                        .unwrap_or_else(|| "User".to_string()),
                    false,
                ),
            ],
        ),
        NotificationEvent::WatcherIpUpdateAuto => (
            "IP Updated (Auto)",
            COLOR_AMBER,
            vec![
                field("Domain", or_na(&payload.domain), true),
                field("Type", record_type_or_a, true),
                field("Old IP", or_na(&payload.old_ip), true),
                field("New IP", or_na(&payload.new_ip), true),
                field("Updated by", "Watcher (Auto)".to_string(), false),
            ],
        ),
        NotificationEvent::WatcherMismatch => (
            "IP Mismatch Detected",
            COLOR_RED,
            vec![
                field("Domain", or_na(&payload.domain), true),
                field("Type", record_type_or_a, true),
                field("Record IP", or_na(&payload.old_ip), true),
                field("Server IP", or_na(&payload.new_ip), true),
            ],
        ),
    };

    let mut fields = fields;
    fields.push(field("Time", time.clone(), false));

    json!({
        "embeds": [{
            "title": title,
            "color": color,
            "fields": fields,
            "timestamp": time,
        }]
    })
}

/// Sends chat notifications for state changes, gated by the settings matrix.
/// Delivery problems are logged and never returned to the caller.
#[derive(Clone)]
pub struct NotificationService {
    db: Arc<Database>,
    client: Client,
    request_timeout: Duration,
}

impl NotificationService {
    pub fn new(db: Arc<Database>, request_timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(request_timeout).build()?;
        Ok(Self {
            db,
            client,
            request_timeout,
        })
    }

    pub async fn dispatch(
        &self,
        event: NotificationEvent,
        payload: NotificationPayload,
    ) -> DispatchOutcome {
        let settings = match self.db.get_notification_settings().await {
            Ok(Some(settings)) => settings,
            Ok(None) => {
                debug!("No notification settings stored, skipping {}", event.as_str());
                return DispatchOutcome::Skipped;
            }
            Err(e) => {
                warn!("Could not load notification settings for {}: {}", event.as_str(), e);
                return DispatchOutcome::Failed;
            }
        };

        if !event.is_enabled(&settings) {
            debug!("Notifications for {} are disabled", event.as_str());
            return DispatchOutcome::Skipped;
        }

        let url = match (
            settings.discord_webhook_enabled,
            settings.discord_webhook_url.as_deref(),
        ) {
            (true, Some(url)) if !url.is_empty() => url.to_string(),
            _ => {
                debug!("No webhook enabled, skipping {}", event.as_str());
                return DispatchOutcome::Skipped;
            }
        };

        let message = format_discord_message(event, &payload);
        self.send_webhook(&url, event, &message).await
    }

    async fn send_webhook(
        &self,
        url: &str,
        event: NotificationEvent,
        message: &Value,
    ) -> DispatchOutcome {
        match timeout(
            self.request_timeout,
            self.client.post(url).json(message).send(),
        )
        .await
        {
            Ok(Ok(response)) => {
                if response.status().is_success() {
                    info!("Notification sent for {}", event.as_str());
                    DispatchOutcome::Sent
                } else {
                    warn!(
                        "Notification webhook returned status {} for {}",
                        response.status(),
                        event.as_str()
                    );
                    DispatchOutcome::Failed
                }
            }
            Ok(Err(e)) => {
                // reqwest errors may echo the URL, which embeds the webhook token
                warn!(
                    "Failed to send notification for {}: {}",
                    event.as_str(),
                    e.without_url()
                );
                DispatchOutcome::Failed
            }
            Err(_) => {
                warn!("Notification webhook timeout for {}", event.as_str());
                DispatchOutcome::Failed
            }
        }
    }
}
