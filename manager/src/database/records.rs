//! Database record types (entities).
//!
//! This module contains all the record structs used by the database layer.
//! They serialize in camelCase because they are returned as-is by the API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::{limits, watcher};

// ============================================================================
// Zones
// ============================================================================

#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneRecord {
    pub zone_id: String,
    pub zone_name: String,
    /// Bearer token for the provider API, never serialized
    #[serde(skip_serializing, default)]
    pub api_token: String,
    pub created_at: DateTime<Utc>,
}

impl fmt::Debug for ZoneRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ZoneRecord")
            .field("zone_id", &self.zone_id)
            .field("zone_name", &self.zone_name)
            .field("api_token", &"[REDACTED]")
            .field("created_at", &self.created_at)
            .finish()
    }
}

// ============================================================================
// Watchers
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WatchedRecordType {
    A,
    AAAA,
}

impl WatchedRecordType {
    pub fn as_str(&self) -> &'static str {
        match self {
            WatchedRecordType::A => "A",
            WatchedRecordType::AAAA => "AAAA",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "A" => Some(WatchedRecordType::A),
            "AAAA" => Some(WatchedRecordType::AAAA),
            _ => None,
        }
    }

    /// Address family label used in messages
    pub fn family(&self) -> &'static str {
        match self {
            WatchedRecordType::A => "IPv4",
            WatchedRecordType::AAAA => "IPv6",
        }
    }
}

impl fmt::Display for WatchedRecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WatcherStatus {
    Ok,
    Mismatch,
    Error,
}

impl WatcherStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WatcherStatus::Ok => "ok",
            WatcherStatus::Mismatch => "mismatch",
            WatcherStatus::Error => "error",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "ok" => Some(WatcherStatus::Ok),
            "mismatch" => Some(WatcherStatus::Mismatch),
            "error" => Some(WatcherStatus::Error),
            _ => None,
        }
    }
}

impl fmt::Display for WatcherStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatcherRecord {
    pub id: String,
    pub record_name: String,
    pub record_type: WatchedRecordType,
    pub zone_name: String,
    pub enabled: bool,
    pub status: Option<WatcherStatus>,
    #[serde(rename = "currentIP")]
    pub current_ip: Option<String>,
    #[serde(rename = "expectedIP")]
    pub expected_ip: Option<String>,
    pub last_checked: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// User-editable watcher fields; `None` leaves the stored value untouched
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatcherPatch {
    pub record_name: Option<String>,
    pub record_type: Option<WatchedRecordType>,
    pub zone_name: Option<String>,
    pub enabled: Option<bool>,
}

impl WatcherPatch {
    pub fn is_empty(&self) -> bool {
        self.record_name.is_none()
            && self.record_type.is_none()
            && self.zone_name.is_none()
            && self.enabled.is_none()
    }

    /// Apply the patch. When the watched record changes (name, type or zone)
    /// the reconciled state is cleared, since it described the old record.
    /// Returns whether that happened.
    pub fn apply(&self, watcher: &mut WatcherRecord) -> bool {
        let before = (
            watcher.record_name.clone(),
            watcher.record_type,
            watcher.zone_name.clone(),
        );

        if let Some(name) = &self.record_name {
            watcher.record_name = name.clone();
        }
        if let Some(record_type) = self.record_type {
            watcher.record_type = record_type;
        }
        if let Some(zone_name) = &self.zone_name {
            watcher.zone_name = zone_name.clone();
        }
        if let Some(enabled) = self.enabled {
            watcher.enabled = enabled;
        }

        let retargeted = before
            != (
                watcher.record_name.clone(),
                watcher.record_type,
                watcher.zone_name.clone(),
            );
        if retargeted {
            watcher.status = None;
            watcher.current_ip = None;
            watcher.expected_ip = None;
            watcher.last_checked = None;
        }
        retargeted
    }
}

/// Absolute state written by a reconciliation pass
#[derive(Debug, Clone, PartialEq)]
pub struct WatcherState {
    pub status: WatcherStatus,
    pub current_ip: Option<String>,
    pub expected_ip: Option<String>,
    pub last_checked: DateTime<Utc>,
}

// ============================================================================
// Singleton settings
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatcherSettings {
    pub enabled: bool,
    pub check_interval_minutes: u32,
    pub auto_update_enabled: bool,
    pub notify_on_mismatch: bool,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Default for WatcherSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            check_interval_minutes: watcher::DEFAULT_INTERVAL_MINUTES,
            auto_update_enabled: watcher::DEFAULT_AUTO_UPDATE,
            notify_on_mismatch: watcher::DEFAULT_NOTIFY_ON_MISMATCH,
            updated_at: None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatcherSettingsUpdate {
    pub enabled: Option<bool>,
    pub check_interval_minutes: Option<u32>,
    pub auto_update_enabled: Option<bool>,
    pub notify_on_mismatch: Option<bool>,
}

impl WatcherSettingsUpdate {
    pub fn apply(&self, mut settings: WatcherSettings) -> WatcherSettings {
        if let Some(enabled) = self.enabled {
            settings.enabled = enabled;
        }
        if let Some(interval) = self.check_interval_minutes {
            settings.check_interval_minutes = interval;
        }
        if let Some(auto_update) = self.auto_update_enabled {
            settings.auto_update_enabled = auto_update;
        }
        if let Some(notify) = self.notify_on_mismatch {
            settings.notify_on_mismatch = notify;
        }
        settings
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationSettings {
    pub dns_record_add: bool,
    pub dns_record_edit: bool,
    pub dns_record_delete: bool,
    pub watcher_add: bool,
    pub watcher_edit: bool,
    pub watcher_delete: bool,
    pub watcher_ip_update_manual: bool,
    pub watcher_ip_update_auto: bool,
    pub watcher_mismatch: bool,
    pub discord_webhook_enabled: bool,
    pub discord_webhook_url: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            dns_record_add: true,
            dns_record_edit: true,
            dns_record_delete: true,
            watcher_add: true,
            watcher_edit: true,
            watcher_delete: true,
            watcher_ip_update_manual: true,
            watcher_ip_update_auto: true,
            watcher_mismatch: true,
            discord_webhook_enabled: false,
            discord_webhook_url: None,
            updated_at: None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationSettingsUpdate {
    pub dns_record_add: Option<bool>,
    pub dns_record_edit: Option<bool>,
    pub dns_record_delete: Option<bool>,
    pub watcher_add: Option<bool>,
    pub watcher_edit: Option<bool>,
    pub watcher_delete: Option<bool>,
    pub watcher_ip_update_manual: Option<bool>,
    pub watcher_ip_update_auto: Option<bool>,
    pub watcher_mismatch: Option<bool>,
    pub discord_webhook_enabled: Option<bool>,
    pub discord_webhook_url: Option<String>,
}

impl NotificationSettingsUpdate {
    pub fn apply(&self, mut settings: NotificationSettings) -> NotificationSettings {
        let toggles = [
            (self.dns_record_add, &mut settings.dns_record_add),
            (self.dns_record_edit, &mut settings.dns_record_edit),
            (self.dns_record_delete, &mut settings.dns_record_delete),
            (self.watcher_add, &mut settings.watcher_add),
            (self.watcher_edit, &mut settings.watcher_edit),
            (self.watcher_delete, &mut settings.watcher_delete),
            (
                self.watcher_ip_update_manual,
                &mut settings.watcher_ip_update_manual,
            ),
            (
                self.watcher_ip_update_auto,
                &mut settings.watcher_ip_update_auto,
            ),
            (self.watcher_mismatch, &mut settings.watcher_mismatch),
            (
                self.discord_webhook_enabled,
                &mut settings.discord_webhook_enabled,
            ),
        ];
        for (update, target) in toggles {
            if let Some(value) = update {
                *target = value;
            }
        }
        if let Some(url) = &self.discord_webhook_url {
            let trimmed = url.trim();
            settings.discord_webhook_url = if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            };
        }
        settings
    }
}

// ============================================================================
// Audit log
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

impl AuditSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditSeverity::Info => "info",
            AuditSeverity::Warning => "warning",
            AuditSeverity::Error => "error",
            AuditSeverity::Critical => "critical",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "info" => Some(AuditSeverity::Info),
            "warning" => Some(AuditSeverity::Warning),
            "error" => Some(AuditSeverity::Error),
            "critical" => Some(AuditSeverity::Critical),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogRecord {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    pub user_id: Option<String>,
    pub action: String,
    pub resource: Option<String>,
    pub resource_id: Option<String>,
    pub details: Option<serde_json::Value>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub severity: AuditSeverity,
    pub success: bool,
    pub error: Option<String>,
}

/// An audit entry about to be appended
#[derive(Debug, Clone)]
pub struct NewAuditEntry {
    pub action: String,
    pub severity: AuditSeverity,
    pub user_id: Option<String>,
    pub resource: Option<String>,
    pub resource_id: Option<String>,
    pub details: Option<serde_json::Value>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub success: bool,
    pub error: Option<String>,
}

impl NewAuditEntry {
    pub fn new(action: &str, severity: AuditSeverity) -> Self {
        Self {
            action: action.to_string(),
            severity,
            user_id: None,
            resource: None,
            resource_id: None,
            details: None,
            ip_address: None,
            user_agent: None,
            success: true,
            error: None,
        }
    }

    pub fn user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn resource(mut self, resource: &str, resource_id: Option<String>) -> Self {
        self.resource = Some(resource.to_string());
        self.resource_id = resource_id;
        self
    }

    pub fn details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn client(mut self, ip_address: Option<String>, user_agent: Option<String>) -> Self {
        self.ip_address = ip_address;
        self.user_agent = user_agent;
        self
    }

    pub fn failed(mut self, error: impl Into<String>) -> Self {
        self.success = false;
        self.error = Some(error.into());
        self
    }
}

/// Filters for audit log queries
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditQuery {
    pub user_id: Option<String>,
    pub action: Option<String>,
    pub severity: Option<AuditSeverity>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub keyword: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl AuditQuery {
    pub fn effective_limit(&self) -> i64 {
        self.limit
            .unwrap_or(limits::AUDIT_DEFAULT_LIMIT)
            .clamp(1, limits::AUDIT_MAX_LIMIT)
    }

    pub fn effective_offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditPage {
    pub entries: Vec<AuditLogRecord>,
    pub total: i64,
}
