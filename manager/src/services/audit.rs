//! Audit trail for security and state relevant actions.
//!
//! Appends are fire-and-forget: a failed write is logged and swallowed so an
//! audit outage never blocks the audited operation.

use anyhow::Result;
use chrono::{Duration, Utc};
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::database::{AuditPage, AuditQuery, Database, NewAuditEntry};

/// Namespaced audit action names
pub mod actions {
    pub const DNS_RECORD_CREATED: &str = "dns.record.created";
    pub const DNS_RECORD_UPDATED: &str = "dns.record.updated";
    pub const DNS_RECORD_DELETED: &str = "dns.record.deleted";
    pub const DNS_ZONE_ADDED: &str = "dns.zone.added";
    pub const DNS_ZONE_REMOVED: &str = "dns.zone.removed";

    pub const WATCHER_CREATED: &str = "watcher.created";
    pub const WATCHER_UPDATED: &str = "watcher.updated";
    pub const WATCHER_DELETED: &str = "watcher.deleted";
    pub const WATCHER_TOGGLED: &str = "watcher.toggled";
    pub const WATCHER_IP_UPDATED: &str = "watcher.ip.updated";
    pub const WATCHER_CHECK_TRIGGERED: &str = "watcher.check.triggered";
    pub const WATCHER_SETTINGS_UPDATED: &str = "watcher.settings.updated";

    pub const NOTIFICATIONS_SETTINGS_UPDATED: &str = "notifications.settings.updated";

    pub const CACHE_CONFIG_UPDATED: &str = "cache.config.updated";
    pub const CACHE_CLEARED: &str = "cache.cleared";

    pub const RATE_LIMITED: &str = "system.security.rate_limited";
}

#[derive(Clone)]
pub struct AuditRecorder {
    db: Arc<Database>,
}

impl AuditRecorder {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub async fn record(&self, entry: NewAuditEntry) {
        match self.db.insert_audit_log(&entry).await {
            Ok(id) => debug!("Audit entry {} recorded: {}", id, entry.action),
            Err(e) => error!("Failed to record audit entry {}: {}", entry.action, e),
        }
    }

    pub async fn query(&self, query: &AuditQuery) -> Result<AuditPage> {
        self.db.query_audit_logs(query).await
    }

    /// Delete entries older than `retention_days`
    pub async fn prune(&self, retention_days: i64) -> Result<u64> {
        let cutoff = Utc::now() - Duration::days(retention_days);
        let removed = self.db.delete_audit_logs_before(cutoff).await?;
        if removed > 0 {
            info!(
                "Pruned {} audit entries older than {} days",
                removed, retention_days
            );
        }
        Ok(removed)
    }
}
