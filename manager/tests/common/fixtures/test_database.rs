//! Test database utilities for in-memory SQLite testing

use anyhow::Result;
use sqlx::SqlitePool;
use std::sync::Arc;

use dns_manager::database::{Database, NotificationSettings, WatcherRecord, ZoneRecord};

/// Test database wrapper for in-memory SQLite
pub struct TestDatabase {
    pub db: Arc<Database>,
}

impl TestDatabase {
    /// Create a new in-memory test database with every table in place
    pub async fn new() -> Result<Self> {
        let db = Database::new_in_memory().await?;
        Ok(Self { db: Arc::new(db) })
    }

    /// Get the database pool
    pub fn pool(&self) -> &SqlitePool {
        self.db.pool()
    }

    pub async fn with_zone(self, zone: &ZoneRecord) -> Result<Self> {
        self.db.insert_zone(zone).await?;
        Ok(self)
    }

    pub async fn with_watcher(self, watcher: &WatcherRecord) -> Result<Self> {
        self.db.insert_watcher(watcher).await?;
        Ok(self)
    }

    /// Store notification settings that deliver every event to `webhook_url`
    pub async fn enable_webhook(&self, webhook_url: &str) -> Result<()> {
        let settings = NotificationSettings {
            discord_webhook_enabled: true,
            discord_webhook_url: Some(webhook_url.to_string()),
            ..NotificationSettings::default()
        };
        self.db.save_notification_settings(&settings).await?;
        Ok(())
    }

    pub async fn count_rows(&self, table: &str) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
            .fetch_one(self.pool())
            .await?;
        Ok(count)
    }
}
