//! Database layer for the DNS manager.
//!
//! This module provides SQLite persistence for:
//! - Zones (provider zone id, name and API token)
//! - Watchers and their last reconciled state
//! - Singleton watcher and notification settings
//! - The append-only audit log
//!
//! The module is organized into submodules:
//! - `records` - All record types (entities)
//! - `zones` - Zone registry operations
//! - `watchers` - Watcher CRUD and state writes
//! - `settings` - Singleton settings rows
//! - `audit` - Audit log append, query and prune

mod audit;
mod records;
mod settings;
mod watchers;
mod zones;

pub use records::*;

use anyhow::Result;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Pool, Sqlite, SqlitePool};
use std::path::Path;
use tracing::{error, info};

use crate::errors::DatabaseError;

pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    /// Expose pool for integration test queries
    #[allow(dead_code)]
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    pub async fn new(database_path: &str) -> Result<Self> {
        info!("Database path: {}", database_path);

        if let Some(parent) = Path::new(database_path).parent() {
            if !parent.as_os_str().is_empty() {
                if let Err(e) = tokio::fs::create_dir_all(parent).await {
                    error!("Failed to create parent directory {:?}: {}", parent, e);
                    return Err(e.into());
                }
            }
        }

        let database_url = format!("sqlite:{}?mode=rwc", database_path);
        let pool = match SqlitePool::connect(&database_url).await {
            Ok(pool) => pool,
            Err(e) => {
                error!("Failed to connect to database {}: {}", database_path, e);
                return Err(e.into());
            }
        };

        let database = Self { pool };
        database.initialize_tables().await?;

        info!("Database initialized");
        Ok(database)
    }

    /// Private in-memory database, used by tests
    pub async fn new_in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;

        let database = Self { pool };
        database.initialize_tables().await?;
        Ok(database)
    }

    async fn initialize_tables(&self) -> Result<()> {
        let statements: [(&str, &str); 7] = [
            (
                "zones",
                r#"
                CREATE TABLE IF NOT EXISTS zones (
                    zone_id TEXT PRIMARY KEY,
                    zone_name TEXT NOT NULL,
                    api_token TEXT NOT NULL,
                    created_at DATETIME NOT NULL
                )
                "#,
            ),
            (
                "watchers",
                r#"
                CREATE TABLE IF NOT EXISTS watchers (
                    id TEXT PRIMARY KEY,
                    record_name TEXT NOT NULL,
                    record_type TEXT NOT NULL,
                    zone_name TEXT NOT NULL,
                    enabled BOOLEAN NOT NULL DEFAULT 1,
                    status TEXT,
                    current_ip TEXT,
                    expected_ip TEXT,
                    last_checked DATETIME,
                    created_at DATETIME NOT NULL
                )
                "#,
            ),
            (
                "watcher_settings",
                r#"
                CREATE TABLE IF NOT EXISTS watcher_settings (
                    id INTEGER PRIMARY KEY CHECK (id = 1),
                    enabled BOOLEAN NOT NULL,
                    check_interval_minutes INTEGER NOT NULL,
                    auto_update_enabled BOOLEAN NOT NULL,
                    notify_on_mismatch BOOLEAN NOT NULL,
                    updated_at DATETIME
                )
                "#,
            ),
            (
                "notification_settings",
                r#"
                CREATE TABLE IF NOT EXISTS notification_settings (
                    id INTEGER PRIMARY KEY CHECK (id = 1),
                    dns_record_add BOOLEAN NOT NULL,
                    dns_record_edit BOOLEAN NOT NULL,
                    dns_record_delete BOOLEAN NOT NULL,
                    watcher_add BOOLEAN NOT NULL,
                    watcher_edit BOOLEAN NOT NULL,
                    watcher_delete BOOLEAN NOT NULL,
                    watcher_ip_update_manual BOOLEAN NOT NULL,
                    watcher_ip_update_auto BOOLEAN NOT NULL,
                    watcher_mismatch BOOLEAN NOT NULL,
                    discord_webhook_enabled BOOLEAN NOT NULL,
                    discord_webhook_url TEXT,
                    updated_at DATETIME
                )
                "#,
            ),
            (
                "audit_logs",
                r#"
                CREATE TABLE IF NOT EXISTS audit_logs (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    timestamp DATETIME NOT NULL,
                    user_id TEXT,
                    action TEXT NOT NULL,
                    resource TEXT,
                    resource_id TEXT,
                    details TEXT,
                    ip_address TEXT,
                    user_agent TEXT,
                    severity TEXT NOT NULL,
                    success BOOLEAN NOT NULL,
                    error TEXT
                )
                "#,
            ),
            (
                "idx_audit_timestamp",
                "CREATE INDEX IF NOT EXISTS idx_audit_timestamp ON audit_logs(timestamp DESC)",
            ),
            (
                "idx_audit_action",
                "CREATE INDEX IF NOT EXISTS idx_audit_action ON audit_logs(action, timestamp DESC)",
            ),
        ];

        for (name, sql) in statements {
            if let Err(e) = sqlx::query(sql).execute(&self.pool).await {
                error!("Failed to create {}: {}", name, e);
                return Err(DatabaseError::QueryFailed {
                    query: format!("create {}", name),
                    reason: e.to_string(),
                }
                .into());
            }
        }

        Ok(())
    }
}
