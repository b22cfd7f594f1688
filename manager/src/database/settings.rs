//! Singleton settings rows.
//!
//! Both tables hold at most one row (id = 1). Reads fall back to defaults
//! when the row is missing; writes replace the whole row.

use anyhow::Result;
use chrono::Utc;
use sqlx::Row;

use super::records::{NotificationSettings, WatcherSettings};
use super::Database;

impl Database {
    /// Stored watcher settings, or `None` when never written
    pub async fn get_watcher_settings(&self) -> Result<Option<WatcherSettings>> {
        let row = sqlx::query(
            r#"
            SELECT enabled, check_interval_minutes, auto_update_enabled,
                   notify_on_mismatch, updated_at
            FROM watcher_settings
            WHERE id = 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let interval: i64 = row.try_get("check_interval_minutes")?;
        Ok(Some(WatcherSettings {
            enabled: row.try_get("enabled")?,
            check_interval_minutes: u32::try_from(interval)?,
            auto_update_enabled: row.try_get("auto_update_enabled")?,
            notify_on_mismatch: row.try_get("notify_on_mismatch")?,
            updated_at: row.try_get("updated_at")?,
        }))
    }

    pub async fn get_watcher_settings_or_default(&self) -> Result<WatcherSettings> {
        Ok(self.get_watcher_settings().await?.unwrap_or_default())
    }

    pub async fn save_watcher_settings(&self, settings: &WatcherSettings) -> Result<WatcherSettings> {
        let mut saved = settings.clone();
        saved.updated_at = Some(Utc::now());

        sqlx::query(
            r#"
            INSERT OR REPLACE INTO watcher_settings (
                id, enabled, check_interval_minutes, auto_update_enabled,
                notify_on_mismatch, updated_at
            ) VALUES (1, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(saved.enabled)
        .bind(i64::from(saved.check_interval_minutes))
        .bind(saved.auto_update_enabled)
        .bind(saved.notify_on_mismatch)
        .bind(saved.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(saved)
    }

    /// Stored notification settings, or `None` when never written
    pub async fn get_notification_settings(&self) -> Result<Option<NotificationSettings>> {
        let row = sqlx::query(
            r#"
            SELECT dns_record_add, dns_record_edit, dns_record_delete,
                   watcher_add, watcher_edit, watcher_delete,
                   watcher_ip_update_manual, watcher_ip_update_auto, watcher_mismatch,
                   discord_webhook_enabled, discord_webhook_url, updated_at
            FROM notification_settings
            WHERE id = 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        Ok(Some(NotificationSettings {
            dns_record_add: row.try_get("dns_record_add")?,
            dns_record_edit: row.try_get("dns_record_edit")?,
            dns_record_delete: row.try_get("dns_record_delete")?,
            watcher_add: row.try_get("watcher_add")?,
            watcher_edit: row.try_get("watcher_edit")?,
            watcher_delete: row.try_get("watcher_delete")?,
            watcher_ip_update_manual: row.try_get("watcher_ip_update_manual")?,
            watcher_ip_update_auto: row.try_get("watcher_ip_update_auto")?,
            watcher_mismatch: row.try_get("watcher_mismatch")?,
            discord_webhook_enabled: row.try_get("discord_webhook_enabled")?,
            discord_webhook_url: row.try_get("discord_webhook_url")?,
            updated_at: row.try_get("updated_at")?,
        }))
    }

    pub async fn save_notification_settings(
        &self,
        settings: &NotificationSettings,
    ) -> Result<NotificationSettings> {
        let mut saved = settings.clone();
        saved.updated_at = Some(Utc::now());

        sqlx::query(
            r#"
            INSERT OR REPLACE INTO notification_settings (
                id, dns_record_add, dns_record_edit, dns_record_delete,
                watcher_add, watcher_edit, watcher_delete,
                watcher_ip_update_manual, watcher_ip_update_auto, watcher_mismatch,
                discord_webhook_enabled, discord_webhook_url, updated_at
            ) VALUES (1, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(saved.dns_record_add)
        .bind(saved.dns_record_edit)
        .bind(saved.dns_record_delete)
        .bind(saved.watcher_add)
        .bind(saved.watcher_edit)
        .bind(saved.watcher_delete)
        .bind(saved.watcher_ip_update_manual)
        .bind(saved.watcher_ip_update_auto)
        .bind(saved.watcher_mismatch)
        .bind(saved.discord_webhook_enabled)
        .bind(&saved.discord_webhook_url)
        .bind(saved.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(saved)
    }
}
