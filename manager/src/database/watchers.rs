//! Watcher database operations.

use anyhow::Result;
use sqlx::Row;
use tracing::debug;

use super::records::{WatchedRecordType, WatcherRecord, WatcherState, WatcherStatus};
use super::Database;
use crate::errors::DatabaseError;

const WATCHER_COLUMNS: &str = "id, record_name, record_type, zone_name, enabled, status, \
     current_ip, expected_ip, last_checked, created_at";

impl Database {
    pub async fn get_all_watchers(&self) -> Result<Vec<WatcherRecord>> {
        let sql = format!(
            "SELECT {} FROM watchers ORDER BY created_at ASC, id ASC",
            WATCHER_COLUMNS
        );
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;

        let mut watchers = Vec::with_capacity(rows.len());
        for row in rows {
            watchers.push(Self::row_to_watcher_record(&row)?);
        }
        Ok(watchers)
    }

    pub async fn get_watcher_by_id(&self, id: &str) -> Result<Option<WatcherRecord>> {
        let sql = format!("SELECT {} FROM watchers WHERE id = ?", WATCHER_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(Some(Self::row_to_watcher_record(&row)?)),
            None => Ok(None),
        }
    }

    fn row_to_watcher_record(row: &sqlx::sqlite::SqliteRow) -> Result<WatcherRecord> {
        let record_type: String = row.try_get("record_type")?;
        let record_type = WatchedRecordType::parse(&record_type).ok_or_else(|| {
            DatabaseError::SerializationError {
                reason: format!("unknown watcher record type '{}'", record_type),
            }
        })?;

        let status: Option<String> = row.try_get("status")?;
        let status = match status {
            Some(value) => Some(WatcherStatus::parse(&value).ok_or_else(|| {
                DatabaseError::SerializationError {
                    reason: format!("unknown watcher status '{}'", value),
                }
            })?),
            None => None,
        };

        Ok(WatcherRecord {
            id: row.try_get("id")?,
            record_name: row.try_get("record_name")?,
            record_type,
            zone_name: row.try_get("zone_name")?,
            enabled: row.try_get("enabled")?,
            status,
            current_ip: row.try_get("current_ip")?,
            expected_ip: row.try_get("expected_ip")?,
            last_checked: row.try_get("last_checked")?,
            created_at: row.try_get("created_at")?,
        })
    }

    pub async fn insert_watcher(&self, watcher: &WatcherRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO watchers (id, record_name, record_type, zone_name, enabled, status,
                                  current_ip, expected_ip, last_checked, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&watcher.id)
        .bind(&watcher.record_name)
        .bind(watcher.record_type.as_str())
        .bind(&watcher.zone_name)
        .bind(watcher.enabled)
        .bind(watcher.status.map(|s| s.as_str()))
        .bind(&watcher.current_ip)
        .bind(&watcher.expected_ip)
        .bind(watcher.last_checked)
        .bind(watcher.created_at)
        .execute(&self.pool)
        .await?;
        debug!("Inserted watcher {}", watcher.id);
        Ok(())
    }

    /// Persist user-editable fields of an existing watcher together with its
    /// reconciled state, which an edit may have cleared
    pub async fn update_watcher_definition(&self, watcher: &WatcherRecord) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE watchers
            SET record_name = ?, record_type = ?, zone_name = ?, enabled = ?,
                status = ?, current_ip = ?, expected_ip = ?, last_checked = ?
            WHERE id = ?
            "#,
        )
        .bind(&watcher.record_name)
        .bind(watcher.record_type.as_str())
        .bind(&watcher.zone_name)
        .bind(watcher.enabled)
        .bind(watcher.status.map(|s| s.as_str()))
        .bind(&watcher.current_ip)
        .bind(&watcher.expected_ip)
        .bind(watcher.last_checked)
        .bind(&watcher.id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Overwrite the reconciled state of a watcher (last write wins)
    pub async fn update_watcher_state(&self, id: &str, state: &WatcherState) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE watchers
            SET status = ?, current_ip = ?, expected_ip = ?, last_checked = ?
            WHERE id = ?
            "#,
        )
        .bind(state.status.as_str())
        .bind(&state.current_ip)
        .bind(&state.expected_ip)
        .bind(state.last_checked)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn delete_watcher(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM watchers WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn count_watchers_for_zone(&self, zone_name: &str) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM watchers WHERE zone_name = ?")
            .bind(zone_name)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
