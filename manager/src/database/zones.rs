//! Zone registry database operations.

use anyhow::Result;
use sqlx::Row;

use super::records::ZoneRecord;
use super::Database;

impl Database {
    pub async fn get_all_zones(&self) -> Result<Vec<ZoneRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT zone_id, zone_name, api_token, created_at
            FROM zones
            ORDER BY zone_name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut zones = Vec::new();
        for row in rows {
            zones.push(Self::row_to_zone_record(&row)?);
        }
        Ok(zones)
    }

    pub async fn get_zone_by_id(&self, zone_id: &str) -> Result<Option<ZoneRecord>> {
        let row = sqlx::query(
            r#"
            SELECT zone_id, zone_name, api_token, created_at
            FROM zones
            WHERE zone_id = ?
            "#,
        )
        .bind(zone_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(Self::row_to_zone_record(&row)?)),
            None => Ok(None),
        }
    }

    pub async fn get_zone_by_name(&self, zone_name: &str) -> Result<Option<ZoneRecord>> {
        let row = sqlx::query(
            r#"
            SELECT zone_id, zone_name, api_token, created_at
            FROM zones
            WHERE zone_name = ?
            "#,
        )
        .bind(zone_name)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(Self::row_to_zone_record(&row)?)),
            None => Ok(None),
        }
    }

    fn row_to_zone_record(row: &sqlx::sqlite::SqliteRow) -> Result<ZoneRecord> {
        Ok(ZoneRecord {
            zone_id: row.try_get("zone_id")?,
            zone_name: row.try_get("zone_name")?,
            api_token: row.try_get("api_token")?,
            created_at: row.try_get("created_at")?,
        })
    }

    /// Insert a new zone; returns false when the zone id is already registered
    pub async fn insert_zone(&self, zone: &ZoneRecord) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO zones (zone_id, zone_name, api_token, created_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(&zone.zone_id)
        .bind(&zone.zone_name)
        .bind(&zone.api_token)
        .bind(zone.created_at)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn delete_zone(&self, zone_id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM zones WHERE zone_id = ?")
            .bind(zone_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
