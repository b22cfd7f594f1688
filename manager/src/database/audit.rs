//! Audit log database operations.

use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Row, Sqlite};

use super::records::{AuditLogRecord, AuditPage, AuditQuery, AuditSeverity, NewAuditEntry};
use super::Database;
use crate::errors::DatabaseError;

impl Database {
    pub async fn insert_audit_log(&self, entry: &NewAuditEntry) -> Result<i64> {
        let details = match &entry.details {
            Some(value) => Some(serde_json::to_string(value)?),
            None => None,
        };

        let result = sqlx::query(
            r#"
            INSERT INTO audit_logs (
                timestamp, user_id, action, resource, resource_id, details,
                ip_address, user_agent, severity, success, error
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(Utc::now())
        .bind(&entry.user_id)
        .bind(&entry.action)
        .bind(&entry.resource)
        .bind(&entry.resource_id)
        .bind(details)
        .bind(&entry.ip_address)
        .bind(&entry.user_agent)
        .bind(entry.severity.as_str())
        .bind(entry.success)
        .bind(&entry.error)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Filtered, newest-first page of audit entries plus the unpaginated total
    pub async fn query_audit_logs(&self, query: &AuditQuery) -> Result<AuditPage> {
        let mut count_builder: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT COUNT(*) FROM audit_logs");
        push_audit_filters(&mut count_builder, query);
        let total: i64 = count_builder
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        let mut select_builder: QueryBuilder<Sqlite> = QueryBuilder::new(
            "SELECT id, timestamp, user_id, action, resource, resource_id, details, \
             ip_address, user_agent, severity, success, error FROM audit_logs",
        );
        push_audit_filters(&mut select_builder, query);
        select_builder
            .push(" ORDER BY timestamp DESC, id DESC LIMIT ")
            .push_bind(query.effective_limit())
            .push(" OFFSET ")
            .push_bind(query.effective_offset());

        let rows = select_builder.build().fetch_all(&self.pool).await?;

        let mut entries = Vec::with_capacity(rows.len());
        for row in rows {
            entries.push(Self::row_to_audit_record(&row)?);
        }

        Ok(AuditPage { entries, total })
    }

    fn row_to_audit_record(row: &sqlx::sqlite::SqliteRow) -> Result<AuditLogRecord> {
        let severity: String = row.try_get("severity")?;
        let severity =
            AuditSeverity::parse(&severity).ok_or_else(|| DatabaseError::SerializationError {
                reason: format!("unknown audit severity '{}'", severity),
            })?;

        let details: Option<String> = row.try_get("details")?;
        let details = details.map(|raw| {
            serde_json::from_str(&raw).unwrap_or(serde_json::Value::String(raw))
        });

        Ok(AuditLogRecord {
            id: row.try_get("id")?,
            timestamp: row.try_get("timestamp")?,
            user_id: row.try_get("user_id")?,
            action: row.try_get("action")?,
            resource: row.try_get("resource")?,
            resource_id: row.try_get("resource_id")?,
            details,
            ip_address: row.try_get("ip_address")?,
            user_agent: row.try_get("user_agent")?,
            severity,
            success: row.try_get("success")?,
            error: row.try_get("error")?,
        })
    }

    /// Retention prune, the only path that removes audit entries
    pub async fn delete_audit_logs_before(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query("DELETE FROM audit_logs WHERE timestamp < ?")
            .bind(cutoff)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

fn push_audit_filters(builder: &mut QueryBuilder<'_, Sqlite>, query: &AuditQuery) {
    builder.push(" WHERE 1 = 1");

    if let Some(user_id) = &query.user_id {
        builder.push(" AND user_id = ").push_bind(user_id.clone());
    }
    if let Some(action) = &query.action {
        builder.push(" AND action = ").push_bind(action.clone());
    }
    if let Some(severity) = query.severity {
        builder.push(" AND severity = ").push_bind(severity.as_str());
    }
    if let Some(start) = query.start_date {
        builder.push(" AND timestamp >= ").push_bind(start);
    }
    if let Some(end) = query.end_date {
        builder.push(" AND timestamp <= ").push_bind(end);
    }
    if let Some(keyword) = query
        .keyword
        .as_deref()
        .map(str::trim)
        .filter(|k| !k.is_empty())
    {
        let pattern = format!("%{}%", keyword);
        builder.push(" AND (");
        for (i, column) in ["action", "resource", "resource_id", "ip_address", "user_agent"]
            .iter()
            .enumerate()
        {
            if i > 0 {
                builder.push(" OR ");
            }
            builder.push(*column).push(" LIKE ").push_bind(pattern.clone());
        }
        builder.push(")");
    }
}
