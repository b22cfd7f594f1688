//! Admin endpoints: watcher settings, scheduler control, notification
//! settings, response cache and the audit log.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{error, info};

use super::common::{failure, internal, ApiResponse, ApiResult};
use super::watchers::record_manual_check;
use crate::cache::{CacheTtl, CacheTtlUpdate};
use crate::database::{
    AuditPage, AuditQuery, AuditSeverity, NewAuditEntry, NotificationSettings,
    NotificationSettingsUpdate, WatcherSettings, WatcherSettingsUpdate,
};
use crate::errors::{ManagerError, ValidationError};
use crate::services::audit::actions;
use crate::services::notification::validate_webhook_url;
use crate::watcher::{interval_to_cron, SchedulerStatus};
use crate::web::middleware::{AdminUser, ClientInfo};
use crate::web::AppState;

// ============================================================================
// Watcher settings
// ============================================================================

pub async fn get_watcher_settings(
    _admin: AdminUser,
    State(state): State<AppState>,
) -> ApiResult<WatcherSettings> {
    let settings = state
        .database
        .get_watcher_settings_or_default()
        .await
        .map_err(|e| internal("Failed to load watcher settings", e))?;
    Ok(Json(ApiResponse::success(settings)))
}

pub async fn update_watcher_settings(
    AdminUser(user): AdminUser,
    client: ClientInfo,
    State(state): State<AppState>,
    Json(update): Json<WatcherSettingsUpdate>,
) -> ApiResult<WatcherSettings> {
    if let Some(interval) = update.check_interval_minutes {
        interval_to_cron(interval).map_err(ManagerError::from)?;
    }

    let before = state
        .database
        .get_watcher_settings_or_default()
        .await
        .map_err(|e| internal("Failed to load watcher settings", e))?;
    let saved = state
        .database
        .save_watcher_settings(&update.apply(before.clone()))
        .await
        .map_err(|e| internal("Failed to save watcher settings", e))?;

    if saved.check_interval_minutes != before.check_interval_minutes {
        info!(
            "Check interval changed from {} to {} minutes",
            before.check_interval_minutes, saved.check_interval_minutes
        );
        state
            .scheduler
            .apply_interval(saved.check_interval_minutes)
            .await
            .map_err(|e| internal("Failed to restart watcher scheduler", e))?;
    }

    state
        .audit
        .record(
            NewAuditEntry::new(actions::WATCHER_SETTINGS_UPDATED, AuditSeverity::Info)
                .user(&user.id)
                .resource("watcher_settings", None)
                .details(json!({ "before": before, "after": saved }))
                .client(client.ip, client.user_agent),
        )
        .await;

    Ok(Json(ApiResponse::success(saved)))
}

// ============================================================================
// Scheduler
// ============================================================================

#[derive(Deserialize)]
pub struct SchedulerActionRequest {
    pub action: String,
}

pub async fn get_scheduler_status(
    _admin: AdminUser,
    State(state): State<AppState>,
) -> ApiResult<SchedulerStatus> {
    Ok(Json(ApiResponse::success(state.scheduler.status().await)))
}

pub async fn scheduler_action(
    AdminUser(user): AdminUser,
    client: ClientInfo,
    State(state): State<AppState>,
    Json(request): Json<SchedulerActionRequest>,
) -> ApiResult<Value> {
    match request.action.as_str() {
        "check" => {
            info!("Watcher check triggered from admin by {}", user.id);
            let outcome = state.engine.run_check().await;
            record_manual_check(&state, &user, client, &outcome).await;
            Ok(Json(ApiResponse::success(json!({
                "action": "check",
                "result": outcome,
            }))))
        }
        "restart" => {
            let restarted = state.scheduler.restart().await;
            let status = state.scheduler.status().await;

            let mut entry =
                NewAuditEntry::new(actions::WATCHER_SETTINGS_UPDATED, AuditSeverity::Info)
                    .user(&user.id)
                    .resource("watcher_scheduler", None)
                    .details(json!({ "action": "restart", "status": status }))
                    .client(client.ip, client.user_agent);
            if let Err(e) = &restarted {
                entry.severity = AuditSeverity::Error;
                entry = entry.failed(format!("{:#}", e));
            }
            state.audit.record(entry).await;

            restarted.map_err(|e| internal("Failed to restart watcher scheduler", e))?;
            info!("Watcher scheduler restarted by {}", user.id);
            Ok(Json(ApiResponse::success(json!({
                "action": "restart",
                "status": status,
            }))))
        }
        other => Err(failure(
            StatusCode::BAD_REQUEST,
            format!("Unknown action '{}', expected check or restart", other),
        )),
    }
}

// ============================================================================
// Notification settings
// ============================================================================

pub async fn get_notification_settings(
    _admin: AdminUser,
    State(state): State<AppState>,
) -> ApiResult<NotificationSettings> {
    let existing = state
        .database
        .get_notification_settings()
        .await
        .map_err(|e| internal("Failed to load notification settings", e))?;

    let settings = match existing {
        Some(settings) => settings,
        None => state
            .database
            .save_notification_settings(&NotificationSettings::default())
            .await
            .map_err(|e| internal("Failed to create notification settings", e))?,
    };
    Ok(Json(ApiResponse::success(settings)))
}

pub async fn update_notification_settings(
    AdminUser(user): AdminUser,
    client: ClientInfo,
    State(state): State<AppState>,
    Json(update): Json<NotificationSettingsUpdate>,
) -> ApiResult<NotificationSettings> {
    let current = state
        .database
        .get_notification_settings()
        .await
        .map_err(|e| internal("Failed to load notification settings", e))?
        .unwrap_or_default();
    let next = update.apply(current);

    if next.discord_webhook_enabled {
        let url = next
            .discord_webhook_url
            .as_deref()
            .ok_or_else(|| ManagerError::from(ValidationError::missing("discordWebhookUrl")))?;
        validate_webhook_url(url).map_err(ManagerError::from)?;
    }

    let saved = state
        .database
        .save_notification_settings(&next)
        .await
        .map_err(|e| internal("Failed to save notification settings", e))?;

    state
        .audit
        .record(
            NewAuditEntry::new(actions::NOTIFICATIONS_SETTINGS_UPDATED, AuditSeverity::Info)
                .user(&user.id)
                .resource("notification_settings", None)
                .details(json!({
                    "webhookEnabled": saved.discord_webhook_enabled,
                    "webhookConfigured": saved.discord_webhook_url.is_some(),
                }))
                .client(client.ip, client.user_agent),
        )
        .await;

    Ok(Json(ApiResponse::success(saved)))
}

// ============================================================================
// Response cache
// ============================================================================

pub async fn get_cache_status(
    _admin: AdminUser,
    State(state): State<AppState>,
) -> ApiResult<Value> {
    let cache = state.cache();
    Ok(Json(ApiResponse::success(json!({
        "stats": cache.stats().await,
        "ttl": cache.ttl().await,
    }))))
}

pub async fn update_cache_ttl(
    AdminUser(user): AdminUser,
    client: ClientInfo,
    State(state): State<AppState>,
    Json(update): Json<CacheTtlUpdate>,
) -> ApiResult<CacheTtl> {
    let ttl = state.cache().update_ttl(&update).await;
    info!("Cache TTLs updated by {}: {:?}", user.id, ttl);

    state
        .audit
        .record(
            NewAuditEntry::new(actions::CACHE_CONFIG_UPDATED, AuditSeverity::Info)
                .user(&user.id)
                .resource("cache", None)
                .details(json!({ "ttl": ttl }))
                .client(client.ip, client.user_agent),
        )
        .await;

    Ok(Json(ApiResponse::success(ttl)))
}

pub async fn clear_cache(
    AdminUser(user): AdminUser,
    client: ClientInfo,
    State(state): State<AppState>,
) -> ApiResult<Value> {
    let removed = state.cache().clear().await;
    info!("Response cache cleared by {} ({} entries)", user.id, removed);

    state
        .audit
        .record(
            NewAuditEntry::new(actions::CACHE_CLEARED, AuditSeverity::Info)
                .user(&user.id)
                .resource("cache", None)
                .details(json!({ "removed": removed }))
                .client(client.ip, client.user_agent),
        )
        .await;

    Ok(Json(ApiResponse::success(json!({ "cleared": removed }))))
}

// ============================================================================
// Audit log
// ============================================================================

pub async fn get_audit_logs(
    _admin: AdminUser,
    Query(query): Query<AuditQuery>,
    State(state): State<AppState>,
) -> ApiResult<AuditPage> {
    match state.audit.query(&query).await {
        Ok(page) => Ok(Json(ApiResponse::success(page))),
        Err(e) => {
            error!("Failed to query audit logs: {}", e);
            Err(failure(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to query audit logs: {}", e),
            ))
        }
    }
}
