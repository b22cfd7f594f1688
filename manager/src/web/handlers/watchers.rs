//! Watcher CRUD, the manual check trigger and manual IP updates.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashSet;
use tracing::{info, warn};
use uuid::Uuid;

use super::common::{
    failure, internal, not_found, require_zone_access, visible_zones, ApiError, ApiResponse,
    ApiResult,
};
use crate::config::ApiUser;
use crate::database::{
    AuditSeverity, NewAuditEntry, WatchedRecordType, WatcherPatch, WatcherRecord, ZoneRecord,
};
use crate::errors::{ManagerError, ValidationError};
use crate::services::audit::actions;
use crate::services::{NotificationEvent, NotificationPayload};
use crate::watcher::{CheckOutcome, IpSync};
use crate::web::middleware::{AuthUser, ClientInfo};
use crate::web::validation::{validate_record_name, validate_zone_name};
use crate::web::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateWatcherRequest {
    pub record_name: String,
    pub record_type: String,
    pub zone_name: String,
    pub enabled: Option<bool>,
}

fn parse_record_type(value: &str) -> Result<WatchedRecordType, ManagerError> {
    WatchedRecordType::parse(value)
        .ok_or_else(|| ValidationError::invalid("recordType", "must be A or AAAA").into())
}

/// The registered zone a watcher points at, if the caller may use it
async fn watcher_zone(
    state: &AppState,
    user: &ApiUser,
    zone_name: &str,
) -> Result<ZoneRecord, ApiError> {
    let zone = state
        .database
        .get_zone_by_name(zone_name)
        .await
        .map_err(|e| internal("Failed to look up zone", e))?
        .ok_or_else(|| {
            ManagerError::from(ValidationError::invalid(
                "zoneName",
                format!("zone {} is not registered", zone_name),
            ))
        })?;
    require_zone_access(user, &zone)?;
    Ok(zone)
}

async fn load_watcher(
    state: &AppState,
    user: &ApiUser,
    id: &str,
) -> Result<WatcherRecord, ApiError> {
    let watcher = state
        .database
        .get_watcher_by_id(id)
        .await
        .map_err(|e| internal("Failed to load watcher", e))?
        .ok_or_else(|| not_found("Watcher", id))?;
    watcher_zone(state, user, &watcher.zone_name).await?;
    Ok(watcher)
}

fn watcher_payload(watcher: &WatcherRecord, user: &ApiUser) -> NotificationPayload {
    NotificationPayload {
        domain: Some(watcher.record_name.clone()),
        record_type: Some(watcher.record_type.to_string()),
        watcher_name: Some(format!("{} ({})", watcher.record_name, watcher.record_type)),
        updated_by: Some(user.name.clone()),
        ..NotificationPayload::new()
    }
}

pub async fn list_watchers(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> ApiResult<Vec<WatcherRecord>> {
    let watchers = state
        .database
        .get_all_watchers()
        .await
        .map_err(|e| internal("Failed to load watchers", e))?;
    if user.is_admin() {
        return Ok(Json(ApiResponse::success(watchers)));
    }

    let zones = state
        .database
        .get_all_zones()
        .await
        .map_err(|e| internal("Failed to load zones", e))?;
    let allowed: HashSet<String> = visible_zones(&user, zones)
        .into_iter()
        .map(|zone| zone.zone_name)
        .collect();

    let watchers = watchers
        .into_iter()
        .filter(|w| allowed.contains(&w.zone_name))
        .collect();
    Ok(Json(ApiResponse::success(watchers)))
}

pub async fn create_watcher(
    AuthUser(user): AuthUser,
    client: ClientInfo,
    State(state): State<AppState>,
    Json(request): Json<CreateWatcherRequest>,
) -> ApiResult<WatcherRecord> {
    let record_name = request.record_name.trim().to_string();
    let zone_name = request.zone_name.trim().to_ascii_lowercase();
    validate_record_name("recordName", &record_name).map_err(ManagerError::from)?;
    let record_type = parse_record_type(request.record_type.trim())?;
    validate_zone_name("zoneName", &zone_name).map_err(ManagerError::from)?;
    watcher_zone(&state, &user, &zone_name).await?;

    let watcher = WatcherRecord {
        id: Uuid::new_v4().to_string(),
        record_name,
        record_type,
        zone_name,
        enabled: request.enabled.unwrap_or(true),
        status: None,
        current_ip: None,
        expected_ip: None,
        last_checked: None,
        created_at: Utc::now(),
    };
    state
        .database
        .insert_watcher(&watcher)
        .await
        .map_err(|e| internal("Failed to save watcher", e))?;

    info!(
        "Watcher {} created for {} ({}) by {}",
        watcher.id, watcher.record_name, watcher.record_type, user.id
    );

    state
        .notifier
        .dispatch(NotificationEvent::WatcherAdd, watcher_payload(&watcher, &user))
        .await;
    state
        .audit
        .record(
            NewAuditEntry::new(actions::WATCHER_CREATED, AuditSeverity::Info)
                .user(&user.id)
                .resource("watcher", Some(watcher.id.clone()))
                .details(json!({
                    "recordName": watcher.record_name,
                    "recordType": watcher.record_type,
                    "zoneName": watcher.zone_name,
                    "enabled": watcher.enabled,
                }))
                .client(client.ip, client.user_agent),
        )
        .await;

    Ok(Json(ApiResponse::success(watcher)))
}

pub async fn update_watcher(
    AuthUser(user): AuthUser,
    client: ClientInfo,
    Path(id): Path<String>,
    State(state): State<AppState>,
    Json(mut patch): Json<WatcherPatch>,
) -> ApiResult<WatcherRecord> {
    if patch.is_empty() {
        return Err(ManagerError::from(ValidationError::invalid(
            "body",
            "at least one field must be provided",
        ))
        .into());
    }

    let before = load_watcher(&state, &user, &id).await?;

    if let Some(name) = &patch.record_name {
        let name = name.trim().to_string();
        validate_record_name("recordName", &name).map_err(ManagerError::from)?;
        patch.record_name = Some(name);
    }
    if let Some(zone_name) = &patch.zone_name {
        let zone_name = zone_name.trim().to_ascii_lowercase();
        validate_zone_name("zoneName", &zone_name).map_err(ManagerError::from)?;
        watcher_zone(&state, &user, &zone_name).await?;
        patch.zone_name = Some(zone_name);
    }

    let mut after = before.clone();
    let retargeted = patch.apply(&mut after);
    if retargeted {
        info!(
            "Watcher {} now targets {} ({}), state cleared",
            id, after.record_name, after.record_type
        );
    }
    let updated = state
        .database
        .update_watcher_definition(&after)
        .await
        .map_err(|e| internal("Failed to update watcher", e))?;
    if !updated {
        return Err(not_found("Watcher", &id));
    }

    let action = if before.enabled != after.enabled {
        actions::WATCHER_TOGGLED
    } else {
        actions::WATCHER_UPDATED
    };
    info!("Watcher {} updated by {} ({})", id, user.id, action);

    state
        .notifier
        .dispatch(NotificationEvent::WatcherEdit, watcher_payload(&after, &user))
        .await;
    state
        .audit
        .record(
            NewAuditEntry::new(action, AuditSeverity::Info)
                .user(&user.id)
                .resource("watcher", Some(id.clone()))
                .details(json!({ "before": before, "after": after }))
                .client(client.ip, client.user_agent),
        )
        .await;

    Ok(Json(ApiResponse::success(after)))
}

pub async fn delete_watcher(
    AuthUser(user): AuthUser,
    client: ClientInfo,
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> ApiResult<WatcherRecord> {
    let watcher = load_watcher(&state, &user, &id).await?;
    let deleted = state
        .database
        .delete_watcher(&id)
        .await
        .map_err(|e| internal("Failed to delete watcher", e))?;
    if !deleted {
        return Err(not_found("Watcher", &id));
    }

    info!("Watcher {} deleted by {}", id, user.id);

    state
        .notifier
        .dispatch(NotificationEvent::WatcherDelete, watcher_payload(&watcher, &user))
        .await;
    state
        .audit
        .record(
            NewAuditEntry::new(actions::WATCHER_DELETED, AuditSeverity::Warning)
                .user(&user.id)
                .resource("watcher", Some(id.clone()))
                .details(json!({
                    "recordName": watcher.record_name,
                    "recordType": watcher.record_type,
                    "zoneName": watcher.zone_name,
                }))
                .client(client.ip, client.user_agent),
        )
        .await;

    Ok(Json(ApiResponse::success(watcher)))
}

/// One summary audit entry for a user-triggered run
pub(crate) async fn record_manual_check(
    state: &AppState,
    user: &ApiUser,
    client: ClientInfo,
    outcome: &CheckOutcome,
) {
    let severity = if outcome.success {
        AuditSeverity::Info
    } else {
        AuditSeverity::Warning
    };
    let mut entry = NewAuditEntry::new(actions::WATCHER_CHECK_TRIGGERED, severity)
        .user(&user.id)
        .resource("watcher", None)
        .details(json!({
            "manual": true,
            "checkedCount": outcome.checked_count,
            "errorCount": outcome.errors.len(),
        }))
        .client(client.ip, client.user_agent);
    if !outcome.success {
        entry = entry.failed(outcome.errors.join("; "));
    }
    state.audit.record(entry).await;
}

pub async fn trigger_check(
    AuthUser(user): AuthUser,
    client: ClientInfo,
    State(state): State<AppState>,
) -> ApiResult<CheckOutcome> {
    let decision = state
        .check_limiter
        .check(&format!("watcher-check:{}", user.id))
        .await;
    if !decision.allowed {
        warn!("Manual watcher check rate limited for {}", user.id);
        state
            .audit
            .record(
                NewAuditEntry::new(actions::RATE_LIMITED, AuditSeverity::Warning)
                    .user(&user.id)
                    .resource("watcher", None)
                    .details(json!({
                        "endpoint": "/api/watchers/check",
                        "retryAfterSeconds": decision.retry_after_secs,
                    }))
                    .client(client.ip, client.user_agent),
            )
            .await;
        return Err(failure(
            StatusCode::TOO_MANY_REQUESTS,
            format!(
                "Too many manual checks, retry in {} seconds",
                decision.retry_after_secs
            ),
        ));
    }

    info!("Manual watcher check requested by {}", user.id);
    let outcome = state.engine.run_check().await;
    record_manual_check(&state, &user, client, &outcome).await;

    Ok(Json(ApiResponse::success(outcome)))
}

pub async fn sync_watcher_ip(
    AuthUser(user): AuthUser,
    client: ClientInfo,
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> ApiResult<IpSync> {
    let watcher = load_watcher(&state, &user, &id).await?;

    let sync = match state.engine.sync_watcher(&watcher).await {
        Ok(sync) => sync,
        Err(e) => {
            state
                .audit
                .record(
                    NewAuditEntry::new(actions::WATCHER_IP_UPDATED, AuditSeverity::Error)
                        .user(&user.id)
                        .resource("watcher", Some(id.clone()))
                        .client(client.ip, client.user_agent)
                        .failed(e.to_string()),
                )
                .await;
            return Err(e.into());
        }
    };

    if sync.changed {
        info!(
            "{} ({}) manually updated from {} to {} by {}",
            watcher.record_name, watcher.record_type, sync.old_ip, sync.new_ip, user.id
        );
        state
            .notifier
            .dispatch(
                NotificationEvent::WatcherIpUpdateManual,
                NotificationPayload {
                    old_ip: Some(sync.old_ip.clone()),
                    new_ip: Some(sync.new_ip.clone()),
                    ..watcher_payload(&watcher, &user)
                },
            )
            .await;
    }

    let details: Value = json!({
        "recordName": watcher.record_name,
        "recordType": watcher.record_type,
        "zoneName": watcher.zone_name,
        "oldIP": sync.old_ip,
        "newIP": sync.new_ip,
        "changed": sync.changed,
    });
    state
        .audit
        .record(
            NewAuditEntry::new(actions::WATCHER_IP_UPDATED, AuditSeverity::Info)
                .user(&user.id)
                .resource("watcher", Some(id.clone()))
                .details(details)
                .client(client.ip, client.user_agent),
        )
        .await;

    Ok(Json(ApiResponse::success(sync)))
}
