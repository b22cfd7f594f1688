//! Zone registry endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use super::common::{
    failure, internal, not_found, visible_zones, ApiResponse, ApiResult,
};
use crate::cache::keys;
use crate::database::{AuditSeverity, NewAuditEntry, ZoneRecord};
use crate::errors::{ManagerError, ValidationError};
use crate::services::audit::actions;
use crate::web::middleware::{AdminUser, AuthUser, ClientInfo};
use crate::web::validation::{validate_zone_id, validate_zone_name};
use crate::web::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateZoneRequest {
    pub zone_id: String,
    pub zone_name: String,
    pub api_token: String,
    /// Ask the provider whether the token can read the zone before saving
    #[serde(default = "default_verify")]
    pub verify: bool,
}

fn default_verify() -> bool {
    true
}

pub async fn list_zones(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> ApiResult<Vec<ZoneRecord>> {
    let cache = state.cache();
    let zones = match cache.get::<Vec<ZoneRecord>>(keys::ZONES).await {
        Some(zones) => zones,
        None => {
            let zones = state
                .database
                .get_all_zones()
                .await
                .map_err(|e| internal("Failed to load zones", e))?;
            cache.set(keys::ZONES, &zones, cache.zones_ttl().await).await;
            zones
        }
    };

    Ok(Json(ApiResponse::success(visible_zones(&user, zones))))
}

pub async fn create_zone(
    AdminUser(user): AdminUser,
    client: ClientInfo,
    State(state): State<AppState>,
    Json(request): Json<CreateZoneRequest>,
) -> ApiResult<ZoneRecord> {
    let zone_id = request.zone_id.trim().to_string();
    let zone_name = request.zone_name.trim().to_ascii_lowercase();
    validate_zone_id(&zone_id).map_err(ManagerError::from)?;
    validate_zone_name("zoneName", &zone_name).map_err(ManagerError::from)?;
    if request.api_token.trim().is_empty() {
        return Err(ManagerError::from(ValidationError::missing("apiToken")).into());
    }

    let existing = state
        .database
        .get_zone_by_name(&zone_name)
        .await
        .map_err(|e| internal("Failed to look up zone", e))?;
    if existing.is_some() {
        return Err(failure(
            StatusCode::BAD_REQUEST,
            format!("Zone {} is already registered", zone_name),
        ));
    }

    if request.verify {
        let info = state
            .provider
            .fetch_zone_info(&zone_id, request.api_token.trim())
            .await
            .map_err(ManagerError::from)?;
        if !info.name.eq_ignore_ascii_case(&zone_name) {
            return Err(failure(
                StatusCode::BAD_REQUEST,
                format!(
                    "Zone {} belongs to {}, not {}",
                    zone_id, info.name, zone_name
                ),
            ));
        }
    }

    let zone = ZoneRecord {
        zone_id,
        zone_name,
        api_token: request.api_token.trim().to_string(),
        created_at: Utc::now(),
    };
    let inserted = state
        .database
        .insert_zone(&zone)
        .await
        .map_err(|e| internal("Failed to save zone", e))?;
    if !inserted {
        return Err(failure(
            StatusCode::BAD_REQUEST,
            format!("Zone {} is already registered", zone.zone_id),
        ));
    }
    state.cache().invalidate(keys::ZONES).await;

    info!("Zone {} ({}) added by {}", zone.zone_name, zone.zone_id, user.id);
    state
        .audit
        .record(
            NewAuditEntry::new(actions::DNS_ZONE_ADDED, AuditSeverity::Info)
                .user(&user.id)
                .resource("zone", Some(zone.zone_id.clone()))
                .details(json!({ "zoneName": zone.zone_name }))
                .client(client.ip, client.user_agent),
        )
        .await;

    Ok(Json(ApiResponse::success(zone)))
}

pub async fn delete_zone(
    AdminUser(user): AdminUser,
    client: ClientInfo,
    Path(zone_id): Path<String>,
    State(state): State<AppState>,
) -> ApiResult<ZoneRecord> {
    let zone = state
        .database
        .get_zone_by_id(&zone_id)
        .await
        .map_err(|e| internal("Failed to look up zone", e))?
        .ok_or_else(|| not_found("Zone", &zone_id))?;

    let watchers = state
        .database
        .count_watchers_for_zone(&zone.zone_name)
        .await
        .map_err(|e| internal("Failed to count watchers", e))?;
    if watchers > 0 {
        warn!(
            "Zone {} removed while {} watchers still reference it",
            zone.zone_name, watchers
        );
    }

    state
        .database
        .delete_zone(&zone_id)
        .await
        .map_err(|e| internal("Failed to delete zone", e))?;
    state.provider.invalidate_zone(&zone_id).await;
    state.cache().invalidate(&keys::zone_info(&zone_id)).await;
    state.cache().invalidate(keys::ZONES).await;

    info!("Zone {} ({}) removed by {}", zone.zone_name, zone.zone_id, user.id);
    state
        .audit
        .record(
            NewAuditEntry::new(actions::DNS_ZONE_REMOVED, AuditSeverity::Warning)
                .user(&user.id)
                .resource("zone", Some(zone.zone_id.clone()))
                .details(json!({ "zoneName": zone.zone_name, "orphanedWatchers": watchers }))
                .client(client.ip, client.user_agent),
        )
        .await;

    Ok(Json(ApiResponse::success(zone)))
}
