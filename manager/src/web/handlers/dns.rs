//! DNS record endpoints, forwarded to the provider per zone.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};

use super::common::{
    internal, not_found, require_zone_access, visible_zones, ApiError, ApiResponse, ApiResult,
};
use crate::config::ApiUser;
use crate::database::{AuditSeverity, NewAuditEntry, ZoneRecord};
use crate::errors::{ManagerError, ProviderError};
use crate::provider::{DnsRecord, DnsRecordInput, FetchPolicy, RecordSet};
use crate::services::audit::actions;
use crate::services::{NotificationEvent, NotificationPayload};
use crate::web::middleware::{AuthUser, ClientInfo};
use crate::web::validation::validate_record_input;
use crate::web::AppState;

#[derive(Deserialize, Default)]
pub struct RecordsQuery {
    /// Bypass the response cache
    #[serde(default)]
    pub refresh: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRecordRequest {
    pub zone_id: String,
    #[serde(flatten)]
    pub record: DnsRecordInput,
}

async fn authorized_zone(
    state: &AppState,
    user: &ApiUser,
    zone_id: &str,
) -> Result<ZoneRecord, ApiError> {
    let zone = state
        .database
        .get_zone_by_id(zone_id)
        .await
        .map_err(|e| internal("Failed to look up zone", e))?
        .ok_or_else(|| not_found("Zone", zone_id))?;
    require_zone_access(user, &zone)?;
    Ok(zone)
}

/// Current provider copy of a record, used to describe the change
async fn existing_record(state: &AppState, zone: &ZoneRecord, record_id: &str) -> Option<DnsRecord> {
    let set = state
        .provider
        .fetch_all_records(std::slice::from_ref(zone), FetchPolicy::PreferCache)
        .await;
    set.records.into_iter().find(|r| r.id == record_id)
}

async fn audit_failure(
    state: &AppState,
    action: &str,
    user: &ApiUser,
    client: &ClientInfo,
    resource_id: Option<String>,
    err: &ProviderError,
) {
    error!("DNS operation {} failed: {}", action, err);
    state
        .audit
        .record(
            NewAuditEntry::new(action, AuditSeverity::Error)
                .user(&user.id)
                .resource("dns_record", resource_id)
                .client(client.ip.clone(), client.user_agent.clone())
                .failed(err.to_string()),
        )
        .await;
}

pub async fn list_records(
    AuthUser(user): AuthUser,
    Query(query): Query<RecordsQuery>,
    State(state): State<AppState>,
) -> ApiResult<RecordSet> {
    let zones = state
        .database
        .get_all_zones()
        .await
        .map_err(|e| internal("Failed to load zones", e))?;
    let zones = visible_zones(&user, zones);

    let policy = if query.refresh {
        FetchPolicy::Refresh
    } else {
        FetchPolicy::PreferCache
    };
    let set = state.provider.fetch_all_records(&zones, policy).await;

    Ok(Json(ApiResponse::success(set)))
}

pub async fn create_record(
    AuthUser(user): AuthUser,
    client: ClientInfo,
    State(state): State<AppState>,
    Json(request): Json<CreateRecordRequest>,
) -> ApiResult<DnsRecord> {
    validate_record_input(&request.record).map_err(ManagerError::from)?;
    let zone = authorized_zone(&state, &user, &request.zone_id).await?;

    let record = match state.provider.create_record(&zone, &request.record).await {
        Ok(record) => record,
        Err(e) => {
            audit_failure(&state, actions::DNS_RECORD_CREATED, &user, &client, None, &e).await;
            return Err(ManagerError::from(e).into());
        }
    };

    info!(
        "{} record {} created in {} by {}",
        record.record_type, record.name, zone.zone_name, user.id
    );

    let mut payload = NotificationPayload::new();
    payload.domain = Some(record.name.clone());
    payload.record_type = Some(record.record_type.clone());
    payload.content = Some(record.content.clone());
    payload.updated_by = Some(user.name.clone());
    state
        .notifier
        .dispatch(NotificationEvent::DnsRecordAdd, payload)
        .await;

    state
        .audit
        .record(
            NewAuditEntry::new(actions::DNS_RECORD_CREATED, AuditSeverity::Info)
                .user(&user.id)
                .resource("dns_record", Some(record.id.clone()))
                .details(json!({
                    "zoneName": zone.zone_name,
                    "name": record.name,
                    "type": record.record_type,
                    "content": record.content,
                    "ttl": record.ttl,
                }))
                .client(client.ip, client.user_agent),
        )
        .await;

    Ok(Json(ApiResponse::success(record)))
}

pub async fn update_record(
    AuthUser(user): AuthUser,
    client: ClientInfo,
    Path((zone_id, record_id)): Path<(String, String)>,
    State(state): State<AppState>,
    Json(input): Json<DnsRecordInput>,
) -> ApiResult<DnsRecord> {
    validate_record_input(&input).map_err(ManagerError::from)?;
    let zone = authorized_zone(&state, &user, &zone_id).await?;
    let previous = existing_record(&state, &zone, &record_id).await;

    let record = match state.provider.update_record(&zone, &record_id, &input).await {
        Ok(record) => record,
        Err(e) => {
            audit_failure(
                &state,
                actions::DNS_RECORD_UPDATED,
                &user,
                &client,
                Some(record_id.clone()),
                &e,
            )
            .await;
            return Err(ManagerError::from(e).into());
        }
    };

    info!(
        "{} record {} updated in {} by {}",
        record.record_type, record.name, zone.zone_name, user.id
    );

    let old_content = previous.as_ref().map(|r| r.content.clone());
    let mut payload = NotificationPayload::new();
    payload.domain = Some(record.name.clone());
    payload.record_type = Some(record.record_type.clone());
    payload.old_content = old_content.clone();
    payload.new_content = Some(record.content.clone());
    payload.updated_by = Some(user.name.clone());
    state
        .notifier
        .dispatch(NotificationEvent::DnsRecordEdit, payload)
        .await;

    state
        .audit
        .record(
            NewAuditEntry::new(actions::DNS_RECORD_UPDATED, AuditSeverity::Info)
                .user(&user.id)
                .resource("dns_record", Some(record.id.clone()))
                .details(json!({
                    "zoneName": zone.zone_name,
                    "name": record.name,
                    "type": record.record_type,
                    "oldContent": old_content,
                    "newContent": record.content,
                }))
                .client(client.ip, client.user_agent),
        )
        .await;

    Ok(Json(ApiResponse::success(record)))
}

pub async fn delete_record(
    AuthUser(user): AuthUser,
    client: ClientInfo,
    Path((zone_id, record_id)): Path<(String, String)>,
    State(state): State<AppState>,
) -> ApiResult<serde_json::Value> {
    let zone = authorized_zone(&state, &user, &zone_id).await?;
    let previous = existing_record(&state, &zone, &record_id).await;

    if let Err(e) = state.provider.delete_record(&zone, &record_id).await {
        audit_failure(
            &state,
            actions::DNS_RECORD_DELETED,
            &user,
            &client,
            Some(record_id.clone()),
            &e,
        )
        .await;
        return Err(ManagerError::from(e).into());
    }

    info!("Record {} deleted from {} by {}", record_id, zone.zone_name, user.id);

    let mut payload = NotificationPayload::new();
    payload.domain = previous.as_ref().map(|r| r.name.clone());
    payload.record_type = previous.as_ref().map(|r| r.record_type.clone());
    payload.content = previous.as_ref().map(|r| r.content.clone());
    payload.updated_by = Some(user.name.clone());
    state
        .notifier
        .dispatch(NotificationEvent::DnsRecordDelete, payload)
        .await;

    state
        .audit
        .record(
            NewAuditEntry::new(actions::DNS_RECORD_DELETED, AuditSeverity::Warning)
                .user(&user.id)
                .resource("dns_record", Some(record_id.clone()))
                .details(json!({
                    "zoneName": zone.zone_name,
                    "record": previous,
                }))
                .client(client.ip, client.user_agent),
        )
        .await;

    Ok(Json(ApiResponse::success(json!({
        "id": record_id,
        "zoneId": zone.zone_id,
        "deleted": true,
    }))))
}
