use chrono::Utc;
use futures::future::join_all;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

use crate::database::{
    AuditSeverity, Database, NewAuditEntry, WatchedRecordType, WatcherRecord, WatcherSettings,
    WatcherState, WatcherStatus, ZoneRecord,
};
use crate::errors::{ManagerError, ValidationError};
use crate::provider::{CloudflareClient, DnsRecord, DnsRecordInput, FetchPolicy, RecordSet};
use crate::services::audit::actions;
use crate::services::{
    AuditRecorder, NotificationEvent, NotificationPayload, NotificationService, PublicIpResolver,
    PublicIps,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Ok,
    Mismatch,
    Error,
    Disabled,
}

impl From<WatcherStatus> for CheckStatus {
    fn from(status: WatcherStatus) -> Self {
        match status {
            WatcherStatus::Ok => CheckStatus::Ok,
            WatcherStatus::Mismatch => CheckStatus::Mismatch,
            WatcherStatus::Error => CheckStatus::Error,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WatcherCheckResult {
    pub watcher_id: String,
    pub record_name: String,
    pub record_type: WatchedRecordType,
    pub zone_name: String,
    pub status: CheckStatus,
    #[serde(rename = "currentIP")]
    pub current_ip: Option<String>,
    #[serde(rename = "expectedIP")]
    pub expected_ip: Option<String>,
    pub auto_updated: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckOutcome {
    pub success: bool,
    pub checked_count: usize,
    pub errors: Vec<String>,
    pub results: Vec<WatcherCheckResult>,
}

impl CheckOutcome {
    fn nothing_to_do() -> Self {
        Self {
            success: true,
            ..Default::default()
        }
    }

    fn fatal(error: String) -> Self {
        error!("Watcher check aborted: {}", error);
        Self {
            success: false,
            errors: vec![error],
            ..Default::default()
        }
    }
}

/// Result of a user-requested IP update
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IpSync {
    #[serde(rename = "oldIP")]
    pub old_ip: String,
    #[serde(rename = "newIP")]
    pub new_ip: String,
    pub changed: bool,
}

/// Inputs shared by every watcher within one run
struct RunContext {
    settings: WatcherSettings,
    ips: PublicIps,
    zones: Vec<ZoneRecord>,
    records: RecordSet,
}

pub struct WatcherEngine {
    db: Arc<Database>,
    ip_resolver: PublicIpResolver,
    provider: CloudflareClient,
    notifier: NotificationService,
    audit: AuditRecorder,
}

impl WatcherEngine {
    pub fn new(
        db: Arc<Database>,
        ip_resolver: PublicIpResolver,
        provider: CloudflareClient,
        notifier: NotificationService,
        audit: AuditRecorder,
    ) -> Self {
        Self {
            db,
            ip_resolver,
            provider,
            notifier,
            audit,
        }
    }

    /// One reconciliation pass over every watcher. Never fails; problems are
    /// reported through `errors` and `success`.
    #[instrument(skip(self))]
    pub async fn run_check(&self) -> CheckOutcome {
        let settings = match self.db.get_watcher_settings_or_default().await {
            Ok(settings) => settings,
            Err(e) => return CheckOutcome::fatal(format!("Failed to load watcher settings: {}", e)),
        };
        if !settings.enabled {
            debug!("Watcher subsystem disabled, skipping check");
            return CheckOutcome::nothing_to_do();
        }

        let watchers = match self.db.get_all_watchers().await {
            Ok(watchers) => watchers,
            Err(e) => return CheckOutcome::fatal(format!("Failed to load watchers: {}", e)),
        };
        if watchers.is_empty() {
            debug!("No watchers configured");
            return CheckOutcome::nothing_to_do();
        }

        let ips = match self.ip_resolver.resolve().await {
            Ok(ips) => ips,
            Err(e) => return CheckOutcome::fatal(format!("Failed to fetch public IP: {:#}", e)),
        };

        let zones = match self.db.get_all_zones().await {
            Ok(zones) => zones,
            Err(e) => return CheckOutcome::fatal(format!("Failed to load zones: {}", e)),
        };
        let records = self
            .provider
            .fetch_all_records(&zones, FetchPolicy::Refresh)
            .await;

        let mut errors: Vec<String> = records
            .zone_errors
            .iter()
            .map(|e| format!("Failed to fetch records for zone {}: {}", e.zone_name, e.error))
            .collect();

        let ctx = RunContext {
            settings,
            ips,
            zones,
            records,
        };

        let outcomes = join_all(watchers.iter().map(|w| self.check_watcher(w, &ctx))).await;

        let mut results = Vec::with_capacity(outcomes.len());
        let mut checked_count = 0;
        for (result, watcher_errors) in outcomes {
            if result.status != CheckStatus::Disabled {
                checked_count += 1;
            }
            errors.extend(watcher_errors);
            results.push(result);
        }

        info!(
            "Watcher check finished: {} checked, {} errors",
            checked_count,
            errors.len()
        );

        CheckOutcome {
            success: errors.is_empty(),
            checked_count,
            errors,
            results,
        }
    }

    /// Point a watcher's record at the server's current IP on request.
    /// Returns the previous and new record content; `changed` is false when
    /// the record already matched.
    #[instrument(skip(self, watcher), fields(watcher = %watcher.record_name))]
    pub async fn sync_watcher(&self, watcher: &WatcherRecord) -> Result<IpSync, ManagerError> {
        let ips = self
            .ip_resolver
            .resolve()
            .await
            .map_err(|e| ManagerError::Other(format!("Failed to fetch public IP: {:#}", e)))?;
        let expected_ip = match watcher.record_type {
            WatchedRecordType::A => Some(ips.ipv4),
            WatchedRecordType::AAAA => ips.ipv6,
        }
        .ok_or_else(|| {
            ValidationError::invalid(
                "recordType",
                format!("server {} not available", watcher.record_type.family()),
            )
        })?;

        let zone = self
            .db
            .get_zone_by_name(&watcher.zone_name)
            .await?
            .ok_or_else(|| {
                ValidationError::invalid(
                    "zoneName",
                    format!("zone {} is not registered", watcher.zone_name),
                )
            })?;

        let records = self.provider.list_records(&zone).await?;
        let record = records
            .iter()
            .find(|r| r.name == watcher.record_name && r.record_type == watcher.record_type.as_str())
            .ok_or_else(|| {
                ValidationError::invalid(
                    "recordName",
                    format!(
                        "DNS record not found: {} ({})",
                        watcher.record_name, watcher.record_type
                    ),
                )
            })?;

        let old_ip = record.content.clone();
        let changed = old_ip != expected_ip;
        if changed {
            let input = DnsRecordInput::with_content(record, &expected_ip);
            self.provider.update_record(&zone, &record.id, &input).await?;
        }

        let state = WatcherState {
            status: WatcherStatus::Ok,
            current_ip: Some(expected_ip.clone()),
            expected_ip: Some(expected_ip.clone()),
            last_checked: Utc::now(),
        };
        self.db.update_watcher_state(&watcher.id, &state).await?;

        Ok(IpSync {
            old_ip,
            new_ip: expected_ip,
            changed,
        })
    }

    async fn check_watcher(
        &self,
        watcher: &WatcherRecord,
        ctx: &RunContext,
    ) -> (WatcherCheckResult, Vec<String>) {
        let mut errors = Vec::new();
        let mut result = WatcherCheckResult {
            watcher_id: watcher.id.clone(),
            record_name: watcher.record_name.clone(),
            record_type: watcher.record_type,
            zone_name: watcher.zone_name.clone(),
            status: CheckStatus::Disabled,
            current_ip: watcher.current_ip.clone(),
            expected_ip: watcher.expected_ip.clone(),
            auto_updated: false,
            error: None,
        };

        if !watcher.enabled {
            return (result, errors);
        }

        let previous_status = watcher.status;
        let expected_ip = match watcher.record_type {
            WatchedRecordType::A => Some(ctx.ips.ipv4.clone()),
            WatchedRecordType::AAAA => ctx.ips.ipv6.clone(),
        };

        let Some(record) = ctx.records.find(
            &watcher.record_name,
            watcher.record_type.as_str(),
            &watcher.zone_name,
        ) else {
            let message = format!(
                "DNS record not found: {} ({})",
                watcher.record_name, watcher.record_type
            );
            let state = WatcherState {
                status: WatcherStatus::Error,
                current_ip: None,
                expected_ip,
                last_checked: Utc::now(),
            };
            self.finish_with_error(watcher, previous_status, state, message, &mut result, &mut errors)
                .await;
            return (result, errors);
        };

        let current_ip = record.content.clone();

        let Some(expected_ip) = expected_ip else {
            let message = format!(
                "Server {} not available for {}",
                watcher.record_type.family(),
                watcher.record_name
            );
            let state = WatcherState {
                status: WatcherStatus::Error,
                current_ip: Some(current_ip),
                // Keep the last known expectation for the missing family
                expected_ip: watcher.expected_ip.clone(),
                last_checked: Utc::now(),
            };
            self.finish_with_error(watcher, previous_status, state, message, &mut result, &mut errors)
                .await;
            return (result, errors);
        };

        // Raw string comparison, no address canonicalization
        let is_match = current_ip == expected_ip;

        if !is_match && ctx.settings.auto_update_enabled {
            match self.auto_update(record, &expected_ip, ctx).await {
                Ok(()) => {
                    let state = WatcherState {
                        status: WatcherStatus::Ok,
                        current_ip: Some(expected_ip.clone()),
                        expected_ip: Some(expected_ip.clone()),
                        last_checked: Utc::now(),
                    };
                    self.persist(watcher, &state, &mut errors).await;

                    info!(
                        "Auto-updated {} ({}) from {} to {}",
                        watcher.record_name, watcher.record_type, current_ip, expected_ip
                    );

                    self.notifier
                        .dispatch(
                            NotificationEvent::WatcherIpUpdateAuto,
                            NotificationPayload {
                                domain: Some(watcher.record_name.clone()),
                                record_type: Some(watcher.record_type.to_string()),
                                old_ip: Some(current_ip.clone()),
                                new_ip: Some(expected_ip.clone()),
                                ..NotificationPayload::new()
                            },
                        )
                        .await;

                    self.audit
                        .record(
                            self.check_entry(watcher, AuditSeverity::Info)
                                .details(json!({
                                    "recordName": watcher.record_name,
                                    "recordType": watcher.record_type,
                                    "zoneName": watcher.zone_name,
                                    "previousStatus": previous_status,
                                    "newStatus": WatcherStatus::Ok,
                                    "oldIP": current_ip,
                                    "newIP": expected_ip,
                                    "autoUpdated": true,
                                })),
                        )
                        .await;

                    result.status = CheckStatus::Ok;
                    result.current_ip = state.current_ip;
                    result.expected_ip = state.expected_ip;
                    result.auto_updated = true;
                    return (result, errors);
                }
                Err(e) => {
                    let message = format!("Auto-update failed for {}: {}", watcher.record_name, e);
                    warn!("{}", message);
                    result.error = Some(message.clone());
                    errors.push(message);
                }
            }
        }

        let new_status = if is_match {
            WatcherStatus::Ok
        } else {
            WatcherStatus::Mismatch
        };
        let state = WatcherState {
            status: new_status,
            current_ip: Some(current_ip.clone()),
            expected_ip: Some(expected_ip.clone()),
            last_checked: Utc::now(),
        };
        self.persist(watcher, &state, &mut errors).await;

        if !is_match && ctx.settings.notify_on_mismatch {
            self.notifier
                .dispatch(
                    NotificationEvent::WatcherMismatch,
                    NotificationPayload {
                        domain: Some(watcher.record_name.clone()),
                        record_type: Some(watcher.record_type.to_string()),
                        old_ip: Some(current_ip.clone()),
                        new_ip: Some(expected_ip.clone()),
                        ..NotificationPayload::new()
                    },
                )
                .await;
        }

        if previous_status != Some(new_status) {
            let severity = if is_match {
                AuditSeverity::Info
            } else {
                AuditSeverity::Warning
            };
            self.audit
                .record(self.check_entry(watcher, severity).details(json!({
                    "recordName": watcher.record_name,
                    "recordType": watcher.record_type,
                    "zoneName": watcher.zone_name,
                    "previousStatus": previous_status,
                    "newStatus": new_status,
                    "currentIP": current_ip,
                    "expectedIP": expected_ip,
                })))
                .await;
        }

        result.status = new_status.into();
        result.current_ip = state.current_ip;
        result.expected_ip = state.expected_ip;
        (result, errors)
    }

    /// Shared tail of the not-found and IP-unavailable paths
    async fn finish_with_error(
        &self,
        watcher: &WatcherRecord,
        previous_status: Option<WatcherStatus>,
        state: WatcherState,
        message: String,
        result: &mut WatcherCheckResult,
        errors: &mut Vec<String>,
    ) {
        self.persist(watcher, &state, errors).await;

        if previous_status != Some(WatcherStatus::Error) {
            self.audit
                .record(
                    self.check_entry(watcher, AuditSeverity::Error)
                        .details(json!({
                            "recordName": watcher.record_name,
                            "recordType": watcher.record_type,
                            "zoneName": watcher.zone_name,
                            "previousStatus": previous_status,
                            "newStatus": WatcherStatus::Error,
                            "currentIP": state.current_ip,
                            "expectedIP": state.expected_ip,
                        }))
                        .failed(message.clone()),
                )
                .await;
        }

        result.status = CheckStatus::Error;
        result.current_ip = state.current_ip;
        result.expected_ip = state.expected_ip;
        result.error = Some(message.clone());
        errors.push(message);
    }

    async fn persist(&self, watcher: &WatcherRecord, state: &WatcherState, errors: &mut Vec<String>) {
        match self.db.update_watcher_state(&watcher.id, state).await {
            Ok(true) => {}
            Ok(false) => debug!("Watcher {} was deleted during the check", watcher.id),
            Err(e) => {
                error!("Failed to persist watcher {}: {}", watcher.id, e);
                errors.push(format!(
                    "Failed to save state for {}: {}",
                    watcher.record_name, e
                ));
            }
        }
    }

    async fn auto_update(
        &self,
        record: &DnsRecord,
        expected_ip: &str,
        ctx: &RunContext,
    ) -> Result<(), ManagerError> {
        let zone = ctx
            .zones
            .iter()
            .find(|zone| zone.zone_id == record.zone_id)
            .ok_or_else(|| {
                ManagerError::Other(format!("no credentials for zone {}", record.zone_name))
            })?;

        let input = DnsRecordInput::with_content(record, expected_ip);
        self.provider.update_record(zone, &record.id, &input).await?;
        Ok(())
    }

    fn check_entry(&self, watcher: &WatcherRecord, severity: AuditSeverity) -> NewAuditEntry {
        NewAuditEntry::new(actions::WATCHER_CHECK_TRIGGERED, severity)
            .resource("watcher", Some(watcher.id.clone()))
    }
}
