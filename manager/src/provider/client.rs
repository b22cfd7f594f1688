//! HTTP client for the Cloudflare DNS API.
//!
//! Every response is wrapped in `{success, result, errors[{code, message}]}`.
//! Non-2xx statuses and `success: false` both surface as `ProviderError`.

use futures::future::join_all;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use super::{DnsRecord, DnsRecordInput, FetchPolicy, RecordSet, ZoneFetchError, ZoneInfo};
use crate::cache::{keys, ResponseCache};
use crate::database::ZoneRecord;
use crate::errors::{ProviderError, ProviderErrorDetail};

const RECORDS_PER_PAGE: u32 = 100;
const MAX_ERROR_BODY: usize = 512;

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    success: bool,
    result: Option<T>,
    #[serde(default)]
    errors: Vec<ProviderErrorDetail>,
    #[serde(default)]
    result_info: Option<ResultInfo>,
}

#[derive(Debug, Deserialize)]
struct ResultInfo {
    #[serde(default)]
    page: u32,
    #[serde(default)]
    total_pages: u32,
}

#[derive(Clone)]
pub struct CloudflareClient {
    client: Client,
    api_base: String,
    cache: ResponseCache,
}

impl CloudflareClient {
    pub fn new(api_base: &str, timeout: Duration, cache: ResponseCache) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            cache,
        })
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    async fn send<T: DeserializeOwned>(
        &self,
        operation: &str,
        request: RequestBuilder,
    ) -> Result<(T, Option<ResultInfo>), ProviderError> {
        let response = request
            .header("Content-Type", "application/json")
            .send()
            .await
            .map_err(|e| ProviderError::RequestFailed {
                operation: operation.to_string(),
                reason: if e.is_timeout() {
                    "request timed out".to_string()
                } else {
                    e.to_string()
                },
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::RequestFailed {
                operation: operation.to_string(),
                reason: format!("failed to read response body: {}", e),
            })?;

        if !status.is_success() {
            // Prefer the envelope's error messages over the raw body
            let detail = serde_json::from_str::<Envelope<serde_json::Value>>(&body)
                .ok()
                .filter(|envelope| !envelope.errors.is_empty())
                .map(|envelope| {
                    envelope
                        .errors
                        .iter()
                        .map(|e| format!("[{}] {}", e.code, e.message))
                        .collect::<Vec<_>>()
                        .join("; ")
                })
                .unwrap_or_else(|| body.chars().take(MAX_ERROR_BODY).collect());

            return Err(ProviderError::HttpStatus {
                operation: operation.to_string(),
                status: status.as_u16(),
                body: detail,
            });
        }

        let envelope: Envelope<T> =
            serde_json::from_str(&body).map_err(|e| ProviderError::InvalidResponse {
                operation: operation.to_string(),
                reason: e.to_string(),
            })?;

        if !envelope.success {
            return Err(ProviderError::Api {
                operation: operation.to_string(),
                errors: envelope.errors,
            });
        }

        let result = envelope
            .result
            .ok_or_else(|| ProviderError::InvalidResponse {
                operation: operation.to_string(),
                reason: "response has no result".to_string(),
            })?;

        Ok((result, envelope.result_info))
    }

    fn records_url(&self, zone_id: &str) -> String {
        format!("{}/zones/{}/dns_records", self.api_base, zone_id)
    }

    /// All records of one zone, following pagination
    pub async fn list_records(&self, zone: &ZoneRecord) -> Result<Vec<DnsRecord>, ProviderError> {
        let operation = format!("listing records of zone {}", zone.zone_name);
        let mut records = Vec::new();
        let mut page = 1u32;

        loop {
            let request = self
                .client
                .get(self.records_url(&zone.zone_id))
                .query(&[("page", page), ("per_page", RECORDS_PER_PAGE)])
                .bearer_auth(&zone.api_token);

            let (batch, info): (Vec<DnsRecord>, _) = self.send(&operation, request).await?;
            let batch_len = batch.len();
            records.extend(batch.into_iter().map(|mut record| {
                record.zone_id = zone.zone_id.clone();
                record.zone_name = zone.zone_name.clone();
                record
            }));

            match info {
                Some(info) if info.page < info.total_pages && batch_len > 0 => page += 1,
                _ => break,
            }
        }

        debug!("Fetched {} records for zone {}", records.len(), zone.zone_name);
        Ok(records)
    }

    pub async fn fetch_zone_info(
        &self,
        zone_id: &str,
        api_token: &str,
    ) -> Result<ZoneInfo, ProviderError> {
        let cache_key = keys::zone_info(zone_id);
        if let Some(info) = self.cache.get::<ZoneInfo>(&cache_key).await {
            return Ok(info);
        }

        let request = self
            .client
            .get(format!("{}/zones/{}", self.api_base, zone_id))
            .bearer_auth(api_token);
        let (info, _): (ZoneInfo, _) = self.send("fetching zone info", request).await?;

        self.cache
            .set(&cache_key, &info, self.cache.zone_info_ttl().await)
            .await;
        Ok(info)
    }

    pub async fn create_record(
        &self,
        zone: &ZoneRecord,
        input: &DnsRecordInput,
    ) -> Result<DnsRecord, ProviderError> {
        let request = self
            .client
            .post(self.records_url(&zone.zone_id))
            .bearer_auth(&zone.api_token)
            .json(input);
        let (mut record, _): (DnsRecord, _) = self.send("creating record", request).await?;
        record.zone_id = zone.zone_id.clone();
        record.zone_name = zone.zone_name.clone();

        self.invalidate_zone(&zone.zone_id).await;
        Ok(record)
    }

    pub async fn update_record(
        &self,
        zone: &ZoneRecord,
        record_id: &str,
        input: &DnsRecordInput,
    ) -> Result<DnsRecord, ProviderError> {
        let request = self
            .client
            .patch(format!("{}/{}", self.records_url(&zone.zone_id), record_id))
            .bearer_auth(&zone.api_token)
            .json(input);
        let (mut record, _): (DnsRecord, _) = self.send("updating record", request).await?;
        record.zone_id = zone.zone_id.clone();
        record.zone_name = zone.zone_name.clone();

        self.invalidate_zone(&zone.zone_id).await;
        Ok(record)
    }

    pub async fn delete_record(
        &self,
        zone: &ZoneRecord,
        record_id: &str,
    ) -> Result<(), ProviderError> {
        let request = self
            .client
            .delete(format!("{}/{}", self.records_url(&zone.zone_id), record_id))
            .bearer_auth(&zone.api_token);
        let _: (serde_json::Value, _) = self.send("deleting record", request).await?;

        self.invalidate_zone(&zone.zone_id).await;
        Ok(())
    }

    pub async fn invalidate_zone(&self, zone_id: &str) {
        self.cache.invalidate(&keys::dns_records(zone_id)).await;
    }

    /// Records of every zone; a failing zone is reported, never fatal
    pub async fn fetch_all_records(&self, zones: &[ZoneRecord], policy: FetchPolicy) -> RecordSet {
        let fetches = zones.iter().map(|zone| async move {
            let cache_key = keys::dns_records(&zone.zone_id);
            if policy == FetchPolicy::PreferCache {
                if let Some(records) = self.cache.get::<Vec<DnsRecord>>(&cache_key).await {
                    return (zone, Ok(records));
                }
            }

            let result = self.list_records(zone).await;
            if let Ok(records) = &result {
                self.cache
                    .set(&cache_key, records, self.cache.dns_records_ttl().await)
                    .await;
            }
            (zone, result)
        });

        let mut set = RecordSet::default();
        for (zone, result) in join_all(fetches).await {
            match result {
                Ok(records) => set.records.extend(records),
                Err(e) => {
                    warn!("Failed to fetch records for zone {}: {}", zone.zone_name, e);
                    set.zone_errors.push(ZoneFetchError {
                        zone_id: zone.zone_id.clone(),
                        zone_name: zone.zone_name.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }
        set
    }
}
