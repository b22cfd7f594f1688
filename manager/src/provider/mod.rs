//! DNS provider (Cloudflare API v4) access.

pub mod client;

pub use client::CloudflareClient;

use serde::{Deserialize, Serialize};

/// A DNS record as returned by the provider, tagged with its zone
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DnsRecord {
    pub id: String,
    #[serde(rename = "type")]
    pub record_type: String,
    pub name: String,
    pub content: String,
    #[serde(default = "default_ttl")]
    pub ttl: u32,
    #[serde(default)]
    pub proxied: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default)]
    pub zone_id: String,
    #[serde(default)]
    pub zone_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_on: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_on: Option<String>,
}

fn default_ttl() -> u32 {
    1
}

/// Body for create and update calls
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DnsRecordInput {
    #[serde(rename = "type")]
    pub record_type: String,
    pub name: String,
    pub content: String,
    #[serde(default = "default_ttl")]
    pub ttl: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxied: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl DnsRecordInput {
    /// Same record with a different content, everything else preserved
    pub fn with_content(record: &DnsRecord, content: &str) -> Self {
        Self {
            record_type: record.record_type.clone(),
            name: record.name.clone(),
            content: content.to_string(),
            ttl: record.ttl,
            proxied: Some(record.proxied),
            priority: record.priority,
            comment: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneInfo {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub name_servers: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneFetchError {
    pub zone_id: String,
    pub zone_name: String,
    pub error: String,
}

/// Records gathered across several zones plus the zones that failed
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordSet {
    pub records: Vec<DnsRecord>,
    pub zone_errors: Vec<ZoneFetchError>,
}

impl RecordSet {
    /// The record with exactly this (name, type, zone name) triple
    pub fn find(&self, name: &str, record_type: &str, zone_name: &str) -> Option<&DnsRecord> {
        self.records.iter().find(|r| {
            r.name == name && r.record_type == record_type && r.zone_name == zone_name
        })
    }
}

/// Whether a multi-zone fetch may be answered from the response cache
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchPolicy {
    PreferCache,
    Refresh,
}
