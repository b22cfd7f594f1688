//! In-process cache for provider API responses.
//!
//! Entries expire independently; an expired entry is evicted the first time
//! it is read. Mutating DNS operations invalidate the affected zone's keys.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::constants::cache;

/// Cache key builders
pub mod keys {
    pub const ZONES: &str = "zones:all";

    pub fn dns_records(zone_id: &str) -> String {
        format!("dns:records:{}", zone_id)
    }

    pub fn zone_info(zone_id: &str) -> String {
        format!("zone:{}", zone_id)
    }
}

/// TTLs in milliseconds, adjustable at runtime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheTtl {
    pub zones: u64,
    pub dns_records: u64,
    pub zone_info: u64,
}

impl Default for CacheTtl {
    fn default() -> Self {
        Self {
            zones: cache::ZONES_TTL_MS,
            dns_records: cache::DNS_RECORDS_TTL_MS,
            zone_info: cache::ZONE_INFO_TTL_MS,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheTtlUpdate {
    pub zones: Option<u64>,
    pub dns_records: Option<u64>,
    pub zone_info: Option<u64>,
}

#[derive(Debug, Clone)]
struct CacheEntry {
    payload: serde_json::Value,
    stored_at: Instant,
    ttl: Duration,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now.duration_since(self.stored_at) > self.ttl
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntryStats {
    pub key: String,
    pub age_ms: u64,
    pub ttl_ms: u64,
    pub expired: bool,
    pub expires_in_ms: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub size: usize,
    pub keys: Vec<String>,
    pub entries: Vec<CacheEntryStats>,
}

#[derive(Clone, Default)]
pub struct ResponseCache {
    entries: Arc<RwLock<HashMap<String, CacheEntry>>>,
    ttl: Arc<RwLock<CacheTtl>>,
}

impl ResponseCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let now = Instant::now();
        {
            let entries = self.entries.read().await;
            let entry = entries.get(key)?;
            if !entry.is_expired(now) {
                return match serde_json::from_value(entry.payload.clone()) {
                    Ok(value) => Some(value),
                    Err(e) => {
                        warn!("Cached payload for {} has an unexpected shape: {}", key, e);
                        None
                    }
                };
            }
        }

        // Re-check under the write lock, a concurrent set may have refreshed it
        let mut entries = self.entries.write().await;
        if entries.get(key).is_some_and(|entry| entry.is_expired(now)) {
            entries.remove(key);
            debug!("Evicted expired cache entry {}", key);
        }
        None
    }

    pub async fn set<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) {
        let payload = match serde_json::to_value(value) {
            Ok(payload) => payload,
            Err(e) => {
                warn!("Not caching {}: {}", key, e);
                return;
            }
        };

        self.entries.write().await.insert(
            key.to_string(),
            CacheEntry {
                payload,
                stored_at: Instant::now(),
                ttl,
            },
        );
    }

    pub async fn invalidate(&self, key: &str) -> bool {
        self.entries.write().await.remove(key).is_some()
    }

    /// Drop every key starting with `prefix`, returns how many were removed
    pub async fn invalidate_prefix(&self, prefix: &str) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|key, _| !key.starts_with(prefix));
        before - entries.len()
    }

    pub async fn clear(&self) -> usize {
        let mut entries = self.entries.write().await;
        let removed = entries.len();
        entries.clear();
        removed
    }

    pub async fn stats(&self) -> CacheStats {
        let now = Instant::now();
        let entries = self.entries.read().await;

        let mut stats: Vec<CacheEntryStats> = entries
            .iter()
            .map(|(key, entry)| {
                let age = now.duration_since(entry.stored_at);
                CacheEntryStats {
                    key: key.clone(),
                    age_ms: age.as_millis() as u64,
                    ttl_ms: entry.ttl.as_millis() as u64,
                    expired: entry.is_expired(now),
                    expires_in_ms: entry.ttl.saturating_sub(age).as_millis() as u64,
                }
            })
            .collect();
        stats.sort_by(|a, b| a.key.cmp(&b.key));

        CacheStats {
            size: stats.len(),
            keys: stats.iter().map(|s| s.key.clone()).collect(),
            entries: stats,
        }
    }

    pub async fn ttl(&self) -> CacheTtl {
        *self.ttl.read().await
    }

    pub async fn update_ttl(&self, update: &CacheTtlUpdate) -> CacheTtl {
        let mut ttl = self.ttl.write().await;
        if let Some(zones) = update.zones {
            ttl.zones = zones;
        }
        if let Some(dns_records) = update.dns_records {
            ttl.dns_records = dns_records;
        }
        if let Some(zone_info) = update.zone_info {
            ttl.zone_info = zone_info;
        }
        *ttl
    }

    pub async fn dns_records_ttl(&self) -> Duration {
        Duration::from_millis(self.ttl.read().await.dns_records)
    }

    pub async fn zone_info_ttl(&self) -> Duration {
        Duration::from_millis(self.ttl.read().await.zone_info)
    }

    pub async fn zones_ttl(&self) -> Duration {
        Duration::from_millis(self.ttl.read().await.zones)
    }
}
