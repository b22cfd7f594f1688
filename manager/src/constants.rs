//! Central repository for timeouts, defaults and limits
//!
//! Organised by category so every magic number in the manager has a single
//! source of truth.

use std::time::Duration;

/// Outbound HTTP constants
pub mod http {
    use super::Duration;

    /// Default timeout for every outbound request (IP lookup, provider, webhook)
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

    /// Cloudflare API v4 base URL
    pub const PROVIDER_API_BASE: &str = "https://api.cloudflare.com/client/v4";

    /// IPv4-only echo service
    pub const IPV4_LOOKUP_URL: &str = "https://api.ipify.org?format=json";

    /// Dual-stack echo service, answers over IPv6 when the host has it
    pub const IPV6_LOOKUP_URL: &str = "https://api64.ipify.org?format=json";
}

/// Watcher reconciliation defaults
pub mod watcher {
    /// Check interval used when no settings row exists
    pub const DEFAULT_INTERVAL_MINUTES: u32 = 5;

    /// Smallest accepted check interval
    pub const MIN_INTERVAL_MINUTES: u32 = 1;

    /// Largest accepted check interval (24 hours)
    pub const MAX_INTERVAL_MINUTES: u32 = 1440;

    pub const DEFAULT_AUTO_UPDATE: bool = false;

    pub const DEFAULT_NOTIFY_ON_MISMATCH: bool = true;
}

/// Response cache TTLs in milliseconds
pub mod cache {
    /// Zones rarely change
    pub const ZONES_TTL_MS: u64 = 300_000;

    /// Records change more often than zones
    pub const DNS_RECORDS_TTL_MS: u64 = 120_000;

    pub const ZONE_INFO_TTL_MS: u64 = 600_000;
}

/// Rate limits
pub mod limits {
    /// Manual watcher checks per caller per window
    pub const MANUAL_CHECKS_PER_WINDOW: u32 = 10;

    /// Window for manual watcher checks
    pub const MANUAL_CHECK_WINDOW_SECONDS: u64 = 60;

    /// Default page size for audit log queries
    pub const AUDIT_DEFAULT_LIMIT: i64 = 100;

    /// Hard cap for audit log page size
    pub const AUDIT_MAX_LIMIT: i64 = 1000;
}

/// Housekeeping intervals
pub mod cleanup {
    /// Days of audit history kept by the retention prune
    pub const AUDIT_RETENTION_DAYS: i64 = 90;

    /// Interval between audit prunes
    pub const AUDIT_PRUNE_INTERVAL_SECONDS: u64 = 86_400;

    /// Interval between rate limiter sweeps
    pub const RATE_LIMIT_SWEEP_SECONDS: u64 = 300;
}

/// Validation bounds for DNS records
pub mod dns {
    pub const RECORD_TYPES: &[&str] = &["A", "AAAA", "CNAME", "MX", "TXT", "NS", "SRV", "CAA", "PTR"];

    pub const MAX_NAME_LEN: usize = 255;

    pub const MAX_CONTENT_LEN: usize = 2048;

    pub const MAX_ZONE_NAME_LEN: usize = 253;

    /// TTL value meaning "automatic"
    pub const TTL_AUTO: u32 = 1;

    pub const TTL_MIN: u32 = 60;

    pub const TTL_MAX: u32 = 86_400;
}
