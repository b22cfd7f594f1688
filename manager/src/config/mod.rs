pub mod manager;
pub mod secrets;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

pub use manager::ConfigManager;
pub use secrets::SecretsLoader;

use crate::constants::{cleanup, http, limits};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub host: String,
    pub port: u16,
    #[serde(default = "default_database_path")]
    pub database_path: String,
    #[serde(default = "default_provider_api_base")]
    pub provider_api_base: String,
    #[serde(default = "default_ipv4_lookup_url")]
    pub ipv4_lookup_url: String,
    #[serde(default = "default_ipv6_lookup_url")]
    pub ipv6_lookup_url: String,
    #[serde(default = "default_http_timeout_seconds")]
    pub http_timeout_seconds: u64,
    #[serde(default = "default_audit_retention_days")]
    pub audit_retention_days: i64,
    #[serde(default = "default_manual_check_limit")]
    pub manual_check_limit_per_minute: u32,
    // Populated from secrets.toml
    #[serde(skip)]
    pub users: HashMap<String, ApiUser>,
}

fn default_database_path() -> String {
    "data/dns-manager.db".to_string()
}

fn default_provider_api_base() -> String {
    http::PROVIDER_API_BASE.to_string()
}

fn default_ipv4_lookup_url() -> String {
    http::IPV4_LOOKUP_URL.to_string()
}

fn default_ipv6_lookup_url() -> String {
    http::IPV6_LOOKUP_URL.to_string()
}

fn default_http_timeout_seconds() -> u64 {
    http::REQUEST_TIMEOUT.as_secs()
}

fn default_audit_retention_days() -> i64 {
    cleanup::AUDIT_RETENTION_DAYS
}

fn default_manual_check_limit() -> u32 {
    limits::MANUAL_CHECKS_PER_WINDOW
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8095,
            database_path: default_database_path(),
            provider_api_base: default_provider_api_base(),
            ipv4_lookup_url: default_ipv4_lookup_url(),
            ipv6_lookup_url: default_ipv6_lookup_url(),
            http_timeout_seconds: default_http_timeout_seconds(),
            audit_retention_days: default_audit_retention_days(),
            manual_check_limit_per_minute: default_manual_check_limit(),
            users: HashMap::new(),
        }
    }
}

impl Config {
    pub fn http_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.http_timeout_seconds)
    }

    /// Resolve an API key to its user
    pub fn find_user_by_api_key(&self, api_key: &str) -> Option<&ApiUser> {
        self.users.values().find(|user| user.api_key == api_key)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    #[default]
    User,
}

/// An API caller, keyed by its id in secrets.toml
#[derive(Clone, Serialize, Deserialize)]
pub struct ApiUser {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(skip_serializing)]
    pub api_key: String,
    #[serde(default)]
    pub role: UserRole,
    #[serde(default)]
    pub assigned_zone_ids: Vec<String>,
}

impl ApiUser {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    /// Admins reach every zone, everybody else only their assigned ones
    pub fn can_access_zone(&self, zone_id: &str) -> bool {
        self.is_admin() || self.assigned_zone_ids.iter().any(|id| id == zone_id)
    }
}

impl fmt::Debug for ApiUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiUser")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("api_key", &"[REDACTED]")
            .field("role", &self.role)
            .field("assigned_zone_ids", &self.assigned_zone_ids)
            .finish()
    }
}
