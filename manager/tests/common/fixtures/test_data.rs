//! Common test data: zones, watchers, provider records and API users

use chrono::Utc;
use serde_json::{json, Value};
use std::collections::HashMap;

use dns_manager::config::{ApiUser, UserRole};
use dns_manager::database::{WatchedRecordType, WatcherRecord, WatcherStatus, ZoneRecord};

pub const ZONE_ID: &str = "0123456789abcdef0123456789abcdef";
pub const ZONE_NAME: &str = "example.com";
pub const OTHER_ZONE_ID: &str = "fedcba9876543210fedcba9876543210";
pub const OTHER_ZONE_NAME: &str = "example.org";

pub const SERVER_IPV4: &str = "203.0.113.10";
pub const STALE_IPV4: &str = "198.51.100.20";
pub const SERVER_IPV6: &str = "2001:db8::10";

pub const ADMIN_KEY: &str = "admin-test-key";
pub const USER_KEY: &str = "user-test-key";

pub fn zone(zone_id: &str, zone_name: &str) -> ZoneRecord {
    ZoneRecord {
        zone_id: zone_id.to_string(),
        zone_name: zone_name.to_string(),
        api_token: format!("token-{}", zone_name),
        created_at: Utc::now(),
    }
}

pub fn default_zone() -> ZoneRecord {
    zone(ZONE_ID, ZONE_NAME)
}

pub fn watcher(id: &str, record_name: &str, record_type: WatchedRecordType) -> WatcherRecord {
    WatcherRecord {
        id: id.to_string(),
        record_name: record_name.to_string(),
        record_type,
        zone_name: ZONE_NAME.to_string(),
        enabled: true,
        status: None,
        current_ip: None,
        expected_ip: None,
        last_checked: None,
        created_at: Utc::now(),
    }
}

pub fn watcher_with_status(
    id: &str,
    record_name: &str,
    record_type: WatchedRecordType,
    status: WatcherStatus,
) -> WatcherRecord {
    WatcherRecord {
        status: Some(status),
        ..watcher(id, record_name, record_type)
    }
}

/// A record as the provider returns it
pub fn cf_record(id: &str, name: &str, record_type: &str, content: &str) -> Value {
    json!({
        "id": id,
        "type": record_type,
        "name": name,
        "content": content,
        "ttl": 300,
        "proxied": false,
        "zone_id": ZONE_ID,
        "zone_name": ZONE_NAME,
    })
}

pub fn admin_user() -> ApiUser {
    ApiUser {
        id: "admin".to_string(),
        name: "Admin".to_string(),
        api_key: ADMIN_KEY.to_string(),
        role: UserRole::Admin,
        assigned_zone_ids: vec![],
    }
}

pub fn regular_user(zone_ids: &[&str]) -> ApiUser {
    ApiUser {
        id: "user".to_string(),
        name: "Operator".to_string(),
        api_key: USER_KEY.to_string(),
        role: UserRole::User,
        assigned_zone_ids: zone_ids.iter().map(|id| id.to_string()).collect(),
    }
}

pub fn users(list: Vec<ApiUser>) -> HashMap<String, ApiUser> {
    list.into_iter().map(|u| (u.id.clone(), u)).collect()
}
