//! Integration tests for the HTTP API
//!
//! Requests go through the full router with `tower::ServiceExt::oneshot`,
//! so authentication, role checks and handlers are exercised together.

mod common;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use common::fixtures::*;
use serde_json::{json, Value};
use tower::ServiceExt;

use dns_manager::database::{AuditQuery, WatchedRecordType, WatcherStatus};

async fn call(
    env: &TestEnv,
    method: Method,
    uri: &str,
    api_key: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::USER_AGENT, "integration-test");
    if let Some(key) = api_key {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", key));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = env.router().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

#[tokio::test]
async fn test_missing_api_key_is_unauthorized() {
    let env = TestEnv::start().await.unwrap();

    let (status, body) = call(&env, Method::GET, "/api/zones", None, None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Authentication required");
}

#[tokio::test]
async fn test_unknown_api_key_is_unauthorized() {
    let env = TestEnv::start().await.unwrap();

    let (status, body) = call(&env, Method::GET, "/api/watchers", Some("bogus"), None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid API key");
}

#[tokio::test]
async fn test_user_cannot_reach_admin_routes() {
    let env = TestEnv::start().await.unwrap();

    for uri in [
        "/api/admin/watcher-settings",
        "/api/admin/notifications",
        "/api/admin/cache",
        "/api/admin/audit-logs",
    ] {
        let (status, _) = call(&env, Method::GET, uri, Some(USER_KEY), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{}", uri);
    }
}

#[tokio::test]
async fn test_public_ip_needs_no_auth() {
    let env = TestEnv::start().await.unwrap();
    env.ip.mock_ips(SERVER_IPV4, Some(SERVER_IPV6)).await;

    let (status, body) = call(&env, Method::GET, "/api/ip", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["ipv4"], SERVER_IPV4);
    assert_eq!(body["data"]["ipv6"], SERVER_IPV6);
}

#[tokio::test]
async fn test_public_ip_failure_is_bad_gateway() {
    let env = TestEnv::start().await.unwrap();
    env.ip.mock_ipv4_failure().await;

    let (status, body) = call(&env, Method::GET, "/api/ip", None, None).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_zone_list_is_filtered_per_user() {
    let env = TestEnv::start().await.unwrap();
    env.db().insert_zone(&default_zone()).await.unwrap();
    env.db()
        .insert_zone(&zone(OTHER_ZONE_ID, OTHER_ZONE_NAME))
        .await
        .unwrap();

    let (_, admin_view) = call(&env, Method::GET, "/api/zones", Some(ADMIN_KEY), None).await;
    assert_eq!(admin_view["data"].as_array().unwrap().len(), 2);

    let (status, user_view) = call(&env, Method::GET, "/api/zones", Some(USER_KEY), None).await;
    assert_eq!(status, StatusCode::OK);
    let zones = user_view["data"].as_array().unwrap();
    assert_eq!(zones.len(), 1);
    assert_eq!(zones[0]["zoneName"], ZONE_NAME);
    assert!(zones[0].get("apiToken").is_none());
}

#[tokio::test]
async fn test_admin_adds_verified_zone() {
    let env = TestEnv::start().await.unwrap();
    env.cloudflare.mock_zone_info(ZONE_ID, ZONE_NAME).await;

    let (status, body) = call(
        &env,
        Method::POST,
        "/api/zones",
        Some(ADMIN_KEY),
        Some(json!({ "zoneId": ZONE_ID, "zoneName": ZONE_NAME, "apiToken": "secret" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "{}", body);
    assert!(env.db().get_zone_by_id(ZONE_ID).await.unwrap().is_some());
    assert_eq!(env.audit_actions().await.unwrap(), vec!["dns.zone.added"]);

    let (status, _) = call(
        &env,
        Method::POST,
        "/api/zones",
        Some(ADMIN_KEY),
        Some(json!({
            "zoneId": ZONE_ID,
            "zoneName": ZONE_NAME,
            "apiToken": "secret",
            "verify": false,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_zone_id_must_be_hex() {
    let env = TestEnv::start().await.unwrap();

    let (status, _) = call(
        &env,
        Method::POST,
        "/api/zones",
        Some(ADMIN_KEY),
        Some(json!({ "zoneId": "not-a-zone", "zoneName": ZONE_NAME, "apiToken": "secret" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(env.database.count_rows("zones").await.unwrap(), 0);
}

#[tokio::test]
async fn test_record_create_in_unassigned_zone_is_forbidden() {
    let env = TestEnv::start().await.unwrap();
    env.db()
        .insert_zone(&zone(OTHER_ZONE_ID, OTHER_ZONE_NAME))
        .await
        .unwrap();

    let (status, _) = call(
        &env,
        Method::POST,
        "/api/dns/records",
        Some(USER_KEY),
        Some(json!({
            "zoneId": OTHER_ZONE_ID,
            "type": "A",
            "name": "www.example.org",
            "content": SERVER_IPV4,
        })),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(
        env.cloudflare
            .request_count("POST", &format!("/zones/{}/dns_records", OTHER_ZONE_ID))
            .await,
        0
    );
}

#[tokio::test]
async fn test_record_create_notifies_and_audits() {
    let env = TestEnv::start().await.unwrap();
    env.db().insert_zone(&default_zone()).await.unwrap();
    env.enable_notifications().await.unwrap();
    env.cloudflare
        .mock_create_success(ZONE_ID, cf_record("rec-1", "www.example.com", "A", SERVER_IPV4))
        .await;

    let (status, body) = call(
        &env,
        Method::POST,
        "/api/dns/records",
        Some(USER_KEY),
        Some(json!({
            "zoneId": ZONE_ID,
            "type": "A",
            "name": "www.example.com",
            "content": SERVER_IPV4,
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["id"], "rec-1");
    assert_eq!(env.webhook.received_titles().await, vec!["DNS Record Added"]);
    assert_eq!(env.audit_actions().await.unwrap(), vec!["dns.record.created"]);
}

#[tokio::test]
async fn test_record_create_validation_error() {
    let env = TestEnv::start().await.unwrap();
    env.db().insert_zone(&default_zone()).await.unwrap();

    let (status, _) = call(
        &env,
        Method::POST,
        "/api/dns/records",
        Some(USER_KEY),
        Some(json!({
            "zoneId": ZONE_ID,
            "type": "A",
            "name": "www.example.com",
            "content": SERVER_IPV4,
            "ttl": 30,
        })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_watcher_create_rejects_bad_type_and_unknown_zone() {
    let env = TestEnv::start().await.unwrap();
    env.db().insert_zone(&default_zone()).await.unwrap();

    let (status, _) = call(
        &env,
        Method::POST,
        "/api/watchers",
        Some(ADMIN_KEY),
        Some(json!({ "recordName": "home.example.com", "recordType": "MX", "zoneName": ZONE_NAME })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = call(
        &env,
        Method::POST,
        "/api/watchers",
        Some(ADMIN_KEY),
        Some(json!({
            "recordName": "home.example.net",
            "recordType": "A",
            "zoneName": "example.net",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert_eq!(env.database.count_rows("watchers").await.unwrap(), 0);
}

#[tokio::test]
async fn test_watcher_lifecycle() {
    let env = TestEnv::start().await.unwrap();
    env.db().insert_zone(&default_zone()).await.unwrap();

    let (status, created) = call(
        &env,
        Method::POST,
        "/api/watchers",
        Some(USER_KEY),
        Some(json!({
            "recordName": "home.example.com",
            "recordType": "AAAA",
            "zoneName": "Example.COM",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", created);
    assert_eq!(created["data"]["zoneName"], ZONE_NAME);
    assert_eq!(created["data"]["enabled"], true);
    let id = created["data"]["id"].as_str().unwrap().to_string();

    let (status, toggled) = call(
        &env,
        Method::PATCH,
        &format!("/api/watchers/{}", id),
        Some(USER_KEY),
        Some(json!({ "enabled": false })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(toggled["data"]["enabled"], false);

    let (status, _) = call(
        &env,
        Method::PATCH,
        &format!("/api/watchers/{}", id),
        Some(USER_KEY),
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = call(
        &env,
        Method::DELETE,
        &format!("/api/watchers/{}", id),
        Some(USER_KEY),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = call(
        &env,
        Method::DELETE,
        &format!("/api/watchers/{}", id),
        Some(USER_KEY),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    assert_eq!(
        env.audit_actions().await.unwrap(),
        vec!["watcher.created", "watcher.toggled", "watcher.deleted"]
    );
}

#[tokio::test]
async fn test_user_sees_only_watchers_in_assigned_zones() {
    let env = TestEnv::start().await.unwrap();
    env.db().insert_zone(&default_zone()).await.unwrap();
    env.db()
        .insert_zone(&zone(OTHER_ZONE_ID, OTHER_ZONE_NAME))
        .await
        .unwrap();
    env.db()
        .insert_watcher(&watcher("w1", "home.example.com", WatchedRecordType::A))
        .await
        .unwrap();
    let mut other = watcher("w2", "home.example.org", WatchedRecordType::A);
    other.zone_name = OTHER_ZONE_NAME.to_string();
    env.db().insert_watcher(&other).await.unwrap();

    let (_, body) = call(&env, Method::GET, "/api/watchers", Some(USER_KEY), None).await;
    let watchers = body["data"].as_array().unwrap();
    assert_eq!(watchers.len(), 1);
    assert_eq!(watchers[0]["id"], "w1");

    let (status, _) = call(&env, Method::DELETE, "/api/watchers/w2", Some(USER_KEY), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_manual_check_is_rate_limited() {
    let env = TestEnv::start_with_users(vec![admin_user(), regular_user(&[ZONE_ID])], 1)
        .await
        .unwrap();

    let (status, body) = call(&env, Method::POST, "/api/watchers/check", Some(USER_KEY), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["success"], true);

    let (status, body) = call(&env, Method::POST, "/api/watchers/check", Some(USER_KEY), None).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["success"], false);

    // The limit is per caller
    let (status, _) = call(&env, Method::POST, "/api/watchers/check", Some(ADMIN_KEY), None).await;
    assert_eq!(status, StatusCode::OK);

    let actions = env.audit_actions().await.unwrap();
    assert_eq!(
        actions,
        vec![
            "watcher.check.triggered",
            "system.security.rate_limited",
            "watcher.check.triggered",
        ]
    );
}

#[tokio::test]
async fn test_notification_settings_created_on_first_read() {
    let env = TestEnv::start().await.unwrap();
    assert_eq!(env.database.count_rows("notification_settings").await.unwrap(), 0);

    let (status, body) = call(
        &env,
        Method::GET,
        "/api/admin/notifications",
        Some(ADMIN_KEY),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["dnsRecordAdd"], true);
    assert_eq!(body["data"]["discordWebhookEnabled"], false);
    assert_eq!(env.database.count_rows("notification_settings").await.unwrap(), 1);
}

#[tokio::test]
async fn test_notification_settings_reject_foreign_webhook() {
    let env = TestEnv::start().await.unwrap();

    let (status, _) = call(
        &env,
        Method::PUT,
        "/api/admin/notifications",
        Some(ADMIN_KEY),
        Some(json!({
            "discordWebhookEnabled": true,
            "discordWebhookUrl": "https://hooks.example.com/abc",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = call(
        &env,
        Method::PUT,
        "/api/admin/notifications",
        Some(ADMIN_KEY),
        Some(json!({
            "discordWebhookEnabled": true,
            "discordWebhookUrl": "https://discord.com/api/webhooks/1/abc",
            "watcherMismatch": false,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["watcherMismatch"], false);
    assert_eq!(
        env.audit_actions().await.unwrap(),
        vec!["notifications.settings.updated"]
    );
}

#[tokio::test]
async fn test_watcher_settings_reject_unsupported_interval() {
    let env = TestEnv::start().await.unwrap();

    let (status, _) = call(
        &env,
        Method::PATCH,
        "/api/admin/watcher-settings",
        Some(ADMIN_KEY),
        Some(json!({ "checkIntervalMinutes": 61 })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(env.db().get_watcher_settings().await.unwrap().is_none());
}

#[tokio::test]
async fn test_watcher_settings_toggle_without_interval_change() {
    let env = TestEnv::start().await.unwrap();

    let (status, body) = call(
        &env,
        Method::PATCH,
        "/api/admin/watcher-settings",
        Some(ADMIN_KEY),
        Some(json!({ "autoUpdateEnabled": true })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["autoUpdateEnabled"], true);
    assert_eq!(body["data"]["checkIntervalMinutes"], 5);
    let stored = env.db().get_watcher_settings().await.unwrap().unwrap();
    assert!(stored.auto_update_enabled);
}

#[tokio::test]
async fn test_unknown_scheduler_action_is_rejected() {
    let env = TestEnv::start().await.unwrap();

    let (status, _) = call(
        &env,
        Method::POST,
        "/api/admin/watcher-scheduler",
        Some(ADMIN_KEY),
        Some(json!({ "action": "explode" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_audit_log_query_filters_by_action() {
    let env = TestEnv::start().await.unwrap();
    env.db().insert_zone(&default_zone()).await.unwrap();
    for name in ["a.example.com", "b.example.com"] {
        let (status, _) = call(
            &env,
            Method::POST,
            "/api/watchers",
            Some(ADMIN_KEY),
            Some(json!({ "recordName": name, "recordType": "A", "zoneName": ZONE_NAME })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }
    call(&env, Method::DELETE, "/api/admin/cache", Some(ADMIN_KEY), None).await;

    let (status, body) = call(
        &env,
        Method::GET,
        "/api/admin/audit-logs?action=watcher.created&limit=1",
        Some(ADMIN_KEY),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 2);
    let entries = body["data"]["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["userId"], "admin");
    assert_eq!(entries[0]["userAgent"], "integration-test");
    assert_eq!(entries[0]["details"]["recordName"], "b.example.com");
}

#[tokio::test]
async fn test_retargeting_a_watcher_clears_its_state() {
    let env = TestEnv::start().await.unwrap();
    env.db().insert_zone(&default_zone()).await.unwrap();
    env.db()
        .insert_watcher(&watcher("w1", "a.example.com", WatchedRecordType::A))
        .await
        .unwrap();
    env.ip.mock_ips(SERVER_IPV4, None).await;
    env.cloudflare
        .mock_list_records(
            ZONE_ID,
            vec![
                cf_record("r1", "a.example.com", "A", SERVER_IPV4),
                cf_record("r2", "b.example.com", "A", SERVER_IPV4),
            ],
        )
        .await;
    env.engine().run_check().await;

    let (status, body) = call(
        &env,
        Method::PATCH,
        "/api/watchers/w1",
        Some(USER_KEY),
        Some(json!({ "recordName": "b.example.com" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["recordName"], "b.example.com");
    assert!(body["data"]["status"].is_null());
    assert!(body["data"]["currentIP"].is_null());
    assert!(body["data"]["expectedIP"].is_null());
    assert!(body["data"]["lastChecked"].is_null());

    let stored = env.db().get_watcher_by_id("w1").await.unwrap().unwrap();
    assert!(stored.status.is_none());
    assert!(stored.last_checked.is_none());

    // The first check of the new record is a transition again
    env.engine().run_check().await;
    assert_eq!(
        env.audit_actions().await.unwrap(),
        vec![
            "watcher.check.triggered",
            "watcher.updated",
            "watcher.check.triggered",
        ]
    );
}

#[tokio::test]
async fn test_toggling_a_watcher_keeps_its_state() {
    let env = TestEnv::start().await.unwrap();
    env.db().insert_zone(&default_zone()).await.unwrap();
    let mut checked =
        watcher_with_status("w1", "a.example.com", WatchedRecordType::A, WatcherStatus::Ok);
    checked.current_ip = Some(SERVER_IPV4.to_string());
    env.db().insert_watcher(&checked).await.unwrap();

    let (status, body) = call(
        &env,
        Method::PATCH,
        "/api/watchers/w1",
        Some(USER_KEY),
        Some(json!({ "enabled": false })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "ok");
    assert_eq!(body["data"]["currentIP"], SERVER_IPV4);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_scheduler_restart_is_audited() {
    let env = TestEnv::start().await.unwrap();

    let (status, body) = call(
        &env,
        Method::POST,
        "/api/admin/watcher-scheduler",
        Some(ADMIN_KEY),
        Some(json!({ "action": "restart" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"]["running"], true);

    let page = env
        .db()
        .query_audit_logs(&AuditQuery::default())
        .await
        .unwrap();
    assert_eq!(page.total, 1);
    let entry = &page.entries[0];
    assert_eq!(entry.action, "watcher.settings.updated");
    assert_eq!(entry.resource.as_deref(), Some("watcher_scheduler"));
    assert_eq!(entry.user_id.as_deref(), Some("admin"));
    assert_eq!(entry.user_agent.as_deref(), Some("integration-test"));
    assert_eq!(entry.details.as_ref().unwrap()["action"], "restart");
    assert!(entry.success);

    env.scheduler().stop().await.unwrap();
}
