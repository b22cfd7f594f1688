//! Mock Cloudflare API v4
//!
//! Responds with the `{success, result, errors, result_info}` envelope for
//! record listing, zone lookup and record updates.

use serde_json::{json, Value};
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

pub struct MockCloudflareServer {
    pub server: MockServer,
    pub api_base: String,
}

fn envelope(result: Value) -> Value {
    json!({
        "success": true,
        "errors": [],
        "messages": [],
        "result": result,
    })
}

fn error_envelope(code: i64, message: &str) -> Value {
    json!({
        "success": false,
        "errors": [{ "code": code, "message": message }],
        "messages": [],
        "result": null,
    })
}

impl MockCloudflareServer {
    pub async fn start() -> Self {
        let server = MockServer::start().await;
        let api_base = server.uri();
        Self { server, api_base }
    }

    /// One page holding every record of the zone
    pub async fn mock_list_records(&self, zone_id: &str, records: Vec<Value>) {
        let count = records.len();
        let mut body = envelope(Value::Array(records));
        body["result_info"] = json!({
            "page": 1,
            "per_page": 100,
            "count": count,
            "total_count": count,
            "total_pages": 1,
        });

        Mock::given(method("GET"))
            .and(path(format!("/zones/{}/dns_records", zone_id)))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&self.server)
            .await;
    }

    pub async fn mock_list_failure(&self, zone_id: &str, status: u16) {
        Mock::given(method("GET"))
            .and(path(format!("/zones/{}/dns_records", zone_id)))
            .respond_with(
                ResponseTemplate::new(status)
                    .set_body_json(error_envelope(10000, "Authentication error")),
            )
            .mount(&self.server)
            .await;
    }

    pub async fn mock_zone_info(&self, zone_id: &str, zone_name: &str) {
        Mock::given(method("GET"))
            .and(path(format!("/zones/{}", zone_id)))
            .respond_with(ResponseTemplate::new(200).set_body_json(envelope(json!({
                "id": zone_id,
                "name": zone_name,
                "status": "active",
                "name_servers": ["ada.ns.cloudflare.com", "bob.ns.cloudflare.com"],
            }))))
            .mount(&self.server)
            .await;
    }

    pub async fn mock_update_success(&self, zone_id: &str, record: Value) {
        let record_id = record["id"].as_str().unwrap_or_default().to_string();
        Mock::given(method("PATCH"))
            .and(path(format!("/zones/{}/dns_records/{}", zone_id, record_id)))
            .respond_with(ResponseTemplate::new(200).set_body_json(envelope(record)))
            .mount(&self.server)
            .await;
    }

    pub async fn mock_update_failure(&self, zone_id: &str, record_id: &str) {
        Mock::given(method("PATCH"))
            .and(path(format!("/zones/{}/dns_records/{}", zone_id, record_id)))
            .respond_with(
                ResponseTemplate::new(400)
                    .set_body_json(error_envelope(1004, "DNS Validation Error")),
            )
            .mount(&self.server)
            .await;
    }

    pub async fn mock_create_success(&self, zone_id: &str, record: Value) {
        Mock::given(method("POST"))
            .and(path(format!("/zones/{}/dns_records", zone_id)))
            .respond_with(ResponseTemplate::new(200).set_body_json(envelope(record)))
            .mount(&self.server)
            .await;
    }

    pub async fn mock_delete_success(&self, zone_id: &str, record_id: &str) {
        Mock::given(method("DELETE"))
            .and(path(format!("/zones/{}/dns_records/{}", zone_id, record_id)))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(envelope(json!({ "id": record_id }))),
            )
            .mount(&self.server)
            .await;
    }

    /// Number of received requests with this method and path
    pub async fn request_count(&self, http_method: &str, request_path: &str) -> usize {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|req| req.method.as_str() == http_method && req.url.path() == request_path)
            .count()
    }
}
