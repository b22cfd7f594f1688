//! Mock public IP echo service
//!
//! Serves `/v4` and `/v6` with the `{"ip": "..."}` body the resolver expects.

use serde_json::json;
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

pub struct MockIpServer {
    pub server: MockServer,
    pub base_url: String,
}

impl MockIpServer {
    pub async fn start() -> Self {
        let server = MockServer::start().await;
        let base_url = server.uri();
        Self { server, base_url }
    }

    pub fn ipv4_url(&self) -> String {
        format!("{}/v4", self.base_url)
    }

    pub fn ipv6_url(&self) -> String {
        format!("{}/v6", self.base_url)
    }

    pub async fn mock_ipv4(&self, ip: &str) {
        Mock::given(method("GET"))
            .and(path("/v4"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ip": ip })))
            .mount(&self.server)
            .await;
    }

    pub async fn mock_ipv6(&self, ip: &str) {
        Mock::given(method("GET"))
            .and(path("/v6"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ip": ip })))
            .mount(&self.server)
            .await;
    }

    /// The dual-stack service answers with the IPv4 address on hosts
    /// without IPv6
    pub async fn mock_ipv6_unavailable(&self, ipv4: &str) {
        self.mock_ipv6(ipv4).await;
    }

    pub async fn mock_ipv4_failure(&self) {
        Mock::given(method("GET"))
            .and(path("/v4"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&self.server)
            .await;
    }

    /// Both families at once
    pub async fn mock_ips(&self, ipv4: &str, ipv6: Option<&str>) {
        self.mock_ipv4(ipv4).await;
        match ipv6 {
            Some(ipv6) => self.mock_ipv6(ipv6).await,
            None => self.mock_ipv6_unavailable(ipv4).await,
        }
    }
}
