//! Public IP resolution through an external echo service.

use anyhow::{anyhow, Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, Ipv6Addr};
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicIps {
    pub ipv4: String,
    pub ipv6: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EchoResponse {
    ip: String,
}

#[derive(Clone)]
pub struct PublicIpResolver {
    client: Client,
    ipv4_url: String,
    ipv6_url: String,
}

impl PublicIpResolver {
    pub fn new(ipv4_url: &str, ipv6_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client for PublicIpResolver")?;

        Ok(Self {
            client,
            ipv4_url: ipv4_url.to_string(),
            ipv6_url: ipv6_url.to_string(),
        })
    }

    /// IPv4 is mandatory; IPv6 is `None` when the host has none
    pub async fn resolve(&self) -> Result<PublicIps> {
        let ipv4 = self
            .lookup(&self.ipv4_url)
            .await
            .context("Failed to resolve public IPv4")?;
        if ipv4.parse::<Ipv4Addr>().is_err() {
            return Err(anyhow!("IPv4 lookup returned '{}', not an IPv4 address", ipv4));
        }

        let ipv6 = match self.lookup(&self.ipv6_url).await {
            Ok(ip) if ip.parse::<Ipv6Addr>().is_ok() => Some(ip),
            Ok(ip) => {
                debug!("IPv6 lookup answered with {}, host has no IPv6", ip);
                None
            }
            Err(e) => {
                debug!("IPv6 lookup failed: {}", e);
                None
            }
        };

        Ok(PublicIps { ipv4, ipv6 })
    }

    async fn lookup(&self, url: &str) -> Result<String> {
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(anyhow!("IP lookup returned HTTP {}", response.status()));
        }
        let body: EchoResponse = response.json().await?;
        Ok(body.ip.trim().to_string())
    }
}
