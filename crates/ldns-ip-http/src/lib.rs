// # HTTP IP Source
//
// This crate provides an HTTP-based public IP source for the LiveDNS client.
//
// ## Purpose
//
// A host that resolves to loopback tells us nothing about the address the
// outside world sees. In that case the reconciler asks this source, which
// fetches the caller's address from a plain-text echo service such as
// api.ipify.org.
//
// ## Failure Policy
//
// Every failure (transport, non-2xx status, unparsable body) is reported as
// `Error::ExternalIp`, which ends the run.

use ldns_core::http::HttpTransport;
use ldns_core::traits::IpSource;
use ldns_core::{Error, Result};

use std::net::IpAddr;
use std::time::Duration;

use tracing::debug;

/// Default IP discovery service, returns the address as plain text
pub const DEFAULT_IP_URL: &str = "https://api.ipify.org";

/// Default HTTP timeout for discovery requests
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP-based public IP source
#[derive(Debug, Clone)]
pub struct HttpIpSource {
    /// URL to fetch IP from
    url: String,

    /// Shared HTTP client and retry policy
    transport: HttpTransport,
}

impl HttpIpSource {
    /// Create a source querying [`DEFAULT_IP_URL`]
    pub fn new(transport: HttpTransport) -> Self {
        Self::with_url(DEFAULT_IP_URL, transport)
    }

    /// Create a source querying a custom URL
    ///
    /// # Parameters
    ///
    /// - `url`: Endpoint returning the caller's address as the response body
    /// - `transport`: Shared HTTP transport
    pub fn with_url(url: impl Into<String>, transport: HttpTransport) -> Self {
        Self {
            url: url.into(),
            transport,
        }
    }
}

#[async_trait::async_trait]
impl IpSource for HttpIpSource {
    async fn current(&self) -> Result<IpAddr> {
        debug!("Fetching external IP from {}", self.url);

        let request = self
            .transport
            .client()
            .get(&self.url)
            .timeout(DEFAULT_TIMEOUT);

        let unreachable = |detail: String| {
            Error::external_ip(format!(
                "Unable to fetch external IP address from ipify API: {}",
                detail
            ))
        };

        let response = self
            .transport
            .send(request)
            .await
            .map_err(|e| unreachable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(unreachable(format!("HTTP {}", response.status())));
        }

        let body = response
            .text()
            .await
            .map_err(|e| unreachable(format!("failed to read response: {}", e)))?;

        let ip_text = body.trim();
        let ip: IpAddr = ip_text.parse().map_err(|_| {
            Error::external_ip(format!(
                "Invalid external IP address returned by ipify API: '{}'",
                ip_text
            ))
        })?;

        debug!("External IP is {}", ip);
        Ok(ip)
    }

    fn source_name(&self) -> &str {
        &self.url
    }
}
