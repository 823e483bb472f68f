// # Gandi LiveDNS Provider
//
// This crate provides the Gandi LiveDNS v5 implementation of `DnsProvider`.
//
// ## Scope
//
// The provider performs exactly the two calls the reconciler needs:
//
// - List the zone: GET `{api}/domains/{domain}/records`
// - Replace one A rrset: PUT `{api}/domains/{domain}/records/{a_name}/A`
//
// Deciding whether an update is needed is owned by the `Reconciler`.
// Retries are applied by the shared `HttpTransport`, not here.
//
// ## Security Requirements
//
// - The API key travels only in the `X-Api-Key` header
// - The API key NEVER appears in logs or error messages
//
// ## API Reference
//
// - LiveDNS v5: https://api.gandi.net/docs/livedns/

use async_trait::async_trait;
use ldns_core::config::HostEntry;
use ldns_core::http::HttpTransport;
use ldns_core::traits::{DnsProvider, ZoneRecord};
use ldns_core::{Error, Result};
use reqwest::header::ACCEPT;
use reqwest::{Response, Url};
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::time::Duration;
use tracing::debug;

/// LiveDNS v5 API base URL
pub const DEFAULT_API_BASE: &str = "https://api.gandi.net/v5/livedns/";

/// Default HTTP timeout for API requests (30 seconds)
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Header carrying the API key
const API_KEY_HEADER: &str = "X-Api-Key";

const PROVIDER_NAME: &str = "gandi";

/// Body of an rrset update
#[derive(Debug, Serialize)]
struct RecordUpdate {
    rrset_ttl: u32,
    rrset_values: Vec<String>,
}

/// Error body returned by the LiveDNS API
///
/// ```json
/// {"code": 401, "message": "The server could not verify that you authorized
///  to access the document you requested.", "object": "HTTPUnauthorized",
///  "cause": "Unauthorized"}
/// ```
#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    cause: Option<String>,
}

/// Gandi LiveDNS provider
///
/// Stateless apart from the shared transport: credentials and the API base
/// come from each `HostEntry`, so one provider serves every configured host.
#[derive(Debug, Clone)]
pub struct GandiProvider {
    /// Shared HTTP client and retry policy
    transport: HttpTransport,
}

impl GandiProvider {
    /// Create a new Gandi provider
    ///
    /// # Parameters
    ///
    /// - `transport`: Shared HTTP transport (client + retry policy)
    pub fn new(transport: HttpTransport) -> Self {
        Self { transport }
    }

    /// `{api}/domains/{domain}/records`
    fn records_url(entry: &HostEntry) -> Result<Url> {
        endpoint(&entry.api, &["domains", &entry.domain, "records"])
    }

    /// `{api}/domains/{domain}/records/{a_name}/A`
    fn a_record_url(entry: &HostEntry) -> Result<Url> {
        endpoint(
            &entry.api,
            &["domains", &entry.domain, "records", &entry.a_name, "A"],
        )
    }
}

/// Append path segments to the API base
///
/// A trailing slash on the base is optional. Segments are percent-encoded
/// as path segments, so labels such as "@" stay literal.
fn endpoint(base: &Url, segments: &[&str]) -> Result<Url> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| Error::config(format!("api '{}' cannot be used as a base URL", base)))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Turn a non-2xx response into an error
///
/// # Parameters
///
/// - `response`: The failed response
/// - `what`: Short description of the request, for the message
async fn status_error(response: Response, what: &str) -> Error {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();

    let detail = serde_json::from_str::<ApiError>(&body)
        .ok()
        .and_then(|e| e.message.or(e.cause))
        .unwrap_or_else(|| body.trim().to_string());

    match status.as_u16() {
        401 | 403 => Error::provider(
            PROVIDER_NAME,
            format!(
                "Authentication failed: invalid API key or insufficient permissions. Status: {}",
                status
            ),
        ),
        404 => Error::not_found(format!("{}: {}", what, detail)),
        _ if detail.is_empty() => {
            Error::provider(PROVIDER_NAME, format!("{} failed: {}", what, status))
        }
        _ => Error::provider(
            PROVIDER_NAME,
            format!("{} failed: {} - {}", what, status, detail),
        ),
    }
}

#[async_trait]
impl DnsProvider for GandiProvider {
    async fn list_records(&self, entry: &HostEntry) -> Result<Vec<ZoneRecord>> {
        let url = Self::records_url(entry)?;
        debug!("[{}] GET {}", entry.name, url);

        let request = self
            .transport
            .client()
            .get(url)
            .header(API_KEY_HEADER, &entry.apikey)
            .header(ACCEPT, "application/json")
            .timeout(DEFAULT_HTTP_TIMEOUT);

        let response = self
            .transport
            .send(request)
            .await
            .map_err(|e| Error::http(format!("Listing records of {} failed: {}", entry.domain, e)))?;

        if !response.status().is_success() {
            return Err(status_error(response, &format!("Listing records of {}", entry.domain)).await);
        }

        let records: Vec<ZoneRecord> = response.json().await.map_err(|e| {
            Error::provider(
                PROVIDER_NAME,
                format!("Failed to parse records of {}: {}", entry.domain, e),
            )
        })?;

        debug!("[{}] {} has {} rrsets", entry.name, entry.domain, records.len());
        Ok(records)
    }

    async fn update_record(&self, entry: &HostEntry, new_ip: IpAddr) -> Result<()> {
        let url = Self::a_record_url(entry)?;
        let body = RecordUpdate {
            rrset_ttl: entry.ttl,
            rrset_values: vec![new_ip.to_string()],
        };
        debug!("[{}] PUT {} {:?}", entry.name, url, body);

        let request = self
            .transport
            .client()
            .put(url)
            .header(API_KEY_HEADER, &entry.apikey)
            .header(ACCEPT, "application/json")
            .json(&body)
            .timeout(DEFAULT_HTTP_TIMEOUT);

        let what = format!("Updating {} A record of {}", entry.a_name, entry.domain);

        let response = self
            .transport
            .send(request)
            .await
            .map_err(|e| Error::http(format!("{} failed: {}", what, e)))?;

        if !response.status().is_success() {
            return Err(status_error(response, &what).await);
        }

        debug!("[{}] provider accepted update ({})", entry.name, response.status());
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER_NAME
    }
}
