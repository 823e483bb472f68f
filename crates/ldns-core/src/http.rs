//! Shared HTTP transport
//!
//! One `reqwest::Client` is built per run and shared by the provider and the
//! IP source so connections are pooled. Every request goes through
//! [`HttpTransport::send`], which applies the configured [`RetryPolicy`]:
//! transient statuses (408, 429, 5xx gateway errors), connection failures and
//! timeouts are retried with exponential backoff. A `Retry-After` header given
//! in seconds replaces the backoff delay, up to [`MAX_RETRY_AFTER`]. Anything
//! else, including the last failed attempt, is handed back to the caller
//! unchanged.

use std::time::Duration;

use reqwest::header::RETRY_AFTER;
use reqwest::{RequestBuilder, Response};
use tracing::{debug, warn};

use crate::config::RetryPolicy;
use crate::error::{Error, Result};

/// User-Agent sent with every request
pub const USER_AGENT: &str = concat!("gandi-ldns/", env!("CARGO_PKG_VERSION"));

/// Longest server-requested delay honoured before a retry
pub const MAX_RETRY_AFTER: Duration = Duration::from_secs(120);

/// Build the shared HTTP client
///
/// # Parameters
///
/// - `timeout`: Default per-request timeout; callers may override it per request
pub fn build_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()
        .map_err(|e| Error::http(format!("Failed to build HTTP client: {}", e)))
}

/// HTTP client plus the retry policy applied to it
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    policy: RetryPolicy,
}

impl HttpTransport {
    /// Create a transport around an existing client
    pub fn new(client: reqwest::Client, policy: RetryPolicy) -> Self {
        Self { client, policy }
    }

    /// The underlying client, for building requests
    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    /// Send a request, retrying transient failures
    ///
    /// Requests whose body cannot be cloned are sent once.
    pub async fn send(&self, request: RequestBuilder) -> reqwest::Result<Response> {
        let mut attempt = 0;

        loop {
            let Some(this_try) = request.try_clone() else {
                return request.send().await;
            };

            let outcome = this_try.send().await;

            let retryable = match &outcome {
                Ok(response) => self.policy.is_retryable(response.status().as_u16()),
                Err(e) => e.is_connect() || e.is_timeout(),
            };

            if !retryable || attempt >= self.policy.max_retries {
                if attempt > 0 {
                    debug!("Giving up after {} retries", attempt);
                }
                return outcome;
            }

            let delay = match &outcome {
                Ok(response) => retry_after(response),
                Err(_) => None,
            }
            .unwrap_or_else(|| self.policy.delay_for(attempt));

            match &outcome {
                Ok(response) => warn!(
                    "{} returned {}; retrying in {:?} ({}/{})",
                    response.url(),
                    response.status(),
                    delay,
                    attempt + 1,
                    self.policy.max_retries
                ),
                Err(e) => warn!(
                    "Request failed: {}; retrying in {:?} ({}/{})",
                    e,
                    delay,
                    attempt + 1,
                    self.policy.max_retries
                ),
            }

            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}

/// Delay requested by the server, if any
fn retry_after(response: &Response) -> Option<Duration> {
    response
        .headers()
        .get(RETRY_AFTER)?
        .to_str()
        .ok()
        .and_then(parse_retry_after)
}

/// Parse a `Retry-After` value given in seconds, capped at [`MAX_RETRY_AFTER`]
///
/// The HTTP-date form is not supported; the policy's backoff applies instead.
fn parse_retry_after(value: &str) -> Option<Duration> {
    let secs: u64 = value.trim().parse().ok()?;
    Some(Duration::from_secs(secs).min(MAX_RETRY_AFTER))
}
