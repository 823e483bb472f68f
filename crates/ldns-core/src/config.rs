//! Configuration types for the LiveDNS client
//!
//! Host entries are read from an INI file with one section per host:
//!
//! ```ini
//! [DEFAULT]
//! api = https://api.gandi.net/v5/livedns/
//! apikey = <secret>
//! ttl = 300
//!
//! [home]
//! domain = example.com
//! a_name = @
//! host = home.example.com
//! ```
//!
//! Keys in `[DEFAULT]` act as fallbacks for every other section, and the
//! `[DEFAULT]` section is never a host entry itself.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::time::Duration;

use ini::{Ini, ParseOption};
use reqwest::Url;
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// File name of the configuration, looked up next to the executable
pub const CONFIG_FILE_NAME: &str = "config.txt";

/// Smallest TTL LiveDNS accepts on an rrset
pub const MIN_TTL: u32 = 300;

/// Largest TTL LiveDNS accepts on an rrset (30 days)
pub const MAX_TTL: u32 = 2_592_000;

/// Name of the fallback section (compared case-insensitively)
const DEFAULT_SECTION: &str = "DEFAULT";

const REQUIRED_KEYS: [&str; 6] = ["api", "apikey", "domain", "a_name", "host", "ttl"];

/// One configured host mapping
///
/// # Security
///
/// The Debug implementation does NOT expose the API key.
#[derive(Clone, PartialEq, Eq)]
pub struct HostEntry {
    /// Section name, used to label log output
    pub name: String,

    /// Base URL of the LiveDNS REST API
    pub api: Url,

    /// API key sent as `X-Api-Key`
    /// ⚠️ NEVER log this value
    pub apikey: String,

    /// DNS zone (e.g., "example.com")
    pub domain: String,

    /// Record label to match and update (e.g., "@" or "www")
    pub a_name: String,

    /// Hostname resolved locally to find the current address
    pub host: String,

    /// TTL to set on update, in seconds
    pub ttl: u32,
}

impl fmt::Debug for HostEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostEntry")
            .field("name", &self.name)
            .field("api", &self.api.as_str())
            .field("apikey", &"<REDACTED>")
            .field("domain", &self.domain)
            .field("a_name", &self.a_name)
            .field("host", &self.host)
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl HostEntry {
    /// Create a validated host entry
    ///
    /// # Parameters
    ///
    /// - `name`: Section name
    /// - `api`: Base URL of the provider API (http or https)
    /// - `apikey`: API key
    /// - `domain`: DNS zone
    /// - `a_name`: Record label
    /// - `host`: Hostname to resolve
    /// - `ttl`: Record TTL in seconds
    pub fn new(
        name: impl Into<String>,
        api: &str,
        apikey: impl Into<String>,
        domain: impl Into<String>,
        a_name: impl Into<String>,
        host: impl Into<String>,
        ttl: u32,
    ) -> Result<Self> {
        let name = name.into();

        let api = Url::parse(api.trim()).map_err(|e| {
            Error::config(format!("[{name}] api '{api}' is not a valid URL: {e}"))
        })?;

        let entry = Self {
            name,
            api,
            apikey: apikey.into(),
            domain: domain.into(),
            a_name: a_name.into(),
            host: host.into(),
            ttl,
        };
        entry.validate()?;

        Ok(entry)
    }

    /// Validate the entry
    pub fn validate(&self) -> Result<()> {
        let name = &self.name;

        if !matches!(self.api.scheme(), "http" | "https") {
            return Err(Error::config(format!(
                "[{name}] api must use http or https, got '{}'",
                self.api.scheme()
            )));
        }

        if self.api.cannot_be_a_base() {
            return Err(Error::config(format!("[{name}] api '{}' cannot be a base URL", self.api)));
        }

        for (key, value) in [
            ("apikey", &self.apikey),
            ("domain", &self.domain),
            ("a_name", &self.a_name),
            ("host", &self.host),
        ] {
            if value.trim().is_empty() {
                return Err(Error::config(format!("[{name}] {key} cannot be empty")));
            }
        }

        Ok(())
    }

    /// Check that the TTL is one LiveDNS accepts
    ///
    /// Not part of [`HostEntry::validate`]: a bad TTL fails only its own
    /// entry, and only once an update is needed.
    pub fn check_ttl(&self) -> Result<()> {
        if !(MIN_TTL..=MAX_TTL).contains(&self.ttl) {
            return Err(Error::invalid_input(format!(
                "[{}] ttl must be between {MIN_TTL} and {MAX_TTL} seconds. Got: {}",
                self.name, self.ttl
            )));
        }
        Ok(())
    }

    /// Build an entry from a section's key/value pairs
    fn from_section(name: &str, values: &HashMap<String, String>) -> Result<Self> {
        let get = |key: &str| -> Result<&str> {
            values
                .get(key)
                .map(|v| v.trim())
                .ok_or_else(|| Error::config(format!("[{name}] missing required key '{key}'")))
        };

        let ttl_raw = get("ttl")?;
        let ttl = ttl_raw.parse::<u32>().map_err(|_| {
            Error::config(format!("[{name}] ttl must be an integer. Got: '{ttl_raw}'"))
        })?;

        Self::new(
            name,
            get("api")?,
            get("apikey")?,
            get("domain")?,
            get("a_name")?,
            get("host")?,
            ttl,
        )
    }
}

/// Load every host entry from an INI configuration file
///
/// Entries are returned in file order.
///
/// # Returns
///
/// - `Err(Error::ConfigMissing)`: The file does not exist or has no host sections
/// - `Err(Error::Config)`: A section is incomplete or invalid
pub fn load_config(path: &Path) -> Result<Vec<HostEntry>> {
    if !path.is_file() {
        return Err(Error::ConfigMissing(path.to_path_buf()));
    }

    // Values are taken verbatim: API keys may hold quotes or backslashes.
    let opt = ParseOption {
        enabled_quote: false,
        enabled_escape: false,
        ..ParseOption::default()
    };
    let ini = Ini::load_from_file_opt(path, opt)?;

    let entries = parse_sections(&ini)?;
    if entries.is_empty() {
        return Err(Error::ConfigMissing(path.to_path_buf()));
    }

    debug!("Loaded {} host entries from {}", entries.len(), path.display());
    Ok(entries)
}

fn parse_sections(ini: &Ini) -> Result<Vec<HostEntry>> {
    let mut defaults = HashMap::new();
    let mut sections = Vec::new();

    for (section, props) in ini.iter() {
        // Keys are case-insensitive, as with the usual INI conventions
        let values: HashMap<String, String> = props
            .iter()
            .map(|(k, v)| (k.trim().to_ascii_lowercase(), v.to_string()))
            .collect();

        match section {
            None => {
                if !values.is_empty() {
                    warn!("Ignoring {} key(s) outside of any section", values.len());
                }
            }
            Some(name) if name.trim().eq_ignore_ascii_case(DEFAULT_SECTION) => {
                defaults.extend(values);
            }
            Some(name) => sections.push((name.trim().to_string(), values)),
        }
    }

    let mut entries = Vec::with_capacity(sections.len());
    for (name, values) in sections {
        let mut merged = defaults.clone();
        merged.extend(values);

        let unknown: Vec<&str> = merged
            .keys()
            .map(String::as_str)
            .filter(|k| !REQUIRED_KEYS.contains(k))
            .collect();
        if !unknown.is_empty() {
            warn!("[{}] ignoring unknown key(s): {}", name, unknown.join(", "));
        }

        let entry = HostEntry::from_section(&name, &merged)?;
        if let Err(e) = entry.check_ttl() {
            warn!("{}; this entry cannot be updated", e);
        }
        entries.push(entry);
    }

    Ok(entries)
}

/// Retry policy applied to every outbound HTTP request
///
/// The policy is passed explicitly into [`crate::http::HttpTransport`]; there
/// is no process-wide retry setting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt (0 disables retrying)
    pub max_retries: u32,

    /// Delay before the first retry; doubled for each further retry
    pub backoff_base: Duration,

    /// HTTP status codes that are considered transient
    pub retry_statuses: Vec<u16>,
}

impl RetryPolicy {
    /// A policy that never retries
    pub fn disabled() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Set the number of retries
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the base backoff delay
    pub fn with_backoff_base(mut self, backoff_base: Duration) -> Self {
        self.backoff_base = backoff_base;
        self
    }

    /// Whether a response with this status should be retried
    pub fn is_retryable(&self, status: u16) -> bool {
        self.retry_statuses.contains(&status)
    }

    /// Delay to wait before retry number `attempt` (0-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.backoff_base
            .saturating_mul(2u32.saturating_pow(attempt))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            backoff_base: Duration::from_secs(default_backoff_base_secs()),
            retry_statuses: default_retry_statuses(),
        }
    }
}

fn default_max_retries() -> u32 {
    3
}

fn default_backoff_base_secs() -> u64 {
    5
}

fn default_retry_statuses() -> Vec<u16> {
    vec![408, 429, 500, 502, 503, 504]
}
