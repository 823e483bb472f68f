// # DNS Provider Trait
//
// Defines the interface for reading and writing zone records through a
// provider API.
//
// ## Implementations
//
// - Gandi LiveDNS: `ldns-provider-gandi` crate
//
// ## Usage
//
// ```rust,ignore
// use ldns_core::DnsProvider;
//
// let records = provider.list_records(&entry).await?;
// provider.update_record(&entry, "203.0.113.7".parse()?).await?;
// ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;

use crate::config::HostEntry;

/// A published rrset, as the provider lists it
///
/// ```json
/// {
///   "rrset_name": "@",
///   "rrset_ttl": 10800,
///   "rrset_type": "A",
///   "rrset_values": ["192.0.2.1"],
///   "rrset_href": "https://api.gandi.net/v5/livedns/domains/example.com/records/%40/A"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneRecord {
    /// Record type ("A", "AAAA", "MX", ...)
    pub rrset_type: String,
    /// Record label ("@", "www", ...)
    pub rrset_name: String,
    /// Record values
    #[serde(default)]
    pub rrset_values: Vec<String>,
    /// TTL in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rrset_ttl: Option<u32>,
    /// Link to the rrset resource
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rrset_href: Option<String>,
}

impl ZoneRecord {
    /// Create an A record with a single value
    pub fn a(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            rrset_type: "A".to_string(),
            rrset_name: name.into(),
            rrset_values: vec![value.into()],
            rrset_ttl: None,
            rrset_href: None,
        }
    }

    /// Whether this record is the A rrset for `name`
    pub fn is_a_record_for(&self, name: &str) -> bool {
        self.rrset_type == "A" && self.rrset_name == name
    }
}

/// Trait for DNS provider implementations
///
/// Implementations translate the two zone operations into provider API calls.
/// Comparing addresses and deciding whether an update is needed is owned by
/// the `Reconciler`.
///
/// Implementations must be thread-safe and usable across async tasks.
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// List every record in the entry's domain
    ///
    /// # Returns
    ///
    /// - `Ok(Vec<ZoneRecord>)`: The zone's records, in provider order
    /// - `Err(Error)`: Transport failure or non-success status
    async fn list_records(&self, entry: &HostEntry) -> Result<Vec<ZoneRecord>, crate::Error>;

    /// Replace the values of the entry's A record with `new_ip`
    ///
    /// The request carries a single value and the entry's TTL.
    ///
    /// # Returns
    ///
    /// - `Ok(())`: The provider accepted the update (any 2xx)
    /// - `Err(Error)`: Transport failure or non-success status
    async fn update_record(&self, entry: &HostEntry, new_ip: IpAddr) -> Result<(), crate::Error>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}
