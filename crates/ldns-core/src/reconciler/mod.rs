//! Zone reconciler
//!
//! The Reconciler is responsible for:
//! - Reading the published A record for each configured host
//! - Determining the address the host should have
//! - Updating the provider only when the two differ
//! - Reading the record back so the operator can see the result
//!
//! ## Architecture
//!
//! ```text
//!                      ┌──────────────┐
//!   HostEntry ────────▶│  Reconciler  │
//!                      └──────────────┘
//!                             │
//!         ┌───────────────────┼────────────────────┐
//!         │                   │                    │
//!         ▼                   ▼                    ▼
//! ┌──────────────┐   ┌──────────────┐     ┌──────────────┐
//! │ DnsProvider  │   │ HostResolver │────▶│   IpSource   │
//! │ (list / put) │   │  (system)    │ lo  │  (ipify)     │
//! └──────────────┘   └──────────────┘     └──────────────┘
//! ```
//!
//! ## Per-entry flow
//!
//! 1. List the zone, take the first value of the matching A record
//!    (0.0.0.0 when there is none)
//! 2. Resolve the configured host; a loopback answer means "ask the IP source"
//! 3. Equal addresses: done
//! 4. Otherwise PUT the new address, then list the zone again
//!
//! Entries are processed strictly one after another, in configuration order.

use std::net::{IpAddr, Ipv4Addr};

use tracing::{debug, error, info, warn};

use crate::config::HostEntry;
use crate::error::{Error, Result};
use crate::traits::{DnsProvider, HostResolver, IpSource, ZoneRecord};

/// Address reported for a record that does not exist yet
///
/// It only ever flows into comparisons; it is never sent to the provider.
pub const UNSET_ADDRESS: IpAddr = IpAddr::V4(Ipv4Addr::UNSPECIFIED);

/// Result of reconciling one host entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Zone already publishes the current address
    Unchanged {
        /// The address found in both places
        ip: IpAddr,
    },
    /// Zone was updated
    Updated {
        /// The previously published address (`None` if the record was unset)
        previous: Option<IpAddr>,
        /// The address that was submitted
        new_ip: IpAddr,
        /// The address read back after the update (`None` if the read failed)
        verified: Option<IpAddr>,
    },
}

/// Per-entry report collected during a run
#[derive(Debug)]
pub struct EntryReport {
    /// Section name of the entry
    pub section: String,
    /// Outcome, or the error that stopped this entry
    pub result: Result<ReconcileOutcome>,
}

/// Summary of one reconciliation pass
#[derive(Debug, Default)]
pub struct RunSummary {
    /// Reports in configuration order
    pub entries: Vec<EntryReport>,
}

impl RunSummary {
    /// Number of entries whose record was updated
    pub fn updated(&self) -> usize {
        self.entries
            .iter()
            .filter(|r| matches!(r.result, Ok(ReconcileOutcome::Updated { .. })))
            .count()
    }

    /// Number of entries that were already in sync
    pub fn unchanged(&self) -> usize {
        self.entries
            .iter()
            .filter(|r| matches!(r.result, Ok(ReconcileOutcome::Unchanged { .. })))
            .count()
    }

    /// Number of entries that failed
    pub fn failed(&self) -> usize {
        self.entries.iter().filter(|r| r.result.is_err()).count()
    }

    /// Whether every entry succeeded
    pub fn is_clean(&self) -> bool {
        self.failed() == 0
    }
}

/// Core reconciler
///
/// Owns the update decision; the provider, resolver and IP source only
/// perform I/O.
pub struct Reconciler {
    /// DNS provider for reading and writing records
    provider: Box<dyn DnsProvider>,

    /// Local hostname resolution
    resolver: Box<dyn HostResolver>,

    /// Public IP discovery, used when a host resolves to loopback
    ip_source: Box<dyn IpSource>,
}

impl Reconciler {
    /// Create a new reconciler
    ///
    /// # Parameters
    ///
    /// - `provider`: DNS provider implementation
    /// - `resolver`: Hostname resolver
    /// - `ip_source`: Public IP source
    pub fn new(
        provider: Box<dyn DnsProvider>,
        resolver: Box<dyn HostResolver>,
        ip_source: Box<dyn IpSource>,
    ) -> Self {
        Self {
            provider,
            resolver,
            ip_source,
        }
    }

    /// Reconcile every entry, in order
    ///
    /// A failure on one entry is logged and recorded, and the next entry is
    /// processed. A fatal error (public IP discovery failing) ends the run.
    ///
    /// # Returns
    ///
    /// - `Ok(RunSummary)`: Every entry was attempted
    /// - `Err(Error)`: A fatal error stopped the run
    pub async fn run(&self, entries: &[HostEntry]) -> Result<RunSummary> {
        info!(
            "Reconciling {} host entr{} via {}",
            entries.len(),
            if entries.len() == 1 { "y" } else { "ies" },
            self.provider.provider_name()
        );

        let mut summary = RunSummary::default();

        for entry in entries {
            match self.reconcile_entry(entry).await {
                Err(e) if e.is_fatal() => {
                    error!("[{}] aborting run: {}", entry.name, e);
                    return Err(e);
                }
                result => {
                    if let Err(e) = &result {
                        error!("[{}] reconciliation failed: {}", entry.name, e);
                    }
                    summary.entries.push(EntryReport {
                        section: entry.name.clone(),
                        result,
                    });
                }
            }
        }

        info!(
            "Run complete: {} updated, {} unchanged, {} failed",
            summary.updated(),
            summary.unchanged(),
            summary.failed()
        );

        Ok(summary)
    }

    /// Reconcile a single entry
    pub async fn reconcile_entry(&self, entry: &HostEntry) -> Result<ReconcileOutcome> {
        debug!("[{}] reconciling {}.{}", entry.name, entry.a_name, entry.domain);

        let zone_ip = self.fetch_zone_ip(entry).await?;
        let current_ip = self.resolve_current_ip(entry).await?;

        if zone_ip == current_ip {
            debug!("[{}] A record already set to {}", entry.name, current_ip);
            return Ok(ReconcileOutcome::Unchanged { ip: current_ip });
        }

        info!(
            "[{}] DNS mismatch detected: A-record: {} WAN IP: {}",
            entry.name, zone_ip, current_ip
        );

        self.update_zone_ip(entry, current_ip).await?;

        let verified = match self.fetch_zone_ip(entry).await {
            Ok(ip) if ip == current_ip => {
                info!("[{}] DNS A record update complete - set to: {}", entry.name, ip);
                Some(ip)
            }
            Ok(ip) => {
                warn!(
                    "[{}] DNS A record update sent, but the zone still reports: {}",
                    entry.name, ip
                );
                Some(ip)
            }
            Err(e) => {
                warn!("[{}] could not read back the A record: {}", entry.name, e);
                None
            }
        };

        Ok(ReconcileOutcome::Updated {
            previous: (zone_ip != UNSET_ADDRESS).then_some(zone_ip),
            new_ip: current_ip,
            verified,
        })
    }

    /// Get the address currently published in the entry's A record
    ///
    /// # Returns
    ///
    /// - `Ok(UNSET_ADDRESS)`: No A record with the entry's name exists
    /// - `Ok(IpAddr)`: First value of the matching record
    /// - `Err(Error)`: Listing failed, or the value is not an address
    pub async fn fetch_zone_ip(&self, entry: &HostEntry) -> Result<IpAddr> {
        let records = self.provider.list_records(entry).await?;
        zone_ip_from_records(&records, &entry.a_name)
    }

    /// Determine the address the entry's record should hold
    ///
    /// The configured host is resolved locally; a loopback answer is
    /// replaced by the public address from the IP source.
    pub async fn resolve_current_ip(&self, entry: &HostEntry) -> Result<IpAddr> {
        let ip = self.resolver.resolve(&entry.host).await?;

        if !ip.is_loopback() {
            return Ok(ip);
        }

        debug!(
            "[{}] {} resolves to {}, asking {}",
            entry.name,
            entry.host,
            ip,
            self.ip_source.source_name()
        );

        self.ip_source.current().await.map_err(|e| match e {
            Error::ExternalIp(_) => e,
            other => Error::external_ip(other.to_string()),
        })
    }

    /// Publish `new_ip` in the entry's A record
    ///
    /// Refuses the unset sentinel, IPv6 addresses and out-of-range TTLs
    /// before anything is sent.
    pub async fn update_zone_ip(&self, entry: &HostEntry, new_ip: IpAddr) -> Result<()> {
        entry.check_ttl()?;

        if new_ip.is_unspecified() {
            return Err(Error::invalid_input(format!(
                "refusing to publish unspecified address {} for {}",
                new_ip, entry.host
            )));
        }

        if !new_ip.is_ipv4() {
            return Err(Error::invalid_input(format!(
                "an A record cannot hold {} (IPv6)",
                new_ip
            )));
        }

        self.provider.update_record(entry, new_ip).await
    }
}

/// Find the published address of the A record called `name`
///
/// Only the first matching record is considered, and only its first value.
pub fn zone_ip_from_records(records: &[ZoneRecord], name: &str) -> Result<IpAddr> {
    let Some(value) = records
        .iter()
        .find(|r| r.is_a_record_for(name))
        .and_then(|r| r.rrset_values.first())
    else {
        return Ok(UNSET_ADDRESS);
    };

    value.trim().parse().map_err(|_| {
        Error::invalid_address(format!("A record '{}' holds '{}'", name, value))
    })
}
