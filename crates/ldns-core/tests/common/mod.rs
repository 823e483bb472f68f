//! Test doubles and common utilities for reconciler contract tests
//!
//! The doubles record every call so tests can assert on exactly which
//! provider requests a run produced.

#![allow(dead_code)]

use ldns_core::config::HostEntry;
use ldns_core::error::{Error, Result};
use ldns_core::traits::{DnsProvider, HostResolver, IpSource, ZoneRecord};
use std::collections::{HashMap, HashSet};
use std::net::IpAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// An update request as the provider received it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateCall {
    pub domain: String,
    pub a_name: String,
    pub ttl: u32,
    pub values: Vec<String>,
}

#[derive(Default)]
struct ProviderState {
    zones: HashMap<String, Vec<ZoneRecord>>,
    list_calls: usize,
    updates: Vec<UpdateCall>,
    failing_lists: HashSet<String>,
    failing_updates: HashSet<String>,
    ignore_updates: bool,
}

/// An in-memory provider that tracks calls
///
/// Clones share state, so a test can keep one handle while the reconciler
/// owns another.
#[derive(Clone, Default)]
pub struct MockDnsProvider {
    state: Arc<Mutex<ProviderState>>,
}

impl MockDnsProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a domain's zone
    pub fn with_zone(self, domain: &str, records: Vec<ZoneRecord>) -> Self {
        self.state
            .lock()
            .unwrap()
            .zones
            .insert(domain.to_string(), records);
        self
    }

    /// Make listing `domain` fail
    pub fn failing_list(self, domain: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .failing_lists
            .insert(domain.to_string());
        self
    }

    /// Make updates on `domain` fail
    pub fn failing_update(self, domain: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .failing_updates
            .insert(domain.to_string());
        self
    }

    /// Accept updates without changing the zone (a lagging provider)
    pub fn ignoring_updates(self) -> Self {
        self.state.lock().unwrap().ignore_updates = true;
        self
    }

    pub fn list_call_count(&self) -> usize {
        self.state.lock().unwrap().list_calls
    }

    pub fn updates(&self) -> Vec<UpdateCall> {
        self.state.lock().unwrap().updates.clone()
    }

    pub fn update_call_count(&self) -> usize {
        self.state.lock().unwrap().updates.len()
    }

    /// Change a record behind the reconciler's back
    pub fn set_record(&self, domain: &str, record: ZoneRecord) {
        let mut state = self.state.lock().unwrap();
        let zone = state.zones.entry(domain.to_string()).or_default();
        zone.retain(|r| !(r.rrset_type == record.rrset_type && r.rrset_name == record.rrset_name));
        zone.push(record);
    }
}

#[async_trait::async_trait]
impl DnsProvider for MockDnsProvider {
    async fn list_records(&self, entry: &HostEntry) -> Result<Vec<ZoneRecord>> {
        let mut state = self.state.lock().unwrap();
        state.list_calls += 1;

        if state.failing_lists.contains(&entry.domain) {
            return Err(Error::provider("mock", "503 Service Unavailable"));
        }

        Ok(state.zones.get(&entry.domain).cloned().unwrap_or_default())
    }

    async fn update_record(&self, entry: &HostEntry, new_ip: IpAddr) -> Result<()> {
        let mut state = self.state.lock().unwrap();

        if state.failing_updates.contains(&entry.domain) {
            return Err(Error::provider("mock", "400 Bad Request"));
        }

        state.updates.push(UpdateCall {
            domain: entry.domain.clone(),
            a_name: entry.a_name.clone(),
            ttl: entry.ttl,
            values: vec![new_ip.to_string()],
        });

        if !state.ignore_updates {
            let zone = state.zones.entry(entry.domain.clone()).or_default();
            zone.retain(|r| !r.is_a_record_for(&entry.a_name));
            zone.push(ZoneRecord::a(&entry.a_name, new_ip.to_string()));
        }

        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

/// A resolver answering from a fixed table
#[derive(Clone, Default)]
pub struct StaticResolver {
    hosts: HashMap<String, IpAddr>,
}

impl StaticResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_host(mut self, host: &str, ip: &str) -> Self {
        self.hosts.insert(host.to_string(), ip.parse().unwrap());
        self
    }
}

#[async_trait::async_trait]
impl HostResolver for StaticResolver {
    async fn resolve(&self, host: &str) -> Result<IpAddr> {
        self.hosts
            .get(host)
            .copied()
            .ok_or_else(|| Error::resolve(format!("{}: Name or service not known", host)))
    }
}

/// An IP source returning a fixed answer and counting calls
#[derive(Clone)]
pub struct MockIpSource {
    answer: std::result::Result<IpAddr, String>,
    calls: Arc<AtomicUsize>,
}

impl MockIpSource {
    pub fn returning(ip: &str) -> Self {
        Self {
            answer: Ok(ip.parse().unwrap()),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            answer: Err(message.to_string()),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl IpSource for MockIpSource {
    async fn current(&self) -> Result<IpAddr> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.answer.clone().map_err(Error::external_ip)
    }

    fn source_name(&self) -> &str {
        "mock-ipify"
    }
}

/// Helper to create a host entry with test defaults
pub fn entry(name: &str, domain: &str, a_name: &str, host: &str) -> HostEntry {
    HostEntry::new(
        name,
        "https://api.test/v5/livedns/",
        "test-key",
        domain,
        a_name,
        host,
        300,
    )
    .expect("valid test entry")
}

/// Helper to build a reconciler over shared test doubles
pub fn reconciler(
    provider: &MockDnsProvider,
    resolver: StaticResolver,
    ip_source: &MockIpSource,
) -> ldns_core::Reconciler {
    ldns_core::Reconciler::new(
        Box::new(provider.clone()),
        Box::new(resolver),
        Box::new(ip_source.clone()),
    )
}
