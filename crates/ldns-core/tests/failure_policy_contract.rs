//! Contract Test: Failure Policy
//!
//! Constraints verified:
//! - Public IP discovery failure ends the whole run before any update
//! - Provider, resolution and parse failures only stop the affected entry
//! - A failed or stale read-back does not trigger a second update
//! - A TTL LiveDNS would reject stops only its own entry, before any PUT

mod common;

use common::*;
use ldns_core::traits::ZoneRecord;
use ldns_core::{Error, ReconcileOutcome};
use std::net::IpAddr;

#[tokio::test]
async fn discovery_failure_aborts_run() {
    let provider = MockDnsProvider::new()
        .with_zone("example.com", vec![ZoneRecord::a("@", "9.9.9.9")])
        .with_zone("example.org", vec![ZoneRecord::a("@", "9.9.9.9")]);
    let resolver = StaticResolver::new()
        .with_host("home.example.com", "127.0.0.1")
        .with_host("example.org", "1.2.3.4");
    let ip_source = MockIpSource::failing("503 Service Unavailable");

    let reconciler = reconciler(&provider, resolver, &ip_source);
    let entries = vec![
        entry("home", "example.com", "@", "home.example.com"),
        entry("org", "example.org", "@", "example.org"),
    ];

    let err = reconciler.run(&entries).await.unwrap_err();

    assert!(matches!(err, Error::ExternalIp(_)), "got {err:?}");
    assert_eq!(provider.update_call_count(), 0, "no update after a discovery failure");
    assert_eq!(provider.list_call_count(), 1, "later entries are not processed");
}

#[tokio::test]
async fn provider_failure_is_isolated_to_its_entry() {
    let provider = MockDnsProvider::new()
        .failing_list("broken.example")
        .with_zone("example.org", vec![ZoneRecord::a("@", "9.9.9.9")]);
    let resolver = StaticResolver::new()
        .with_host("broken.example", "1.2.3.4")
        .with_host("example.org", "1.2.3.4");
    let ip_source = MockIpSource::returning("5.6.7.8");

    let reconciler = reconciler(&provider, resolver, &ip_source);
    let entries = vec![
        entry("broken", "broken.example", "@", "broken.example"),
        entry("org", "example.org", "@", "example.org"),
    ];

    let summary = reconciler.run(&entries).await.expect("run completes");

    assert_eq!(summary.entries.len(), 2);
    assert!(matches!(summary.entries[0].result, Err(Error::Provider { .. })));
    assert!(matches!(
        summary.entries[1].result,
        Ok(ReconcileOutcome::Updated { .. })
    ));
    assert_eq!(summary.failed(), 1);
    assert_eq!(provider.update_call_count(), 1);
}

#[tokio::test]
async fn rejected_update_is_reported_and_not_verified() {
    let provider = MockDnsProvider::new()
        .with_zone("example.com", vec![ZoneRecord::a("@", "9.9.9.9")])
        .failing_update("example.com");
    let resolver = StaticResolver::new().with_host("home.example.com", "1.2.3.4");
    let ip_source = MockIpSource::returning("5.6.7.8");

    let reconciler = reconciler(&provider, resolver, &ip_source);
    let entries = vec![entry("home", "example.com", "@", "home.example.com")];

    let summary = reconciler.run(&entries).await.unwrap();

    assert_eq!(summary.failed(), 1);
    assert_eq!(provider.list_call_count(), 1, "no read-back after a rejected update");
}

#[tokio::test]
async fn unresolvable_host_fails_only_that_entry() {
    let provider = MockDnsProvider::new()
        .with_zone("example.com", vec![ZoneRecord::a("@", "1.2.3.4")])
        .with_zone("example.org", vec![ZoneRecord::a("@", "1.2.3.4")]);
    let resolver = StaticResolver::new().with_host("example.org", "1.2.3.4");
    let ip_source = MockIpSource::returning("5.6.7.8");

    let reconciler = reconciler(&provider, resolver, &ip_source);
    let entries = vec![
        entry("gone", "example.com", "@", "gone.example.com"),
        entry("org", "example.org", "@", "example.org"),
    ];

    let summary = reconciler.run(&entries).await.unwrap();

    assert!(matches!(summary.entries[0].result, Err(Error::Resolve(_))));
    assert_eq!(summary.unchanged(), 1);
    assert_eq!(ip_source.call_count(), 0, "resolution failure is not a loopback answer");
}

#[tokio::test]
async fn malformed_zone_value_is_not_overwritten_blindly() {
    let provider =
        MockDnsProvider::new().with_zone("example.com", vec![ZoneRecord::a("@", "garbage")]);
    let resolver = StaticResolver::new().with_host("home.example.com", "1.2.3.4");
    let ip_source = MockIpSource::returning("5.6.7.8");

    let reconciler = reconciler(&provider, resolver, &ip_source);
    let entries = vec![entry("home", "example.com", "@", "home.example.com")];

    let summary = reconciler.run(&entries).await.unwrap();

    assert!(matches!(summary.entries[0].result, Err(Error::InvalidAddress(_))));
    assert_eq!(provider.update_call_count(), 0);
}

#[tokio::test]
async fn ipv6_address_is_not_put_in_an_a_record() {
    let provider =
        MockDnsProvider::new().with_zone("example.com", vec![ZoneRecord::a("@", "1.2.3.4")]);
    let resolver = StaticResolver::new().with_host("home.example.com", "2001:db8::1");
    let ip_source = MockIpSource::returning("5.6.7.8");

    let reconciler = reconciler(&provider, resolver, &ip_source);
    let entries = vec![entry("home", "example.com", "@", "home.example.com")];

    let summary = reconciler.run(&entries).await.unwrap();

    assert!(matches!(summary.entries[0].result, Err(Error::InvalidInput(_))));
    assert_eq!(provider.update_call_count(), 0);
}

#[tokio::test]
async fn stale_read_back_is_reported_without_retry() {
    let provider = MockDnsProvider::new()
        .with_zone("example.com", vec![ZoneRecord::a("@", "9.9.9.9")])
        .ignoring_updates();
    let resolver = StaticResolver::new().with_host("home.example.com", "1.2.3.4");
    let ip_source = MockIpSource::returning("5.6.7.8");

    let reconciler = reconciler(&provider, resolver, &ip_source);
    let entries = vec![entry("home", "example.com", "@", "home.example.com")];

    let summary = reconciler.run(&entries).await.unwrap();

    assert_eq!(provider.update_call_count(), 1);
    assert_eq!(
        summary.entries[0].result.as_ref().unwrap(),
        &ReconcileOutcome::Updated {
            previous: Some("9.9.9.9".parse::<IpAddr>().unwrap()),
            new_ip: "1.2.3.4".parse().unwrap(),
            verified: Some("9.9.9.9".parse().unwrap()),
        }
    );
}

#[tokio::test]
async fn out_of_range_ttl_fails_only_its_entry() {
    let provider = MockDnsProvider::new()
        .with_zone("example.com", vec![ZoneRecord::a("@", "9.9.9.9")])
        .with_zone("example.net", vec![ZoneRecord::a("@", "1.2.3.4")])
        .with_zone("example.org", vec![ZoneRecord::a("@", "9.9.9.9")]);
    let resolver = StaticResolver::new()
        .with_host("home.example.com", "1.2.3.4")
        .with_host("example.net", "1.2.3.4")
        .with_host("example.org", "1.2.3.4");
    let ip_source = MockIpSource::returning("5.6.7.8");

    let mut short_ttl = entry("short", "example.com", "@", "home.example.com");
    short_ttl.ttl = 60;
    let mut in_sync = entry("in-sync", "example.net", "@", "example.net");
    in_sync.ttl = 60;

    let reconciler = reconciler(&provider, resolver, &ip_source);
    let entries = vec![short_ttl, in_sync, entry("org", "example.org", "@", "example.org")];

    let summary = reconciler.run(&entries).await.expect("run completes");

    assert!(matches!(summary.entries[0].result, Err(Error::InvalidInput(ref m)) if m.contains("ttl")));
    assert!(matches!(
        summary.entries[1].result,
        Ok(ReconcileOutcome::Unchanged { .. })
    ));
    assert!(matches!(
        summary.entries[2].result,
        Ok(ReconcileOutcome::Updated { .. })
    ));

    let updates = provider.updates();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].domain, "example.org");
}
