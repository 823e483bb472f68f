//! System hostname resolution
//!
//! Uses the platform resolver (`getaddrinfo`), so `/etc/hosts` entries are
//! honoured. A host mapped to `127.0.0.1` there is how an operator marks "this
//! machine": the reconciler then falls back to public IP discovery.

use async_trait::async_trait;
use std::net::IpAddr;
use tracing::debug;

use crate::error::{Error, Result};
use crate::traits::HostResolver;

/// Resolver backed by the operating system
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemResolver;

impl SystemResolver {
    /// Create a new system resolver
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl HostResolver for SystemResolver {
    async fn resolve(&self, host: &str) -> Result<IpAddr> {
        let addrs: Vec<IpAddr> = tokio::net::lookup_host((host, 0))
            .await
            .map_err(|e| Error::resolve(format!("{}: {}", host, e)))?
            .map(|sa| sa.ip())
            .collect();

        let ip = pick_address(&addrs)
            .ok_or_else(|| Error::resolve(format!("{}: no addresses returned", host)))?;

        debug!("Resolved {} -> {} ({} candidate(s))", host, ip, addrs.len());
        Ok(ip)
    }
}

/// Prefer the first IPv4 address, as A records only hold IPv4
fn pick_address(addrs: &[IpAddr]) -> Option<IpAddr> {
    addrs
        .iter()
        .find(|ip| ip.is_ipv4())
        .or_else(|| addrs.first())
        .copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefers_ipv4() {
        let addrs: Vec<IpAddr> = vec!["2001:db8::1".parse().unwrap(), "192.0.2.1".parse().unwrap()];
        assert_eq!(pick_address(&addrs), Some("192.0.2.1".parse().unwrap()));
    }

    #[test]
    fn falls_back_to_first_address() {
        let addrs: Vec<IpAddr> = vec!["2001:db8::1".parse().unwrap()];
        assert_eq!(pick_address(&addrs), Some("2001:db8::1".parse().unwrap()));
        assert_eq!(pick_address(&[]), None);
    }

    #[tokio::test]
    async fn resolves_numeric_host_without_dns() {
        let ip = SystemResolver::new().resolve("192.0.2.10").await.unwrap();
        assert_eq!(ip, "192.0.2.10".parse::<IpAddr>().unwrap());
    }

    #[tokio::test]
    async fn resolves_localhost_to_loopback() {
        let ip = SystemResolver::new().resolve("localhost").await.unwrap();
        assert!(ip.is_loopback());
    }
}
