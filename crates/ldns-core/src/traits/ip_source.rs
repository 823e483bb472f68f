// # IP Source Trait
//
// Defines the interface for discovering the caller's public IP address.
//
// ## Implementations
//
// - HTTP discovery (api.ipify.org): `ldns-ip-http` crate
//
// ## Usage
//
// ```rust,ignore
// use ldns_core::IpSource;
//
// let public_ip = source.current().await?;
// ```

use async_trait::async_trait;
use std::net::IpAddr;

/// Trait for IP source implementations
///
/// The reconciler consults an IP source only when local resolution of a
/// host is uninformative (it resolves to loopback).
///
/// Implementations must be thread-safe and usable across async tasks.
#[async_trait]
pub trait IpSource: Send + Sync {
    /// Get the current public IP address
    ///
    /// # Returns
    ///
    /// - `Ok(IpAddr)`: The discovered address, already validated
    /// - `Err(Error::ExternalIp)`: Discovery failed or returned something
    ///   that is not an IP address
    async fn current(&self) -> Result<IpAddr, crate::Error>;

    /// Get the source name (for logging/debugging)
    fn source_name(&self) -> &str;
}
