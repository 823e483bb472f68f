// # Host Resolver Trait
//
// Defines the interface for resolving a configured hostname to the address
// that should be published.
//
// ## Implementations
//
// - System resolver: `ldns_core::resolver::SystemResolver`

use async_trait::async_trait;
use std::net::IpAddr;

/// Trait for hostname resolution
#[async_trait]
pub trait HostResolver: Send + Sync {
    /// Resolve `host` to a single address
    ///
    /// # Returns
    ///
    /// - `Ok(IpAddr)`: The address the host resolves to
    /// - `Err(Error::Resolve)`: The host does not resolve
    async fn resolve(&self, host: &str) -> Result<IpAddr, crate::Error>;
}
