//! Core traits for the LiveDNS client
//!
//! This module defines the abstract interfaces the reconciler is built on.
//!
//! - [`DnsProvider`]: Read and update zone records via a provider API
//! - [`IpSource`]: Discover the public IP address
//! - [`HostResolver`]: Resolve configured hostnames locally

pub mod dns_provider;
pub mod host_resolver;
pub mod ip_source;

pub use dns_provider::{DnsProvider, ZoneRecord};
pub use host_resolver::HostResolver;
pub use ip_source::IpSource;
