// # ldns-core
//
// Core library for the Gandi LiveDNS reconciliation client.
//
// ## Architecture Overview
//
// This library provides the core functionality for keeping A records in sync:
// - **DnsProvider**: Trait for listing and updating zone records via a provider API
// - **IpSource**: Trait for discovering the public IP address
// - **HostResolver**: Trait for resolving configured hostnames locally
// - **Reconciler**: Compares published and current addresses and updates on mismatch
// - **HttpTransport**: Shared HTTP client with an explicit retry policy
//
// ## Design Principles
//
// 1. **Separation of Concerns**: The update decision lives in the reconciler;
//    providers and sources only perform I/O
// 2. **One-shot**: A run reconciles every entry once and returns; scheduling
//    is left to cron or a systemd timer
// 3. **Sequential**: Entries are reconciled one at a time, in file order
// 4. **Library-First**: All core functionality can be used as a library

pub mod config;
pub mod error;
pub mod http;
pub mod reconciler;
pub mod resolver;
pub mod traits;

// Re-export core types for convenience
pub use config::{HostEntry, RetryPolicy, load_config};
pub use error::{Error, Result};
pub use http::HttpTransport;
pub use reconciler::{EntryReport, ReconcileOutcome, Reconciler, RunSummary, UNSET_ADDRESS};
pub use resolver::SystemResolver;
pub use traits::{DnsProvider, HostResolver, IpSource, ZoneRecord};
