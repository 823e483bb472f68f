//! Error types for the LiveDNS client
//!
//! This module defines all error types used throughout the workspace.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for LiveDNS operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the LiveDNS client
#[derive(Error, Debug)]
pub enum Error {
    /// The configuration file is absent or holds no host sections
    #[error("Configuration file missing or empty: {}", .0.display())]
    ConfigMissing(PathBuf),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// External IP discovery failed or returned garbage
    #[error("External IP discovery failed: {0}")]
    ExternalIp(String),

    /// Local hostname resolution failed
    #[error("Hostname resolution failed: {0}")]
    Resolve(String),

    /// A value expected to be an IP address did not parse
    #[error("Invalid IP address: {0}")]
    InvalidAddress(String),

    /// HTTP client errors
    #[error("HTTP error: {0}")]
    Http(String),

    /// Record or domain not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Provider-specific error
    #[error("Provider error ({provider}): {message}")]
    Provider {
        /// Provider name
        provider: String,
        /// Error message
        message: String,
    },
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an external IP discovery error
    pub fn external_ip(msg: impl Into<String>) -> Self {
        Self::ExternalIp(msg.into())
    }

    /// Create a hostname resolution error
    pub fn resolve(msg: impl Into<String>) -> Self {
        Self::Resolve(msg.into())
    }

    /// Create an invalid address error
    pub fn invalid_address(msg: impl Into<String>) -> Self {
        Self::InvalidAddress(msg.into())
    }

    /// Create an HTTP error
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }

    /// Create a "not found" error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a provider-specific error
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Whether this error must stop the whole run rather than a single entry
    ///
    /// Without a trustworthy current address no remaining entry can be
    /// reconciled, so discovery failures end the run. Configuration errors
    /// are raised before any entry is processed.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::ExternalIp(_) | Self::ConfigMissing(_) | Self::Config(_)
        )
    }
}

impl From<ini::Error> for Error {
    fn from(err: ini::Error) -> Self {
        match err {
            ini::Error::Io(e) => Self::Config(format!("failed to read configuration: {e}")),
            ini::Error::Parse(e) => Self::Config(e.to_string()),
        }
    }
}
