//! Error types for credential failover

use thiserror::Error;

/// Result type alias for configuration-level failures.
///
/// The failover loop itself surfaces the unit of work's own error verbatim
/// as a [`tower::BoxError`]; this alias covers everything that can go wrong
/// before a single upstream call is attempted.
pub type Result<T> = std::result::Result<T, FailoverError>;

/// Configuration errors raised before any upstream call is attempted.
#[derive(Debug, Error)]
pub enum FailoverError {
    /// No usable credentials were found in the configuration source.
    #[error("credential pool is empty: no usable credentials in configuration")]
    EmptyCredentialPool,

    /// A required environment variable was not set (or not unicode).
    #[error("missing configuration variable: {var}")]
    MissingConfiguration { var: String },

    /// Failed to read a configuration file.
    #[error("failed to read configuration file: {0}")]
    ConfigIo(#[from] std::io::Error),

    /// Failed to parse a configuration file.
    #[error("failed to parse configuration file: {0}")]
    ConfigParse(#[from] toml::de::Error),
}
