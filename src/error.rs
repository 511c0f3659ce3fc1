//! Unified error type.

use std::net::AddrParseError;

/// The error type returned by warden's fallible operations.
///
/// Request-level outcomes (403, 404, etc.) are expressed as HTTP
/// [`Response`](crate::Response) values, not as `Error`s. This type surfaces
/// startup failures: binding a port, reading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse: {0}")]
    Config(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("invalid socket address: {0}")]
    InvalidAddress(#[from] AddrParseError),
}
