//! Error types for fetching, configuration and serving.

use std::time::Duration;

use thiserror::Error;

use dump1090_core::ParseError;

/// Failure to obtain the raw bytes of a resource.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("{location} not found")]
    NotFound { location: String },

    #[error("request for {location} timed out after {timeout:?}")]
    Timeout { location: String, timeout: Duration },

    #[error("connection to {location} failed: {reason}")]
    Connection { location: String, reason: String },

    #[error("{location} returned HTTP {status}")]
    Status { location: String, status: u16 },

    #[error("failed to read {location}: {source}")]
    Io {
        location: String,
        #[source]
        source: std::io::Error,
    },
}

/// Failure of one poll: either the fetch or the interpretation of the document.
#[derive(Debug, Error)]
pub enum PollError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Invalid start-up configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("resource path must not be empty")]
    EmptyResourcePath,

    #[error("unsupported URL scheme in resource path '{0}' (expected http or https)")]
    UnsupportedScheme(String),

    #[error("{name} must be greater than zero")]
    NonPositive { name: &'static str },

    #[error("latitude and longitude must be supplied together")]
    PartialOrigin,

    #[error("{name} {value} is out of range")]
    OutOfRange { name: &'static str, value: f64 },

    #[error("at least one time period must be selected")]
    NoTimePeriods,

    #[error(transparent)]
    TimePeriod(#[from] ParseError),

    #[error("failed to build HTTP client: {0}")]
    HttpClient(String),
}

/// Fatal errors that stop the exporter.
#[derive(Debug, Error)]
pub enum ExporterError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to bind metrics listener on {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("metrics server failed: {0}")]
    Serve(#[source] std::io::Error),
}
