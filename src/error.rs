use std::time::Duration;

use thiserror::Error;

/// Boxed error type carried by producer and fallback closures.
///
/// The gateway never inspects upstream error payloads; it only wraps them
/// for breaker accounting and propagation.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Configuration-related errors with structured variants.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),
}

/// Cache backend errors.
///
/// Always recoverable: the gateway treats any cache error as a miss and
/// keeps going, so a broken backend degrades hit rate rather than requests.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("cache io failure: {0}")]
    Io(#[from] std::io::Error),

    #[error("cache serialization failure: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("cache backend failure: {0}")]
    Backend(String),
}

/// Errors surfaced by [`crate::gateway::ResilientGateway::fetch`].
#[derive(Error, Debug)]
pub enum GatewayError {
    /// The per-service fixed window is exhausted.
    ///
    /// This is a throttling signal, not an upstream failure: it carries a
    /// retry hint and never touches circuit breaker state.
    #[error("rate limit exceeded for {service}, retry after {retry_after:?}")]
    RateLimitExceeded {
        service: String,
        retry_after: Duration,
    },

    /// The per-service circuit breaker is open; the producer was not invoked.
    #[error("circuit open for {service}")]
    CircuitOpen { service: String },

    /// The producer (or the fallback, once the primary path is exhausted)
    /// failed. Drives breaker accounting and degradation routing.
    #[error("upstream call failed for {service}: {source}")]
    Upstream {
        service: String,
        #[source]
        source: BoxError,
    },

    #[error(transparent)]
    Cache(#[from] CacheError),
}

impl GatewayError {
    /// The service this error concerns, when known.
    #[must_use]
    pub fn service(&self) -> Option<&str> {
        match self {
            Self::RateLimitExceeded { service, .. }
            | Self::CircuitOpen { service }
            | Self::Upstream { service, .. } => Some(service),
            Self::Cache(_) => None,
        }
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("failed to parse metrics file: {0}")]
    Metrics(#[source] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
