//! Resilient data-acquisition gateway.
//!
//! One call contract, [`ResilientGateway::fetch`], composed from four
//! parts: cache lookup, fixed-window rate limiting, a per-service circuit
//! breaker, and degradation routing to an optional fallback. The gateway
//! knows nothing about any concrete upstream API; callers hand it a
//! producer closure per request.
//!
//! All per-key and per-service state is owned by the gateway instance.
//! Two gateways never share state, so tests (and multiple tenants in one
//! process) cannot interfere with each other.

pub mod cache;
mod breaker;
mod rate_limit;
mod retry;
mod router;
mod single_flight;

pub use breaker::{BreakerConfig, BreakerPermit, BreakerStateKind, CircuitBreaker};
pub use cache::{
    CacheBackend, CacheBackendKind, CacheConfig, CacheStats, CacheStore, FileBackend,
    MemoryBackend,
};
pub use rate_limit::{RateLimitConfig, RateLimiter, RateQuota, WindowSnapshot};
pub use retry::{RetryConfig, RetryPolicy};
pub use router::{DegradationRouter, HealthSnapshot};

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::time::{sleep, timeout};
use tracing::{debug, warn};

use crate::domain::ServiceId;
use crate::error::{BoxError, CacheError, GatewayError};

use single_flight::SingleFlight;

/// Gateway configuration: one section per composed part.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    /// Execution timeout for a single producer call (seconds).
    #[serde(default = "default_producer_timeout_secs")]
    pub producer_timeout_secs: u64,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub breaker: BreakerConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub rate_limits: RateLimitConfig,
}

const fn default_producer_timeout_secs() -> u64 {
    30
}

impl GatewayConfig {
    /// Producer timeout as a `Duration`.
    #[must_use]
    pub const fn producer_timeout(&self) -> Duration {
        Duration::from_secs(self.producer_timeout_secs)
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            producer_timeout_secs: default_producer_timeout_secs(),
            cache: CacheConfig::default(),
            breaker: BreakerConfig::default(),
            retry: RetryConfig::default(),
            rate_limits: RateLimitConfig::default(),
        }
    }
}

/// Per-service stats row.
#[derive(Debug, Clone)]
pub struct ServiceStats {
    pub service: ServiceId,
    pub healthy: bool,
    pub consecutive_failures: u32,
    pub breaker: BreakerStateKind,
}

/// Gateway-wide stats snapshot.
#[derive(Debug, Clone)]
pub struct GatewayStats {
    pub cache: CacheStats,
    pub services: Vec<ServiceStats>,
}

/// Stand-in fallback type for [`ResilientGateway::fetch`], which has none.
type NeverFallback<T> = fn() -> std::future::Ready<Result<T, BoxError>>;

/// The resilient gateway.
pub struct ResilientGateway {
    cache: CacheStore,
    limiter: RateLimiter,
    breaker: CircuitBreaker,
    router: DegradationRouter,
    retry: RetryPolicy,
    producer_timeout: Duration,
    flights: SingleFlight,
}

impl ResilientGateway {
    /// Build a gateway from config, constructing the configured cache
    /// backend.
    pub fn new(config: GatewayConfig) -> Result<Self, CacheError> {
        let cache = CacheStore::from_config(&config.cache)?;
        Ok(Self::assemble(config, cache))
    }

    /// Build a gateway over a caller-supplied cache backend.
    #[must_use]
    pub fn with_backend(config: GatewayConfig, backend: Arc<dyn CacheBackend>) -> Self {
        let cache = CacheStore::with_backend(backend);
        Self::assemble(config, cache)
    }

    fn assemble(config: GatewayConfig, cache: CacheStore) -> Self {
        Self {
            cache,
            limiter: RateLimiter::new(config.rate_limits.clone()),
            breaker: CircuitBreaker::new(config.breaker),
            router: DegradationRouter::new(),
            retry: RetryPolicy::new(config.retry),
            producer_timeout: config.producer_timeout(),
            flights: SingleFlight::new(),
        }
    }

    /// Fetch a value for `key`, producing it via `producer` on a cache
    /// miss.
    ///
    /// The full path on a miss: single-flight serialization per key, rate
    /// limiter admission, circuit breaker gate, then the producer under an
    /// execution timeout with bounded retries. Success populates the cache
    /// for `ttl` and resets breaker failures; failure feeds the breaker
    /// and the degradation router.
    ///
    /// # Errors
    ///
    /// [`GatewayError::RateLimitExceeded`] when the service window is
    /// exhausted, [`GatewayError::CircuitOpen`] when the breaker rejects
    /// and no fallback exists, [`GatewayError::Upstream`] when producer
    /// (and fallback, if any) are exhausted.
    pub async fn fetch<T, P, PFut>(
        &self,
        service: &ServiceId,
        key: &str,
        ttl: Duration,
        producer: P,
    ) -> Result<T, GatewayError>
    where
        T: Serialize + DeserializeOwned + Send,
        P: Fn() -> PFut,
        PFut: Future<Output = Result<T, BoxError>> + Send,
    {
        self.fetch_inner(service, key, ttl, producer, None::<NeverFallback<T>>)
            .await
    }

    /// Like [`fetch`](Self::fetch), with a fallback path used when the
    /// service is degraded or the primary path is exhausted. Fallback
    /// results are served to the caller but never cached.
    pub async fn fetch_with_fallback<T, P, PFut, F, FFut>(
        &self,
        service: &ServiceId,
        key: &str,
        ttl: Duration,
        producer: P,
        fallback: F,
    ) -> Result<T, GatewayError>
    where
        T: Serialize + DeserializeOwned + Send,
        P: Fn() -> PFut,
        PFut: Future<Output = Result<T, BoxError>> + Send,
        F: FnOnce() -> FFut,
        FFut: Future<Output = Result<T, BoxError>> + Send,
    {
        self.fetch_inner(service, key, ttl, producer, Some(fallback))
            .await
    }

    async fn fetch_inner<T, P, PFut, F, FFut>(
        &self,
        service: &ServiceId,
        key: &str,
        ttl: Duration,
        producer: P,
        fallback: Option<F>,
    ) -> Result<T, GatewayError>
    where
        T: Serialize + DeserializeOwned + Send,
        P: Fn() -> PFut,
        PFut: Future<Output = Result<T, BoxError>> + Send,
        F: FnOnce() -> FFut,
        FFut: Future<Output = Result<T, BoxError>> + Send,
    {
        if let Some(value) = self.cache.get_typed::<T>(key).await {
            return Ok(value);
        }

        // Collapse concurrent misses: one flight per key, everyone else
        // re-checks the cache once the flight lands.
        let flight = self.flights.lease(key);
        let _guard = flight.lock().await;
        if let Some(value) = self.cache.get_typed::<T>(key).await {
            debug!(key, "single-flight peer populated the cache");
            return Ok(value);
        }

        let primary = self.produce_guarded(service, key, ttl, &producer);
        self.router.execute(service, primary, fallback).await
    }

    /// The primary path: rate limiter, breaker gate, then the producer
    /// under timeout with bounded retries.
    async fn produce_guarded<T, P, PFut>(
        &self,
        service: &ServiceId,
        key: &str,
        ttl: Duration,
        producer: &P,
    ) -> Result<T, GatewayError>
    where
        T: Serialize + DeserializeOwned + Send,
        P: Fn() -> PFut,
        PFut: Future<Output = Result<T, BoxError>> + Send,
    {
        self.limiter.admit(service)?;

        let mut last_error = None;
        for attempt in 1..=self.retry.max_attempts() {
            // An open circuit short-circuits the remaining attempts; the
            // router decides whether a fallback absorbs it.
            let permit = self.breaker.try_acquire(service)?;

            match timeout(self.producer_timeout, producer()).await {
                Ok(Ok(value)) => {
                    self.breaker.on_success(service, permit);
                    self.cache.set_typed(key, &value, ttl).await;
                    return Ok(value);
                }
                Ok(Err(source)) => {
                    warn!(service = %service, key, attempt, error = %source, "producer failed");
                    self.breaker.on_failure(service, permit);
                    last_error = Some(GatewayError::Upstream {
                        service: service.to_string(),
                        source,
                    });
                }
                Err(_elapsed) => {
                    warn!(
                        service = %service,
                        key,
                        attempt,
                        timeout = ?self.producer_timeout,
                        "producer timed out"
                    );
                    self.breaker.on_failure(service, permit);
                    last_error = Some(GatewayError::Upstream {
                        service: service.to_string(),
                        source: format!("producer timed out after {:?}", self.producer_timeout)
                            .into(),
                    });
                }
            }

            if attempt < self.retry.max_attempts() {
                sleep(self.retry.delay_for(attempt)).await;
            }
        }

        Err(last_error.unwrap_or_else(|| GatewayError::Upstream {
            service: service.to_string(),
            source: "no producer attempts were made".into(),
        }))
    }

    /// The cache store, for stats and manual invalidation.
    #[must_use]
    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    /// The degradation router, so an external health check can clear
    /// service health flags via [`DegradationRouter::mark_healthy`].
    #[must_use]
    pub fn router(&self) -> &DegradationRouter {
        &self.router
    }

    /// Breaker state for one service.
    #[must_use]
    pub fn breaker_state(&self, service: &ServiceId) -> BreakerStateKind {
        self.breaker.state_of(service)
    }

    /// Current rate window for one service, if any calls were made.
    #[must_use]
    pub fn rate_window(&self, service: &ServiceId) -> Option<WindowSnapshot> {
        self.limiter.snapshot(service)
    }

    /// Snapshot cache counters and per-service health/breaker state.
    #[must_use]
    pub fn stats(&self) -> GatewayStats {
        let mut services: BTreeMap<ServiceId, ServiceStats> = BTreeMap::new();

        for (service, breaker) in self.breaker.services() {
            let health = self.router.snapshot(&service);
            services.insert(
                service.clone(),
                ServiceStats {
                    service,
                    healthy: health.healthy,
                    consecutive_failures: health.consecutive_failures,
                    breaker,
                },
            );
        }
        for (service, health) in self.router.services() {
            services
                .entry(service.clone())
                .or_insert_with(|| ServiceStats {
                    service: service.clone(),
                    healthy: health.healthy,
                    consecutive_failures: health.consecutive_failures,
                    breaker: BreakerStateKind::Closed,
                });
        }

        GatewayStats {
            cache: self.cache.stats(),
            services: services.into_values().collect(),
        }
    }
}
