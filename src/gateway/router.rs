//! Degradation routing: primary path vs fallback path per service.
//!
//! The router holds a coarse boolean health flag per service. A primary
//! failure flips the flag and routes the call (and every later call) to
//! the fallback. The router never self-heals: clearing the flag is the job
//! of an external health check calling [`DegradationRouter::mark_healthy`].

use std::future::Future;

use dashmap::DashMap;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::domain::ServiceId;
use crate::error::{BoxError, GatewayError};

#[derive(Debug, Clone, Copy)]
struct ServiceHealth {
    healthy: bool,
    consecutive_failures: u32,
    last_failure: Option<Instant>,
}

impl Default for ServiceHealth {
    fn default() -> Self {
        Self {
            healthy: true,
            consecutive_failures: 0,
            last_failure: None,
        }
    }
}

/// Health snapshot for stats.
#[derive(Debug, Clone, Copy)]
pub struct HealthSnapshot {
    pub healthy: bool,
    pub consecutive_failures: u32,
}

/// Chooses between a primary call path and a fallback path per service.
pub struct DegradationRouter {
    services: DashMap<ServiceId, ServiceHealth>,
}

impl DegradationRouter {
    #[must_use]
    pub fn new() -> Self {
        Self {
            services: DashMap::new(),
        }
    }

    /// Run `primary`, degrading to `fallback` when the service is already
    /// marked unhealthy or when the primary path fails.
    ///
    /// Rate-limit rejections pass through untouched: throttling is not a
    /// failure and must neither flip the health flag nor burn the
    /// fallback. When the service is unhealthy but no fallback exists, the
    /// primary path is still attempted; with no lesser path to serve,
    /// refusing outright would turn degradation into an outage.
    pub async fn execute<T, P, FbFn, FbFut>(
        &self,
        service: &ServiceId,
        primary: P,
        fallback: Option<FbFn>,
    ) -> Result<T, GatewayError>
    where
        P: Future<Output = Result<T, GatewayError>>,
        FbFn: FnOnce() -> FbFut,
        FbFut: Future<Output = Result<T, BoxError>>,
    {
        if !self.is_healthy(service) {
            if let Some(fallback) = fallback {
                debug!(service = %service, "service degraded, routing straight to fallback");
                return Self::run_fallback(service, fallback).await;
            }
            debug!(service = %service, "service degraded but no fallback, attempting primary");
        }

        match primary.await {
            Ok(value) => Ok(value),
            Err(throttle @ GatewayError::RateLimitExceeded { .. }) => Err(throttle),
            Err(error) => {
                self.record_failure(service);
                match fallback {
                    Some(fallback) => {
                        warn!(service = %service, %error, "primary path failed, degrading to fallback");
                        Self::run_fallback(service, fallback).await
                    }
                    None => Err(error),
                }
            }
        }
    }

    /// True unless the service has been marked unhealthy.
    #[must_use]
    pub fn is_healthy(&self, service: &ServiceId) -> bool {
        self.services
            .get(service)
            .map_or(true, |health| health.healthy)
    }

    /// Mark a primary-path failure: flips the health flag and records it.
    pub fn record_failure(&self, service: &ServiceId) {
        let mut health = self.services.entry(service.clone()).or_default();
        health.healthy = false;
        health.consecutive_failures += 1;
        health.last_failure = Some(Instant::now());
    }

    /// Clear the health flag. Called by external health checks only; the
    /// router itself never does this.
    pub fn mark_healthy(&self, service: &ServiceId) {
        let mut health = self.services.entry(service.clone()).or_default();
        health.healthy = true;
        health.consecutive_failures = 0;
    }

    /// Health snapshot for `service`; services never seen read as healthy.
    #[must_use]
    pub fn snapshot(&self, service: &ServiceId) -> HealthSnapshot {
        let health = self
            .services
            .get(service)
            .map(|entry| *entry.value())
            .unwrap_or_default();
        HealthSnapshot {
            healthy: health.healthy,
            consecutive_failures: health.consecutive_failures,
        }
    }

    /// All services with recorded health, for gateway stats.
    #[must_use]
    pub fn services(&self) -> Vec<(ServiceId, HealthSnapshot)> {
        self.services
            .iter()
            .map(|entry| {
                (
                    entry.key().clone(),
                    HealthSnapshot {
                        healthy: entry.value().healthy,
                        consecutive_failures: entry.value().consecutive_failures,
                    },
                )
            })
            .collect()
    }

    async fn run_fallback<T, FbFn, FbFut>(
        service: &ServiceId,
        fallback: FbFn,
    ) -> Result<T, GatewayError>
    where
        FbFn: FnOnce() -> FbFut,
        FbFut: Future<Output = Result<T, BoxError>>,
    {
        fallback().await.map_err(|source| GatewayError::Upstream {
            service: service.to_string(),
            source,
        })
    }
}

impl Default for DegradationRouter {
    fn default() -> Self {
        Self::new()
    }
}
