//! Fixed-window outbound rate limiting, one window per service.

use std::collections::HashMap;
use std::time::Duration;

use dashmap::DashMap;
use serde::Deserialize;
use tokio::time::Instant;
use tracing::debug;

use crate::domain::ServiceId;
use crate::error::GatewayError;

/// Per-service quota: at most `limit` admissions per `period_secs` window.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RateQuota {
    #[serde(default = "default_limit")]
    pub limit: u32,
    #[serde(default = "default_period_secs")]
    pub period_secs: u64,
}

const fn default_limit() -> u32 {
    60
}

const fn default_period_secs() -> u64 {
    60
}

impl RateQuota {
    /// Window length as a `Duration`.
    #[must_use]
    pub const fn period(&self) -> Duration {
        Duration::from_secs(self.period_secs)
    }
}

impl Default for RateQuota {
    fn default() -> Self {
        Self {
            limit: default_limit(),
            period_secs: default_period_secs(),
        }
    }
}

/// Rate limiter configuration: a default quota plus per-service overrides.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default)]
    pub default: RateQuota,
    #[serde(default)]
    pub services: HashMap<String, RateQuota>,
}

#[derive(Debug)]
struct RateWindow {
    started: Instant,
    count: u32,
}

/// Snapshot of one service's current window, for stats.
#[derive(Debug, Clone, Copy)]
pub struct WindowSnapshot {
    pub count: u32,
    pub limit: u32,
}

/// Fixed-window rate limiter.
///
/// Admission either succeeds and counts against the window, or fails with
/// a retry hint. A rejection is a throttling signal, never an upstream
/// failure: it must not reach circuit breaker accounting.
pub struct RateLimiter {
    windows: DashMap<ServiceId, RateWindow>,
    config: RateLimitConfig,
}

impl RateLimiter {
    #[must_use]
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            windows: DashMap::new(),
            config,
        }
    }

    /// Admit one outbound call for `service`, or reject with
    /// [`GatewayError::RateLimitExceeded`] carrying the time until the
    /// window rolls over.
    pub fn admit(&self, service: &ServiceId) -> Result<(), GatewayError> {
        let quota = self.quota_for(service);
        let now = Instant::now();
        let mut window = self
            .windows
            .entry(service.clone())
            .or_insert_with(|| RateWindow {
                started: now,
                count: 0,
            });

        let elapsed = now.duration_since(window.started);
        if elapsed >= quota.period() {
            window.started = now;
            window.count = 0;
        }

        if window.count < quota.limit {
            window.count += 1;
            return Ok(());
        }

        let retry_after = quota.period().saturating_sub(now.duration_since(window.started));
        debug!(service = %service, ?retry_after, "rate limit window exhausted");
        Err(GatewayError::RateLimitExceeded {
            service: service.to_string(),
            retry_after,
        })
    }

    /// Current window for `service`, if one exists yet.
    #[must_use]
    pub fn snapshot(&self, service: &ServiceId) -> Option<WindowSnapshot> {
        let limit = self.quota_for(service).limit;
        self.windows.get(service).map(|window| WindowSnapshot {
            count: window.count,
            limit,
        })
    }

    fn quota_for(&self, service: &ServiceId) -> RateQuota {
        self.config
            .services
            .get(service.as_str())
            .copied()
            .unwrap_or(self.config.default)
    }
}
