//! Per-service circuit breaker.
//!
//! States: Closed (normal), Open (rejecting without invoking the
//! producer), HalfOpen (exactly one trial call in flight). Transitions
//! happen only under the per-service entry lock, so concurrent callers can
//! never both win the half-open trial.

use std::time::Duration;

use dashmap::DashMap;
use serde::Deserialize;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::domain::ServiceId;
use crate::error::GatewayError;

/// Breaker tuning.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct BreakerConfig {
    /// Consecutive failures that trip the breaker open.
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,
    /// Seconds the breaker stays open before allowing a half-open trial.
    #[serde(default = "default_open_timeout_secs")]
    pub open_timeout_secs: u64,
}

const fn default_failure_threshold() -> u32 {
    5
}

const fn default_open_timeout_secs() -> u64 {
    60
}

impl BreakerConfig {
    /// Open timeout as a `Duration`.
    #[must_use]
    pub const fn open_timeout(&self) -> Duration {
        Duration::from_secs(self.open_timeout_secs)
    }
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: default_failure_threshold(),
            open_timeout_secs: default_open_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum BreakerState {
    Closed { failures: u32 },
    Open { since: Instant },
    HalfOpen,
}

/// Coarse breaker state for snapshots and stats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakerStateKind {
    Closed,
    Open,
    HalfOpen,
}

impl std::fmt::Display for BreakerStateKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Closed => write!(f, "closed"),
            Self::Open => write!(f, "open"),
            Self::HalfOpen => write!(f, "half_open"),
        }
    }
}

/// Proof that the breaker admitted a call; hand it back via
/// [`CircuitBreaker::on_success`] or [`CircuitBreaker::on_failure`].
#[must_use]
#[derive(Debug)]
pub struct BreakerPermit {
    trial: bool,
}

impl BreakerPermit {
    /// True if this call is the single half-open trial.
    #[must_use]
    pub fn is_trial(&self) -> bool {
        self.trial
    }
}

/// Per-service failure-tripped gate.
pub struct CircuitBreaker {
    states: DashMap<ServiceId, BreakerState>,
    config: BreakerConfig,
}

impl CircuitBreaker {
    #[must_use]
    pub fn new(config: BreakerConfig) -> Self {
        Self {
            states: DashMap::new(),
            config,
        }
    }

    /// Ask to make a call. Closed admits normally; Open rejects until the
    /// timeout elapses, then admits exactly one trial; HalfOpen rejects
    /// while the trial is in flight.
    pub fn try_acquire(&self, service: &ServiceId) -> Result<BreakerPermit, GatewayError> {
        let mut state = self
            .states
            .entry(service.clone())
            .or_insert(BreakerState::Closed { failures: 0 });

        match *state {
            BreakerState::Closed { .. } => Ok(BreakerPermit { trial: false }),
            BreakerState::Open { since } => {
                if since.elapsed() >= self.config.open_timeout() {
                    debug!(service = %service, "open timeout elapsed, admitting half-open trial");
                    *state = BreakerState::HalfOpen;
                    Ok(BreakerPermit { trial: true })
                } else {
                    Err(GatewayError::CircuitOpen {
                        service: service.to_string(),
                    })
                }
            }
            BreakerState::HalfOpen => Err(GatewayError::CircuitOpen {
                service: service.to_string(),
            }),
        }
    }

    /// Report a successful call admitted under `permit`.
    pub fn on_success(&self, service: &ServiceId, permit: BreakerPermit) {
        let mut state = self
            .states
            .entry(service.clone())
            .or_insert(BreakerState::Closed { failures: 0 });

        match *state {
            BreakerState::Closed { .. } => {
                *state = BreakerState::Closed { failures: 0 };
            }
            BreakerState::HalfOpen if permit.trial => {
                info!(service = %service, "half-open trial succeeded, closing circuit");
                *state = BreakerState::Closed { failures: 0 };
            }
            // A stale permit reporting against a state it no longer owns;
            // the in-flight trial will settle the state.
            BreakerState::HalfOpen | BreakerState::Open { .. } => {}
        }
    }

    /// Report a failed (or timed-out) call admitted under `permit`.
    pub fn on_failure(&self, service: &ServiceId, permit: BreakerPermit) {
        let mut state = self
            .states
            .entry(service.clone())
            .or_insert(BreakerState::Closed { failures: 0 });

        match *state {
            BreakerState::Closed { failures } => {
                let failures = failures + 1;
                if failures >= self.config.failure_threshold {
                    warn!(
                        service = %service,
                        failures,
                        "failure threshold breached, opening circuit"
                    );
                    *state = BreakerState::Open {
                        since: Instant::now(),
                    };
                } else {
                    *state = BreakerState::Closed { failures };
                }
            }
            BreakerState::HalfOpen if permit.trial => {
                warn!(service = %service, "half-open trial failed, reopening circuit");
                *state = BreakerState::Open {
                    since: Instant::now(),
                };
            }
            BreakerState::HalfOpen | BreakerState::Open { .. } => {}
        }
    }

    /// Current state for `service`; services never seen read as Closed.
    #[must_use]
    pub fn state_of(&self, service: &ServiceId) -> BreakerStateKind {
        match self.states.get(service).map(|state| *state) {
            None | Some(BreakerState::Closed { .. }) => BreakerStateKind::Closed,
            Some(BreakerState::Open { .. }) => BreakerStateKind::Open,
            Some(BreakerState::HalfOpen) => BreakerStateKind::HalfOpen,
        }
    }

    /// Consecutive failure count for `service`.
    #[must_use]
    pub fn failure_count(&self, service: &ServiceId) -> u32 {
        match self.states.get(service).map(|state| *state) {
            Some(BreakerState::Closed { failures }) => failures,
            _ => 0,
        }
    }

    /// All services with breaker state, for gateway stats.
    #[must_use]
    pub fn services(&self) -> Vec<(ServiceId, BreakerStateKind)> {
        self.states
            .iter()
            .map(|entry| {
                let kind = match *entry.value() {
                    BreakerState::Closed { .. } => BreakerStateKind::Closed,
                    BreakerState::Open { .. } => BreakerStateKind::Open,
                    BreakerState::HalfOpen => BreakerStateKind::HalfOpen,
                };
                (entry.key().clone(), kind)
            })
            .collect()
    }
}
