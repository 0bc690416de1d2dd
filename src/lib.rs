//! Nichelord - Resilient market-signal acquisition, scoring, and stress
//! testing for niche opportunities.
//!
//! Third-party market signals (search trends, competitive listings) come
//! from slow, rate-limited, unreliable upstreams. The interesting problem
//! is not the scoring arithmetic - it is surviving those upstreams while
//! keeping the scores consistent and deterministic. This crate provides:
//!
//! - **[`gateway`]** - The resilient acquisition path: a TTL cache behind
//!   a pluggable backend, per-service fixed-window rate limiting, a
//!   per-service circuit breaker, and degradation routing to caller
//!   fallbacks, all composed into one `fetch` contract around a
//!   caller-supplied producer closure. Single-flight collapsing ensures N
//!   concurrent misses on one key cost exactly one upstream call.
//! - **[`scoring`]** - A pure engine turning normalized metrics into
//!   numeric scores plus derived categorical levels (competition level,
//!   profitability tier, risk level). Dirty inputs are clamped and
//!   flagged, never rejected.
//! - **[`stress`]** - A deterministic simulator perturbing a scored
//!   opportunity under a closed set of adverse scenarios and aggregating
//!   survival and resilience into a report.
//!
//! # Modules
//!
//! - [`config`] - TOML configuration with every business heuristic exposed
//! - [`domain`] - Identifiers, metric inputs, scores, levels, reports
//! - [`error`] - Error taxonomy for the crate
//! - [`gateway`] - Resilient data-acquisition gateway
//! - [`scoring`] - Scoring engine
//! - [`stress`] - Stress-test simulator
//!
//! # Example
//!
//! ```
//! use nichelord::domain::MetricInputs;
//! use nichelord::scoring::ScoringEngine;
//! use nichelord::stress::{default_scenarios, StressSimulator};
//! use rust_decimal_macros::dec;
//!
//! let engine = ScoringEngine::default();
//! let scored = engine.score(
//!     "garden-planners",
//!     &MetricInputs::new(dec!(20), dec!(85), dec!(70), dec!(90)),
//! );
//! assert_eq!(scored.overall_score(), dec!(81.0));
//!
//! let simulator = StressSimulator::default();
//! let report = simulator.run_stress_test(&scored, &default_scenarios());
//! assert_eq!(report.results().len(), 4);
//! ```

pub mod config;
pub mod domain;
pub mod error;
pub mod gateway;
pub mod scoring;
pub mod stress;
