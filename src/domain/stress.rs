//! Stress scenario types and the terminal stress report.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::opportunity::ScoredOpportunity;
use super::score::RiskLevel;

/// The closed set of adverse market scenarios.
///
/// Deliberately not a plugin surface: each variant has a fixed,
/// deterministic transform in [`crate::stress`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scenario {
    /// A sudden influx of new competitors into the niche.
    CompetitionIncrease,
    /// The underlying demand trend reverses direction.
    TrendReversal,
    /// A severe seasonal demand drop.
    SeasonalDecline,
    /// The market becomes oversaturated with near-identical offerings.
    MarketSaturation,
}

impl Scenario {
    /// All scenarios in canonical order.
    #[must_use]
    pub const fn all() -> [Self; 4] {
        [
            Self::CompetitionIncrease,
            Self::TrendReversal,
            Self::SeasonalDecline,
            Self::MarketSaturation,
        ]
    }

    /// Stable machine name for logs and serialized reports.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::CompetitionIncrease => "competition_increase",
            Self::TrendReversal => "trend_reversal",
            Self::SeasonalDecline => "seasonal_decline",
            Self::MarketSaturation => "market_saturation",
        }
    }

    /// Human-readable description.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::CompetitionIncrease => "Sudden influx of new competitors",
            Self::TrendReversal => "Major trend reversal or consumer preference shift",
            Self::SeasonalDecline => "Severe seasonal demand drop",
            Self::MarketSaturation => "Market becomes oversaturated with competitors",
        }
    }
}

impl std::fmt::Display for Scenario {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Severity and likelihood parameters for one scenario run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioParams {
    pub scenario: Scenario,
    /// Severity factor in `[0, 1]`; values outside are clamped on use.
    pub severity: Decimal,
    /// Likelihood weight used when aggregating resilience across scenarios.
    pub probability: Decimal,
}

impl ScenarioParams {
    /// Parameters with severity clamped into `[0, 1]` and probability
    /// floored at zero.
    #[must_use]
    pub fn new(scenario: Scenario, severity: Decimal, probability: Decimal) -> Self {
        Self {
            scenario,
            severity: severity.clamp(Decimal::ZERO, Decimal::ONE),
            probability: probability.max(Decimal::ZERO),
        }
    }
}

/// Outcome of a single scenario against a baseline opportunity.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioResult {
    scenario: Scenario,
    severity: Decimal,
    /// The overall score after the scenario transform was applied.
    scenario_score: Decimal,
    /// Signed percentage of the baseline score lost; can exceed 100 when
    /// a scenario drives the score negative before clamping.
    impact_percentage: Decimal,
    /// Probability of the opportunity surviving the scenario, in `[0, 100]`.
    survival_probability: Decimal,
    /// How much of the baseline score survives the scenario, in `[0, 100]`.
    resilience: Decimal,
}

impl ScenarioResult {
    pub(crate) fn new(
        scenario: Scenario,
        severity: Decimal,
        scenario_score: Decimal,
        impact_percentage: Decimal,
        survival_probability: Decimal,
        resilience: Decimal,
    ) -> Self {
        Self {
            scenario,
            severity,
            scenario_score,
            impact_percentage,
            survival_probability,
            resilience,
        }
    }

    #[must_use]
    pub fn scenario(&self) -> Scenario {
        self.scenario
    }

    #[must_use]
    pub fn severity(&self) -> Decimal {
        self.severity
    }

    #[must_use]
    pub fn scenario_score(&self) -> Decimal {
        self.scenario_score
    }

    #[must_use]
    pub fn impact_percentage(&self) -> Decimal {
        self.impact_percentage
    }

    #[must_use]
    pub fn survival_probability(&self) -> Decimal {
        self.survival_probability
    }

    #[must_use]
    pub fn resilience(&self) -> Decimal {
        self.resilience
    }
}

/// Terminal artifact of a stress-test run. Never mutated after creation.
#[derive(Debug, Clone, Serialize)]
pub struct StressReport {
    id: Uuid,
    generated_at: DateTime<Utc>,
    baseline: ScoredOpportunity,
    results: Vec<ScenarioResult>,
    overall_resilience: Decimal,
    high_impact_count: usize,
    risk_profile: RiskLevel,
}

impl StressReport {
    pub(crate) fn new(
        baseline: ScoredOpportunity,
        results: Vec<ScenarioResult>,
        overall_resilience: Decimal,
        high_impact_count: usize,
        risk_profile: RiskLevel,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            generated_at: Utc::now(),
            baseline,
            results,
            overall_resilience,
            high_impact_count,
            risk_profile,
        }
    }

    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    #[must_use]
    pub fn generated_at(&self) -> DateTime<Utc> {
        self.generated_at
    }

    /// Snapshot of the opportunity the scenarios were applied to.
    #[must_use]
    pub fn baseline(&self) -> &ScoredOpportunity {
        &self.baseline
    }

    /// Per-scenario results, in the order the scenarios were supplied.
    #[must_use]
    pub fn results(&self) -> &[ScenarioResult] {
        &self.results
    }

    #[must_use]
    pub fn overall_resilience(&self) -> Decimal {
        self.overall_resilience
    }

    /// Number of scenarios whose impact exceeded the high-impact cutoff.
    #[must_use]
    pub fn high_impact_count(&self) -> usize {
        self.high_impact_count
    }

    #[must_use]
    pub fn risk_profile(&self) -> RiskLevel {
        self.risk_profile
    }
}
