//! Gateway-agnostic domain types: identifiers, metric inputs, scores,
//! categorical levels, and stress-test artifacts.

mod id;
mod metrics;
mod opportunity;
mod score;
mod stress;

pub use id::{OpportunityId, ServiceId};
pub use metrics::MetricInputs;
pub use opportunity::{ScoreQuality, ScoredOpportunity};
pub use score::{
    CategoricalLevels, CategoryThresholds, CompetitionLevel, NumericScores, ProfitabilityTier,
    RiskLevel,
};
pub use stress::{Scenario, ScenarioParams, ScenarioResult, StressReport};
