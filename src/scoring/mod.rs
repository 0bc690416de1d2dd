//! Scoring engine: normalized metrics in, scored opportunity out.
//!
//! Pure arithmetic over [`MetricInputs`]; no I/O, no shared state. The
//! engine never rejects dirty numerics - out-of-range inputs are clamped
//! into `[0, 100]`, recorded in the score quality side channel, and logged.

mod profitability;

pub use profitability::{profitability_from_components, ComponentWeights, ProfitabilityComponents};

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use tracing::warn;

use crate::domain::{
    CategoricalLevels, CategoryThresholds, MetricInputs, NumericScores, OpportunityId,
    ScoreQuality, ScoredOpportunity,
};

/// Relative weight of each metric in the overall score.
///
/// Carried over from the source scoring model as configuration; the
/// weights must sum to one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ScoreWeights {
    #[serde(default = "default_profitability_weight")]
    pub profitability: Decimal,
    /// Weight of the inverted competition score (lower competition is
    /// better).
    #[serde(default = "default_competition_weight")]
    pub competition: Decimal,
    #[serde(default = "default_market_size_weight")]
    pub market_size: Decimal,
    #[serde(default = "default_confidence_weight")]
    pub confidence: Decimal,
}

fn default_profitability_weight() -> Decimal {
    dec!(0.4)
}

fn default_competition_weight() -> Decimal {
    dec!(0.3)
}

fn default_market_size_weight() -> Decimal {
    dec!(0.2)
}

fn default_confidence_weight() -> Decimal {
    dec!(0.1)
}

impl ScoreWeights {
    /// Sum of all four weights.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.profitability + self.competition + self.market_size + self.confidence
    }
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            profitability: default_profitability_weight(),
            competition: default_competition_weight(),
            market_size: default_market_size_weight(),
            confidence: default_confidence_weight(),
        }
    }
}

/// Scoring engine configuration: weights, category thresholds, and the
/// component weights for profitability derivation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScoringConfig {
    #[serde(default)]
    pub weights: ScoreWeights,
    #[serde(default)]
    pub thresholds: CategoryThresholds,
    #[serde(default)]
    pub component_weights: ComponentWeights,
}

/// Pure function from assembled market metrics to a scored opportunity.
#[derive(Debug, Clone, Default)]
pub struct ScoringEngine {
    config: ScoringConfig,
}

impl ScoringEngine {
    #[must_use]
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    /// Score one opportunity.
    ///
    /// Out-of-range inputs are clamped, never rejected: a scoring pipeline
    /// that aborts on slightly dirty upstream data is worse than one that
    /// flags low confidence.
    #[must_use]
    pub fn score(&self, id: impl Into<OpportunityId>, inputs: &MetricInputs) -> ScoredOpportunity {
        let id = id.into();
        let mut quality = ScoreQuality::default();
        let scores = NumericScores {
            competition: self.clamp(&id, "competition", inputs.competition, &mut quality),
            profitability: self.clamp(&id, "profitability", inputs.profitability, &mut quality),
            market_size: self.clamp(&id, "market_size", inputs.market_size, &mut quality),
            confidence: self.clamp(&id, "confidence", inputs.confidence, &mut quality),
        };

        let overall = self.overall_score(&scores);
        let levels = CategoricalLevels::derive(&scores, overall, &self.config.thresholds);
        ScoredOpportunity::new(id, scores, overall, levels, quality)
    }

    /// Re-derive the categorical levels for already-clamped scores without
    /// building a new opportunity.
    #[must_use]
    pub fn derive_levels(&self, scores: &NumericScores) -> CategoricalLevels {
        let overall = self.overall_score(scores);
        CategoricalLevels::derive(scores, overall, &self.config.thresholds)
    }

    /// Weighted overall score, rounded to two decimals.
    #[must_use]
    pub fn overall_score(&self, scores: &NumericScores) -> Decimal {
        let w = &self.config.weights;
        let inverted_competition = Decimal::ONE_HUNDRED - scores.competition;
        let weighted = scores.profitability * w.profitability
            + inverted_competition * w.competition
            + scores.market_size * w.market_size
            + scores.confidence * w.confidence;
        weighted.round_dp(2)
    }

    /// Derive a profitability score from optional component metrics, using
    /// the configured component weights.
    #[must_use]
    pub fn profitability(&self, components: &ProfitabilityComponents) -> Option<Decimal> {
        profitability_from_components(components, &self.config.component_weights)
    }

    /// The engine's configuration.
    #[must_use]
    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    fn clamp(
        &self,
        id: &OpportunityId,
        field: &'static str,
        value: Decimal,
        quality: &mut ScoreQuality,
    ) -> Decimal {
        if value < Decimal::ZERO {
            warn!(opportunity = %id, field, %value, "metric below range, clamping to 0");
            quality.record_clamp(field);
            Decimal::ZERO
        } else if value > Decimal::ONE_HUNDRED {
            warn!(opportunity = %id, field, %value, "metric above range, clamping to 100");
            quality.record_clamp(field);
            Decimal::ONE_HUNDRED
        } else {
            value
        }
    }
}
