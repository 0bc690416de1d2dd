//! Scored opportunity type.
//!
//! A `ScoredOpportunity` is produced by the scoring engine and never
//! mutated afterwards; re-scoring produces a fresh value. The categorical
//! levels are always the pure derivation of the numeric scores captured at
//! construction time.

use rust_decimal::Decimal;
use serde::Serialize;

use super::id::OpportunityId;
use super::score::{CategoricalLevels, CompetitionLevel, NumericScores, ProfitabilityTier, RiskLevel};

/// Side channel recording which inputs had to be clamped into `[0, 100]`.
///
/// A clamp never aborts scoring; it only lowers trust in the result, and
/// this record is how callers observe that.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScoreQuality {
    clamped_fields: Vec<&'static str>,
}

impl ScoreQuality {
    pub(crate) fn record_clamp(&mut self, field: &'static str) {
        self.clamped_fields.push(field);
    }

    /// Names of the inputs that were out of range and got clamped.
    #[must_use]
    pub fn clamped_fields(&self) -> &[&'static str] {
        &self.clamped_fields
    }

    /// True if any input had to be clamped.
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        !self.clamped_fields.is_empty()
    }
}

/// An opportunity with its numeric scores, derived categorical levels, and
/// overall score.
///
/// Constructed only by [`crate::scoring::ScoringEngine::score`]; immutable
/// after creation.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredOpportunity {
    id: OpportunityId,
    scores: NumericScores,
    overall_score: Decimal,
    levels: CategoricalLevels,
    quality: ScoreQuality,
}

impl ScoredOpportunity {
    pub(crate) fn new(
        id: OpportunityId,
        scores: NumericScores,
        overall_score: Decimal,
        levels: CategoricalLevels,
        quality: ScoreQuality,
    ) -> Self {
        Self {
            id,
            scores,
            overall_score,
            levels,
            quality,
        }
    }

    /// Get the opportunity ID.
    #[must_use]
    pub fn id(&self) -> &OpportunityId {
        &self.id
    }

    /// Get the clamped numeric scores.
    #[must_use]
    pub fn scores(&self) -> &NumericScores {
        &self.scores
    }

    /// Get the overall score in `[0, 100]`, rounded to two decimals.
    #[must_use]
    pub fn overall_score(&self) -> Decimal {
        self.overall_score
    }

    /// Get all three categorical levels.
    #[must_use]
    pub fn levels(&self) -> &CategoricalLevels {
        &self.levels
    }

    /// Get the competition level.
    #[must_use]
    pub fn competition_level(&self) -> CompetitionLevel {
        self.levels.competition_level
    }

    /// Get the profitability tier.
    #[must_use]
    pub fn profitability_tier(&self) -> ProfitabilityTier {
        self.levels.profitability_tier
    }

    /// Get the risk level.
    #[must_use]
    pub fn risk_level(&self) -> RiskLevel {
        self.levels.risk_level
    }

    /// Get the clamp side channel.
    #[must_use]
    pub fn quality(&self) -> &ScoreQuality {
        &self.quality
    }
}
