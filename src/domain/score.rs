//! Numeric scores and the categorical levels derived from them.
//!
//! Categorical levels are sum types with total, ordered-threshold mapping
//! functions: every level is a pure function of the numeric scores and the
//! configured thresholds, and can be re-derived at any time without
//! re-scoring.

use std::fmt;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// The four numeric scores of an opportunity, each guaranteed in `[0, 100]`.
///
/// Constructed by the scoring engine after clamping; plain metric bundles
/// that have not been validated yet live in
/// [`crate::domain::MetricInputs`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NumericScores {
    pub competition: Decimal,
    pub profitability: Decimal,
    pub market_size: Decimal,
    pub confidence: Decimal,
}

/// How crowded the niche is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompetitionLevel {
    Low,
    Medium,
    High,
}

impl CompetitionLevel {
    /// Map a competition score to its level. Ordered thresholds, first
    /// match wins; both cutoffs are inclusive on the lower side.
    #[must_use]
    pub fn from_score(score: Decimal, thresholds: &CategoryThresholds) -> Self {
        if score <= thresholds.competition_low_max {
            Self::Low
        } else if score <= thresholds.competition_medium_max {
            Self::Medium
        } else {
            Self::High
        }
    }
}

impl fmt::Display for CompetitionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
        }
    }
}

/// How profitable the niche looks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfitabilityTier {
    Low,
    Medium,
    High,
}

impl ProfitabilityTier {
    /// Map a profitability score to its tier.
    #[must_use]
    pub fn from_score(score: Decimal, thresholds: &CategoryThresholds) -> Self {
        if score >= thresholds.profitability_high_min {
            Self::High
        } else if score >= thresholds.profitability_medium_min {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

impl fmt::Display for ProfitabilityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
        }
    }
}

/// Overall risk classification, also used as the stress-test risk profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    VeryHigh,
}

impl RiskLevel {
    /// Derive the risk level from the numeric scores, the already-derived
    /// profitability tier, and the overall score. Ordered rules, first
    /// match wins.
    #[must_use]
    pub fn from_scores(
        scores: &NumericScores,
        tier: ProfitabilityTier,
        overall: Decimal,
        thresholds: &CategoryThresholds,
    ) -> Self {
        if scores.competition <= thresholds.competition_low_max
            && scores.confidence >= thresholds.risk_low_confidence_min
            && tier == ProfitabilityTier::High
        {
            Self::Low
        } else if scores.competition <= thresholds.competition_medium_max
            && scores.confidence >= thresholds.risk_medium_confidence_min
            && matches!(tier, ProfitabilityTier::High | ProfitabilityTier::Medium)
        {
            Self::Medium
        } else if overall >= thresholds.risk_high_overall_min {
            Self::High
        } else {
            Self::VeryHigh
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
            Self::VeryHigh => write!(f, "very_high"),
        }
    }
}

/// The three categorical levels of a scored opportunity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CategoricalLevels {
    pub competition_level: CompetitionLevel,
    pub profitability_tier: ProfitabilityTier,
    pub risk_level: RiskLevel,
}

impl CategoricalLevels {
    /// Derive all three levels from numeric scores and the overall score.
    ///
    /// Total over the whole input space; categorical fields are never set
    /// any other way.
    #[must_use]
    pub fn derive(
        scores: &NumericScores,
        overall: Decimal,
        thresholds: &CategoryThresholds,
    ) -> Self {
        let competition_level = CompetitionLevel::from_score(scores.competition, thresholds);
        let profitability_tier = ProfitabilityTier::from_score(scores.profitability, thresholds);
        let risk_level = RiskLevel::from_scores(scores, profitability_tier, overall, thresholds);
        Self {
            competition_level,
            profitability_tier,
            risk_level,
        }
    }
}

/// Threshold constants for categorical derivation.
///
/// These are unexplained business heuristics carried over from the source
/// scoring model; they are configuration, not structural invariants.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CategoryThresholds {
    /// Competition scores at or below this are `low`.
    #[serde(default = "default_competition_low_max")]
    pub competition_low_max: Decimal,
    /// Competition scores at or below this (and above the low cutoff) are `medium`.
    #[serde(default = "default_competition_medium_max")]
    pub competition_medium_max: Decimal,
    /// Profitability scores at or above this are tier `high`.
    #[serde(default = "default_profitability_high_min")]
    pub profitability_high_min: Decimal,
    /// Profitability scores at or above this (and below the high cutoff) are tier `medium`.
    #[serde(default = "default_profitability_medium_min")]
    pub profitability_medium_min: Decimal,
    /// Minimum confidence for the low-risk rule.
    #[serde(default = "default_risk_low_confidence_min")]
    pub risk_low_confidence_min: Decimal,
    /// Minimum confidence for the medium-risk rule.
    #[serde(default = "default_risk_medium_confidence_min")]
    pub risk_medium_confidence_min: Decimal,
    /// Minimum overall score separating `high` risk from `very_high`.
    #[serde(default = "default_risk_high_overall_min")]
    pub risk_high_overall_min: Decimal,
}

fn default_competition_low_max() -> Decimal {
    dec!(30)
}

fn default_competition_medium_max() -> Decimal {
    dec!(60)
}

fn default_profitability_high_min() -> Decimal {
    dec!(80)
}

fn default_profitability_medium_min() -> Decimal {
    dec!(60)
}

fn default_risk_low_confidence_min() -> Decimal {
    dec!(80)
}

fn default_risk_medium_confidence_min() -> Decimal {
    dec!(60)
}

fn default_risk_high_overall_min() -> Decimal {
    dec!(40)
}

impl Default for CategoryThresholds {
    fn default() -> Self {
        Self {
            competition_low_max: default_competition_low_max(),
            competition_medium_max: default_competition_medium_max(),
            profitability_high_min: default_profitability_high_min(),
            profitability_medium_min: default_profitability_medium_min(),
            risk_low_confidence_min: default_risk_low_confidence_min(),
            risk_medium_confidence_min: default_risk_medium_confidence_min(),
            risk_high_overall_min: default_risk_high_overall_min(),
        }
    }
}
