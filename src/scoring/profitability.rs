//! Profitability derivation from component metrics.
//!
//! Callers that already hold a profitability score feed it straight into
//! [`crate::domain::MetricInputs`]; callers sitting on raw component
//! signals (trend strength, competition pressure, market size,
//! seasonality, content gaps) derive one here. Missing components drop
//! out and the remaining weights renormalize, so a partial signal set
//! still yields a usable score.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Optional component metrics, each nominally in `[0, 100]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfitabilityComponents {
    /// Strength of the demand trend behind the niche.
    pub trend_strength: Option<Decimal>,
    /// Competitive headroom: how *favorable* the competitive landscape is
    /// (higher = less crowded).
    pub competition_headroom: Option<Decimal>,
    /// Size of the addressable market.
    pub market_size: Option<Decimal>,
    /// Stability across the year (higher = less seasonal).
    pub seasonality: Option<Decimal>,
    /// How underserved the niche's content demand is.
    pub content_gaps: Option<Decimal>,
}

/// Relative weight of each profitability component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ComponentWeights {
    #[serde(default = "default_trend_strength_weight")]
    pub trend_strength: Decimal,
    #[serde(default = "default_competition_headroom_weight")]
    pub competition_headroom: Decimal,
    #[serde(default = "default_market_size_weight")]
    pub market_size: Decimal,
    #[serde(default = "default_seasonality_weight")]
    pub seasonality: Decimal,
    #[serde(default = "default_content_gaps_weight")]
    pub content_gaps: Decimal,
}

fn default_trend_strength_weight() -> Decimal {
    dec!(0.25)
}

fn default_competition_headroom_weight() -> Decimal {
    dec!(0.30)
}

fn default_market_size_weight() -> Decimal {
    dec!(0.20)
}

fn default_seasonality_weight() -> Decimal {
    dec!(0.15)
}

fn default_content_gaps_weight() -> Decimal {
    dec!(0.10)
}

impl Default for ComponentWeights {
    fn default() -> Self {
        Self {
            trend_strength: default_trend_strength_weight(),
            competition_headroom: default_competition_headroom_weight(),
            market_size: default_market_size_weight(),
            seasonality: default_seasonality_weight(),
            content_gaps: default_content_gaps_weight(),
        }
    }
}

/// Weighted mean over the components present, renormalized so absent
/// components do not drag the score down. Returns `None` when no
/// component is present at all.
#[must_use]
pub fn profitability_from_components(
    components: &ProfitabilityComponents,
    weights: &ComponentWeights,
) -> Option<Decimal> {
    let pairs = [
        (components.trend_strength, weights.trend_strength),
        (components.competition_headroom, weights.competition_headroom),
        (components.market_size, weights.market_size),
        (components.seasonality, weights.seasonality),
        (components.content_gaps, weights.content_gaps),
    ];

    let mut weighted = Decimal::ZERO;
    let mut weight_sum = Decimal::ZERO;
    for (component, weight) in pairs {
        if let Some(value) = component {
            let value = value.clamp(Decimal::ZERO, Decimal::ONE_HUNDRED);
            weighted += value * weight;
            weight_sum += weight;
        }
    }

    if weight_sum.is_zero() {
        return None;
    }
    Some((weighted / weight_sum).round_dp(2))
}
