//! Deterministic scenario transforms.
//!
//! Each scenario maps the baseline's numeric scores to perturbed metric
//! inputs, scaled by the scenario severity and amplified by baseline
//! vulnerabilities (a crowded niche saturates harder; an uncrowded one
//! attracts flooding). Every transform is monotone: raising severity never
//! raises any score the overall formula rewards.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::domain::{MetricInputs, NumericScores, Scenario, ScenarioParams};

/// Default severity/probability table, carried over from the source
/// scenario catalog.
#[must_use]
pub fn default_scenarios() -> Vec<ScenarioParams> {
    vec![
        ScenarioParams::new(Scenario::CompetitionIncrease, dec!(0.8), dec!(0.4)),
        ScenarioParams::new(Scenario::TrendReversal, dec!(0.8), dec!(0.25)),
        ScenarioParams::new(Scenario::SeasonalDecline, dec!(0.9), dec!(0.5)),
        ScenarioParams::new(Scenario::MarketSaturation, dec!(0.7), dec!(0.3)),
    ]
}

/// Apply a scenario's transform to baseline scores.
///
/// Perturbed metrics are clamped back into `[0, 100]` here: a synthetic
/// perturbation overshooting the range is expected, not a data-quality
/// event for the scoring engine to flag.
#[must_use]
pub fn apply_scenario(baseline: &NumericScores, params: &ScenarioParams) -> MetricInputs {
    let severity = params.severity.clamp(Decimal::ZERO, Decimal::ONE);
    let mut inputs = MetricInputs::new(
        baseline.competition,
        baseline.profitability,
        baseline.market_size,
        baseline.confidence,
    );

    match params.scenario {
        Scenario::CompetitionIncrease => {
            // Uncrowded niches attract the most new entrants.
            let vulnerability = (Decimal::ONE_HUNDRED - baseline.competition) / Decimal::ONE_HUNDRED;
            inputs.competition += severity * (dec!(30) + dec!(24) * vulnerability);
            inputs.profitability -= severity * dec!(10);
        }
        Scenario::TrendReversal => {
            inputs.profitability -= severity * dec!(35);
            inputs.market_size -= severity * dec!(10);
        }
        Scenario::SeasonalDecline => {
            inputs.profitability -= severity * dec!(25);
            inputs.market_size -= severity * dec!(15);
        }
        Scenario::MarketSaturation => {
            // Already-crowded niches saturate hardest.
            let vulnerability = baseline.competition / Decimal::ONE_HUNDRED;
            inputs.competition += severity * (dec!(20) + dec!(20) * vulnerability);
            inputs.market_size -= severity * dec!(25);
            inputs.profitability -= severity * dec!(8);
        }
    }

    inputs.competition = inputs.competition.clamp(Decimal::ZERO, Decimal::ONE_HUNDRED);
    inputs.profitability = inputs.profitability.clamp(Decimal::ZERO, Decimal::ONE_HUNDRED);
    inputs.market_size = inputs.market_size.clamp(Decimal::ZERO, Decimal::ONE_HUNDRED);
    inputs
}
