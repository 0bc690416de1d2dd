//! Stress-test simulator.
//!
//! Applies each scenario's transform to a scored opportunity, re-runs the
//! scoring engine on the perturbed inputs, and aggregates the outcomes
//! into a resilience report. Fully deterministic for a given baseline and
//! scenario list.

mod scenario;

pub use scenario::{apply_scenario, default_scenarios};

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use tracing::debug;

use crate::domain::{RiskLevel, ScenarioParams, ScenarioResult, ScoredOpportunity, StressReport};
use crate::scoring::ScoringEngine;

/// Stress aggregation tuning.
///
/// Like the scoring constants these are inherited business heuristics,
/// kept as configuration.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct StressConfig {
    /// Impact percentage above which a scenario counts as high impact.
    #[serde(default = "default_high_impact_cutoff")]
    pub high_impact_cutoff: Decimal,
    /// Resilience points deducted per high-impact scenario.
    ///
    /// This is how high-impact scenarios weigh more heavily than their
    /// probability alone: each one drags the aggregate down by a fixed
    /// amount, which keeps the aggregate monotone in scenario severity.
    #[serde(default = "default_high_impact_penalty")]
    pub high_impact_penalty: Decimal,
    /// Minimum resilience for a `low` risk profile.
    #[serde(default = "default_risk_low_resilience_min")]
    pub risk_low_resilience_min: Decimal,
    /// Minimum resilience for a `medium` risk profile.
    #[serde(default = "default_risk_medium_resilience_min")]
    pub risk_medium_resilience_min: Decimal,
    /// Minimum resilience for a `high` risk profile.
    #[serde(default = "default_risk_high_resilience_min")]
    pub risk_high_resilience_min: Decimal,
    /// Maximum high-impact scenarios tolerated by the `low` profile.
    #[serde(default = "default_risk_low_max_high_impact")]
    pub risk_low_max_high_impact: usize,
    /// Maximum high-impact scenarios tolerated by the `medium` profile.
    #[serde(default = "default_risk_medium_max_high_impact")]
    pub risk_medium_max_high_impact: usize,
}

fn default_high_impact_cutoff() -> Decimal {
    dec!(50)
}

fn default_high_impact_penalty() -> Decimal {
    dec!(5)
}

fn default_risk_low_resilience_min() -> Decimal {
    dec!(80)
}

fn default_risk_medium_resilience_min() -> Decimal {
    dec!(60)
}

fn default_risk_high_resilience_min() -> Decimal {
    dec!(40)
}

const fn default_risk_low_max_high_impact() -> usize {
    1
}

const fn default_risk_medium_max_high_impact() -> usize {
    3
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            high_impact_cutoff: default_high_impact_cutoff(),
            high_impact_penalty: default_high_impact_penalty(),
            risk_low_resilience_min: default_risk_low_resilience_min(),
            risk_medium_resilience_min: default_risk_medium_resilience_min(),
            risk_high_resilience_min: default_risk_high_resilience_min(),
            risk_low_max_high_impact: default_risk_low_max_high_impact(),
            risk_medium_max_high_impact: default_risk_medium_max_high_impact(),
        }
    }
}

/// Scenario-based stress simulator over a [`ScoringEngine`].
#[derive(Debug, Clone, Default)]
pub struct StressSimulator {
    engine: ScoringEngine,
    config: StressConfig,
}

impl StressSimulator {
    #[must_use]
    pub fn new(engine: ScoringEngine, config: StressConfig) -> Self {
        Self { engine, config }
    }

    /// Run every scenario in `scenarios` against `baseline` and aggregate
    /// the outcomes. Results keep the order of the scenario list.
    #[must_use]
    pub fn run_stress_test(
        &self,
        baseline: &ScoredOpportunity,
        scenarios: &[ScenarioParams],
    ) -> StressReport {
        let baseline_overall = baseline.overall_score();
        let results: Vec<ScenarioResult> = scenarios
            .iter()
            .map(|params| self.run_scenario(baseline, baseline_overall, params))
            .collect();

        let high_impact_count = results
            .iter()
            .filter(|result| result.impact_percentage() > self.config.high_impact_cutoff)
            .count();

        let overall_resilience = self.aggregate_resilience(&results, scenarios, high_impact_count);
        let risk_profile = self.risk_profile(overall_resilience, high_impact_count);

        debug!(
            baseline = %baseline.id(),
            %overall_resilience,
            high_impact_count,
            risk_profile = %risk_profile,
            "stress test complete"
        );

        StressReport::new(
            baseline.clone(),
            results,
            overall_resilience,
            high_impact_count,
            risk_profile,
        )
    }

    fn run_scenario(
        &self,
        baseline: &ScoredOpportunity,
        baseline_overall: Decimal,
        params: &ScenarioParams,
    ) -> ScenarioResult {
        let inputs = apply_scenario(baseline.scores(), params);
        let scored = self.engine.score(baseline.id().clone(), &inputs);
        let scenario_overall = scored.overall_score();

        let (impact, resilience) = if baseline_overall.is_zero() {
            (Decimal::ZERO, Decimal::ZERO)
        } else {
            let impact = ((baseline_overall - scenario_overall) / baseline_overall
                * Decimal::ONE_HUNDRED)
                .round_dp(1);
            let resilience = (scenario_overall / baseline_overall * Decimal::ONE_HUNDRED)
                .min(Decimal::ONE_HUNDRED)
                .round_dp(1);
            (impact, resilience)
        };

        ScenarioResult::new(
            params.scenario,
            params.severity,
            scenario_overall,
            impact,
            survival_probability(scenario_overall),
            resilience,
        )
    }

    /// Probability-weighted mean resilience minus a fixed penalty per
    /// high-impact scenario, floored at zero. With all probabilities at
    /// zero the mean degenerates to unweighted.
    fn aggregate_resilience(
        &self,
        results: &[ScenarioResult],
        scenarios: &[ScenarioParams],
        high_impact_count: usize,
    ) -> Decimal {
        if results.is_empty() {
            return Decimal::ZERO;
        }

        let mut weighted = Decimal::ZERO;
        let mut weight_sum = Decimal::ZERO;
        for (result, params) in results.iter().zip(scenarios) {
            weighted += result.resilience() * params.probability;
            weight_sum += params.probability;
        }

        let base = if weight_sum.is_zero() {
            let total: Decimal = results.iter().map(ScenarioResult::resilience).sum();
            total / Decimal::from(results.len() as u64)
        } else {
            weighted / weight_sum
        };

        let penalty = self.config.high_impact_penalty * Decimal::from(high_impact_count as u64);
        (base - penalty)
            .clamp(Decimal::ZERO, Decimal::ONE_HUNDRED)
            .round_dp(1)
    }

    /// Ordered profile thresholds, first match wins.
    fn risk_profile(&self, resilience: Decimal, high_impact_count: usize) -> RiskLevel {
        if resilience >= self.config.risk_low_resilience_min
            && high_impact_count <= self.config.risk_low_max_high_impact
        {
            RiskLevel::Low
        } else if resilience >= self.config.risk_medium_resilience_min
            && high_impact_count <= self.config.risk_medium_max_high_impact
        {
            RiskLevel::Medium
        } else if resilience >= self.config.risk_high_resilience_min {
            RiskLevel::High
        } else {
            RiskLevel::VeryHigh
        }
    }
}

/// Survival probability as a strictly increasing function of the scenario
/// score: `s * (200 - s) / 100`, bounded to `[0, 100]`.
///
/// Quadratic ease-out: losses near a healthy score barely dent survival,
/// losses near zero are lethal.
#[must_use]
fn survival_probability(scenario_score: Decimal) -> Decimal {
    let s = scenario_score.clamp(Decimal::ZERO, Decimal::ONE_HUNDRED);
    (s * (dec!(200) - s) / Decimal::ONE_HUNDRED).round_dp(2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{MetricInputs, Scenario};

    fn simulator() -> StressSimulator {
        StressSimulator::default()
    }

    fn strong_baseline(simulator: &StressSimulator) -> ScoredOpportunity {
        simulator
            .engine
            .score("strong", &MetricInputs::new(dec!(20), dec!(85), dec!(70), dec!(90)))
    }

    fn weak_baseline(simulator: &StressSimulator) -> ScoredOpportunity {
        simulator
            .engine
            .score("weak", &MetricInputs::new(dec!(85), dec!(25), dec!(20), dec!(30)))
    }

    #[test]
    fn survival_probability_is_strictly_increasing() {
        let mut previous = survival_probability(Decimal::ZERO);
        for step in 1..=20 {
            let current = survival_probability(Decimal::from(step * 5));
            assert!(current > previous, "not increasing at step {step}");
            previous = current;
        }
        assert_eq!(survival_probability(Decimal::ONE_HUNDRED), dec!(100));
        assert_eq!(survival_probability(Decimal::ZERO), Decimal::ZERO);
    }

    #[test]
    fn report_keeps_scenario_order_and_baseline_snapshot() {
        let simulator = simulator();
        let baseline = strong_baseline(&simulator);
        let scenarios = default_scenarios();

        let report = simulator.run_stress_test(&baseline, &scenarios);

        assert_eq!(report.results().len(), scenarios.len());
        for (result, params) in report.results().iter().zip(&scenarios) {
            assert_eq!(result.scenario(), params.scenario);
        }
        assert_eq!(report.baseline().overall_score(), baseline.overall_score());
    }

    #[test]
    fn impact_and_resilience_are_complementary() {
        let simulator = simulator();
        let baseline = strong_baseline(&simulator);

        let report = simulator.run_stress_test(&baseline, &default_scenarios());
        for result in report.results() {
            // Any stress takes the score down, never up.
            assert!(result.impact_percentage() >= Decimal::ZERO, "{}", result.scenario());
            assert!(result.resilience() <= Decimal::ONE_HUNDRED);
            // resilience = 100 - impact while nothing clamps to zero.
            assert_eq!(
                (result.impact_percentage() + result.resilience()).round_dp(0),
                dec!(100),
                "{}",
                result.scenario()
            );
        }
    }

    #[test]
    fn raising_severity_never_raises_resilience() {
        let simulator = simulator();
        let baseline = strong_baseline(&simulator);

        let severities = [dec!(0.2), dec!(0.5), dec!(0.8), dec!(1.0)];
        let mut previous: Option<(Decimal, Decimal)> = None;
        for severity in severities {
            let scenarios: Vec<ScenarioParams> = default_scenarios()
                .into_iter()
                .map(|p| ScenarioParams::new(p.scenario, severity, p.probability))
                .collect();
            let report = simulator.run_stress_test(&baseline, &scenarios);
            let survival = report.results()[0].survival_probability();

            if let Some((prev_resilience, prev_survival)) = previous {
                assert!(report.overall_resilience() <= prev_resilience);
                assert!(survival < prev_survival, "survival must strictly drop");
            }
            previous = Some((report.overall_resilience(), survival));
        }
    }

    #[test]
    fn strong_baseline_outranks_weak_baseline() {
        let simulator = simulator();
        let strong = strong_baseline(&simulator);
        let weak = weak_baseline(&simulator);
        let scenarios = default_scenarios();

        let strong_report = simulator.run_stress_test(&strong, &scenarios);
        let weak_report = simulator.run_stress_test(&weak, &scenarios);

        assert!(strong_report.overall_resilience() > weak_report.overall_resilience());
    }

    #[test]
    fn empty_scenario_list_yields_zero_resilience_report() {
        let simulator = simulator();
        let baseline = strong_baseline(&simulator);

        let report = simulator.run_stress_test(&baseline, &[]);

        assert!(report.results().is_empty());
        assert_eq!(report.overall_resilience(), Decimal::ZERO);
        assert_eq!(report.risk_profile(), RiskLevel::VeryHigh);
        assert_eq!(report.high_impact_count(), 0);
    }

    #[test]
    fn gentle_scenarios_on_a_strong_baseline_profile_low() {
        let simulator = simulator();
        let baseline = strong_baseline(&simulator);
        let scenarios: Vec<ScenarioParams> = Scenario::all()
            .into_iter()
            .map(|s| ScenarioParams::new(s, dec!(0.05), dec!(0.3)))
            .collect();

        let report = simulator.run_stress_test(&baseline, &scenarios);

        assert_eq!(report.high_impact_count(), 0);
        assert_eq!(report.risk_profile(), RiskLevel::Low);
    }

    #[test]
    fn brutal_scenarios_on_a_weak_baseline_profile_very_high() {
        let simulator = simulator();
        let baseline = weak_baseline(&simulator);
        let scenarios: Vec<ScenarioParams> = Scenario::all()
            .into_iter()
            .map(|s| ScenarioParams::new(s, dec!(1.0), dec!(0.5)))
            .collect();

        let report = simulator.run_stress_test(&baseline, &scenarios);

        assert_eq!(report.risk_profile(), RiskLevel::VeryHigh);
        assert!(report.high_impact_count() > 0);
    }

    #[test]
    fn zero_probability_scenarios_fall_back_to_plain_mean() {
        let simulator = simulator();
        let baseline = strong_baseline(&simulator);
        let scenarios = vec![
            ScenarioParams::new(Scenario::TrendReversal, dec!(0.5), Decimal::ZERO),
            ScenarioParams::new(Scenario::SeasonalDecline, dec!(0.5), Decimal::ZERO),
        ];

        let report = simulator.run_stress_test(&baseline, &scenarios);
        assert!(report.overall_resilience() > Decimal::ZERO);
    }
}
