//! Handler for the `stress` command.

use tabled::{Table, Tabled};

use nichelord::domain::ScenarioParams;
use nichelord::error::Result;
use nichelord::scoring::ScoringEngine;
use nichelord::stress::{default_scenarios, StressSimulator};

use super::output;
use super::{load_metrics, Cli, StressArgs};

#[derive(Tabled)]
struct ScenarioRow {
    #[tabled(rename = "scenario")]
    scenario: String,
    #[tabled(rename = "severity")]
    severity: String,
    #[tabled(rename = "score")]
    score: String,
    #[tabled(rename = "impact %")]
    impact: String,
    #[tabled(rename = "survival %")]
    survival: String,
    #[tabled(rename = "resilience")]
    resilience: String,
}

/// Execute the stress command.
pub fn execute(cli: &Cli, args: &StressArgs) -> Result<()> {
    let config = cli.load_config()?;
    let file = load_metrics(&args.input)?;

    let engine = ScoringEngine::new(config.scoring);
    let baseline = engine.score(file.id.as_str(), &file.metrics);

    let mut scenarios = default_scenarios();
    if let Some(severity) = args.severity {
        scenarios = scenarios
            .into_iter()
            .map(|p| ScenarioParams::new(p.scenario, severity, p.probability))
            .collect();
    }

    let simulator = StressSimulator::new(engine, config.stress);
    let report = simulator.run_stress_test(&baseline, &scenarios);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    output::section(&format!(
        "Stress report for {} (baseline {})",
        report.baseline().id(),
        report.baseline().overall_score()
    ));

    let rows: Vec<ScenarioRow> = report
        .results()
        .iter()
        .map(|result| ScenarioRow {
            scenario: result.scenario().to_string(),
            severity: result.severity().to_string(),
            score: result.scenario_score().to_string(),
            impact: result.impact_percentage().to_string(),
            survival: result.survival_probability().to_string(),
            resilience: result.resilience().to_string(),
        })
        .collect();
    println!("{}", Table::new(rows));

    output::key_value("overall resilience", report.overall_resilience());
    output::key_value("high-impact count", report.high_impact_count());
    output::key_value("risk profile", output::colored_risk(report.risk_profile()));

    Ok(())
}
