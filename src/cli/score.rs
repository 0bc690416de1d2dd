//! Handler for the `score` command.

use nichelord::error::Result;
use nichelord::scoring::ScoringEngine;

use super::output;
use super::{load_metrics, Cli, ScoreArgs};

/// Execute the score command.
pub fn execute(cli: &Cli, args: &ScoreArgs) -> Result<()> {
    let config = cli.load_config()?;
    let file = load_metrics(&args.input)?;

    let engine = ScoringEngine::new(config.scoring);
    let scored = engine.score(file.id.as_str(), &file.metrics);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&scored)?);
        return Ok(());
    }

    output::section(&format!("Opportunity: {}", scored.id()));
    output::key_value("overall score", scored.overall_score());
    output::key_value("competition", format!(
        "{} ({})",
        scored.scores().competition,
        scored.competition_level()
    ));
    output::key_value("profitability", format!(
        "{} ({})",
        scored.scores().profitability,
        scored.profitability_tier()
    ));
    output::key_value("market size", scored.scores().market_size);
    output::key_value("confidence", scored.scores().confidence);
    output::key_value("risk level", output::colored_risk(scored.risk_level()));

    if scored.quality().is_degraded() {
        output::warn(format!(
            "inputs clamped into range: {}",
            scored.quality().clamped_fields().join(", ")
        ));
    } else {
        output::ok("all inputs within range");
    }

    Ok(())
}
