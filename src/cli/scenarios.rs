//! Handler for the `scenarios` command.

use tabled::{Table, Tabled};

use nichelord::error::Result;
use nichelord::stress::default_scenarios;

#[derive(Tabled)]
struct Row {
    #[tabled(rename = "scenario")]
    scenario: String,
    #[tabled(rename = "severity")]
    severity: String,
    #[tabled(rename = "probability")]
    probability: String,
    #[tabled(rename = "description")]
    description: &'static str,
}

/// Execute the scenarios command.
pub fn execute() -> Result<()> {
    let rows: Vec<Row> = default_scenarios()
        .into_iter()
        .map(|params| Row {
            scenario: params.scenario.to_string(),
            severity: params.severity.to_string(),
            probability: params.probability.to_string(),
            description: params.scenario.description(),
        })
        .collect();
    println!("{}", Table::new(rows));
    Ok(())
}
