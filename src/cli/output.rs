//! Shared CLI output helpers for consistent operator-facing text.

use std::fmt::Display;

use owo_colors::OwoColorize;

use nichelord::domain::RiskLevel;

const RULE_WIDTH: usize = 56;

/// Print a section header and separator.
pub fn section(title: &str) {
    println!();
    println!("{title}");
    println!("{}", "─".repeat(RULE_WIDTH));
}

/// Print a simple key/value line.
pub fn key_value(label: &str, value: impl Display) {
    println!("{label:<18} {value}");
}

/// Print a successful status line.
pub fn ok(message: impl Display) {
    println!("{} {message}", "✓".green());
}

/// Print a warning status line.
pub fn warn(message: impl Display) {
    println!("{} {message}", "⚠".yellow());
}

/// Color a risk level for terminal display.
pub fn colored_risk(level: RiskLevel) -> String {
    match level {
        RiskLevel::Low => level.to_string().green().to_string(),
        RiskLevel::Medium => level.to_string().yellow().to_string(),
        RiskLevel::High => level.to_string().red().to_string(),
        RiskLevel::VeryHigh => level.to_string().bright_red().bold().to_string(),
    }
}
