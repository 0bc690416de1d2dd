//! Application configuration loading and validation.
//!
//! Configuration is loaded from a TOML file; every business heuristic the
//! scoring and stress models inherit (weights, thresholds, cutoffs) lives
//! here rather than being baked into the code.

use std::path::Path;

use rust_decimal::Decimal;
use serde::Deserialize;
use tracing_subscriber::{fmt, EnvFilter};

use crate::error::{ConfigError, Result};
use crate::gateway::GatewayConfig;
use crate::scoring::ScoringConfig;
use crate::stress::StressConfig;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub stress: StressConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".into()
}

fn default_log_format() -> String {
    "pretty".into()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load and validate a config file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        let config: Config = toml::from_str(&content).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.scoring.weights.total() != Decimal::ONE {
            return Err(ConfigError::InvalidValue {
                field: "scoring.weights",
                reason: format!("weights must sum to 1, got {}", self.scoring.weights.total()),
            }
            .into());
        }

        let t = &self.scoring.thresholds;
        if t.competition_low_max > t.competition_medium_max {
            return Err(ConfigError::InvalidValue {
                field: "scoring.thresholds",
                reason: "competition_low_max exceeds competition_medium_max".into(),
            }
            .into());
        }
        if t.profitability_medium_min > t.profitability_high_min {
            return Err(ConfigError::InvalidValue {
                field: "scoring.thresholds",
                reason: "profitability_medium_min exceeds profitability_high_min".into(),
            }
            .into());
        }

        if self.gateway.retry.max_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                field: "gateway.retry.max_attempts",
                reason: "at least one attempt is required".into(),
            }
            .into());
        }
        if self.gateway.producer_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "gateway.producer_timeout_secs",
                reason: "timeout must be positive".into(),
            }
            .into());
        }
        if self.gateway.cache.max_entries == 0 {
            return Err(ConfigError::InvalidValue {
                field: "gateway.cache.max_entries",
                reason: "cache capacity must be positive".into(),
            }
            .into());
        }

        let cutoff = self.stress.high_impact_cutoff;
        if cutoff < Decimal::ZERO || cutoff > Decimal::ONE_HUNDRED {
            return Err(ConfigError::InvalidValue {
                field: "stress.high_impact_cutoff",
                reason: format!("cutoff must be within [0, 100], got {cutoff}"),
            }
            .into());
        }

        Ok(())
    }

    pub fn init_logging(&self) {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&self.logging.level));

        match self.logging.format.as_str() {
            "json" => {
                fmt().json().with_env_filter(filter).init();
            }
            _ => {
                fmt().with_env_filter(filter).init();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn default_config_validates() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn parses_a_minimal_config() {
        let config: Config = toml::from_str(
            r#"
            [logging]
            level = "debug"

            [gateway]
            producer_timeout_secs = 5

            [gateway.breaker]
            failure_threshold = 2
            open_timeout_secs = 30

            [gateway.rate_limits.services.trends]
            limit = 10
            period_secs = 60

            [scoring.weights]
            profitability = 0.4
            competition = 0.3
            market_size = 0.2
            confidence = 0.1

            [stress]
            high_impact_cutoff = 50
            "#,
        )
        .unwrap();

        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.gateway.breaker.failure_threshold, 2);
        assert_eq!(config.gateway.rate_limits.services["trends"].limit, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_weights_that_do_not_sum_to_one() {
        let config: Config = toml::from_str(
            r#"
            [scoring.weights]
            profitability = 0.9
            competition = 0.3
            market_size = 0.2
            confidence = 0.1
            "#,
        )
        .unwrap();

        assert!(matches!(
            config.validate(),
            Err(Error::Config(ConfigError::InvalidValue { field, .. })) if field == "scoring.weights"
        ));
    }

    #[test]
    fn rejects_zero_retry_attempts() {
        let config: Config = toml::from_str(
            r#"
            [gateway.retry]
            max_attempts = 0
            "#,
        )
        .unwrap();

        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_inverted_thresholds() {
        let config: Config = toml::from_str(
            r#"
            [scoring.thresholds]
            competition_low_max = 70
            competition_medium_max = 60
            "#,
        )
        .unwrap();

        assert!(config.validate().is_err());
    }
}
