//! Handler for the `demo` command.
//!
//! Drives the gateway against a simulated flaky upstream so an operator
//! can watch caching, throttling, breaker trips, and degradation without
//! real credentials.

use std::time::Duration;

use rand::Rng;
use tabled::{Table, Tabled};

use nichelord::domain::{MetricInputs, ServiceId};
use nichelord::error::{BoxError, Error, GatewayError, Result};
use nichelord::gateway::ResilientGateway;

use super::output;
use super::{Cli, DemoArgs};

const DEMO_KEYS: [&str; 3] = ["garden-planners", "dog-training", "keto-cookbooks"];

#[derive(Tabled)]
struct ServiceRow {
    #[tabled(rename = "service")]
    service: String,
    #[tabled(rename = "healthy")]
    healthy: bool,
    #[tabled(rename = "failures")]
    failures: u32,
    #[tabled(rename = "breaker")]
    breaker: String,
}

fn fake_metrics() -> MetricInputs {
    let mut rng = rand::thread_rng();
    MetricInputs::new(
        rng.gen_range(10..90).into(),
        rng.gen_range(20..95).into(),
        rng.gen_range(20..90).into(),
        rng.gen_range(40..95).into(),
    )
}

async fn flaky_producer() -> std::result::Result<MetricInputs, BoxError> {
    if rand::thread_rng().gen_bool(0.4) {
        return Err("upstream returned 503".into());
    }
    Ok(fake_metrics())
}

/// Execute the demo command.
pub async fn execute(cli: &Cli, args: &DemoArgs) -> Result<()> {
    let config = cli.load_config()?;
    config.init_logging();
    let gateway =
        ResilientGateway::new(config.gateway).map_err(|e| Error::Gateway(e.into()))?;
    let service = ServiceId::from("demo-signals");
    let ttl = Duration::from_secs(args.ttl_secs);

    output::section("Gateway demo: flaky upstream");
    for round in 0..args.rounds {
        let key = DEMO_KEYS[round % DEMO_KEYS.len()];
        let cache_key = format!("demo:trends:{key}");

        let result = gateway
            .fetch_with_fallback(&service, &cache_key, ttl, flaky_producer, || async {
                Ok(MetricInputs::new(50.into(), 50.into(), 50.into(), 20.into()))
            })
            .await;

        match result {
            Ok(metrics) => output::ok(format!(
                "{key}: competition={} profitability={}",
                metrics.competition, metrics.profitability
            )),
            Err(GatewayError::RateLimitExceeded { retry_after, .. }) => {
                output::warn(format!("{key}: throttled, retry in {retry_after:?}"))
            }
            Err(error) => output::warn(format!("{key}: {error}")),
        }

        // An external health check would do this; here the operator is it.
        if round == args.rounds / 2 {
            gateway.router().mark_healthy(&service);
        }
    }

    let stats = gateway.stats();
    output::section("Gateway stats");
    output::key_value("cache hits", stats.cache.hits);
    output::key_value("cache misses", stats.cache.misses);
    output::key_value("cache sets", stats.cache.sets);

    let rows: Vec<ServiceRow> = stats
        .services
        .into_iter()
        .map(|s| ServiceRow {
            service: s.service.to_string(),
            healthy: s.healthy,
            failures: s.consecutive_failures,
            breaker: s.breaker.to_string(),
        })
        .collect();
    if !rows.is_empty() {
        println!("{}", Table::new(rows));
    }

    Ok(())
}
