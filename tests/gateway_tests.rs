//! End-to-end tests for the resilient gateway: caching, single-flight,
//! throttling, breaker transitions, and degradation routing.

mod support;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use nichelord::domain::ServiceId;
use nichelord::error::{BoxError, GatewayError};
use nichelord::gateway::{BreakerStateKind, RateLimitConfig, RateQuota, ResilientGateway};

use support::{counting_producer, failing_producer, switchable_producer, test_gateway_config};

const TTL: Duration = Duration::from_secs(60);

fn gateway() -> ResilientGateway {
    ResilientGateway::new(test_gateway_config()).unwrap()
}

#[tokio::test(start_paused = true)]
async fn cache_round_trip_until_ttl_expires() {
    let gateway = gateway();
    let service = ServiceId::from("trends");
    let (calls, producer) = counting_producer(42u32);

    let first: u32 = gateway.fetch(&service, "trends:garden", TTL, &producer).await.unwrap();
    let second: u32 = gateway.fetch(&service, "trends:garden", TTL, &producer).await.unwrap();
    assert_eq!((first, second), (42, 42));
    assert_eq!(calls.load(Ordering::SeqCst), 1, "second read must come from cache");

    tokio::time::advance(TTL + Duration::from_secs(1)).await;

    let third: u32 = gateway.fetch(&service, "trends:garden", TTL, &producer).await.unwrap();
    assert_eq!(third, 42);
    assert_eq!(calls.load(Ordering::SeqCst), 2, "expired entry must refetch");
}

#[tokio::test(start_paused = true)]
async fn concurrent_misses_collapse_into_one_producer_call() {
    let gateway = Arc::new(gateway());
    let service = ServiceId::from("trends");
    let calls = Arc::new(AtomicUsize::new(0));

    let mut handles = Vec::new();
    for _ in 0..8 {
        let gateway = gateway.clone();
        let service = service.clone();
        let calls = calls.clone();
        handles.push(tokio::spawn(async move {
            let producer = move || {
                let calls = calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    // Hold the flight open long enough for every peer to pile up.
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    Ok::<u32, BoxError>(7)
                }
            };
            gateway.fetch(&service, "trends:garden", TTL, producer).await
        }));
    }

    for handle in handles {
        assert_eq!(handle.await.unwrap().unwrap(), 7);
    }
    assert_eq!(calls.load(Ordering::SeqCst), 1, "misses must collapse to one flight");
}

#[tokio::test(start_paused = true)]
async fn breaker_trips_at_threshold_and_rejects_without_producer() {
    let gateway = gateway();
    let service = ServiceId::from("trends");
    let (healthy, calls, producer) = switchable_producer(9u32);

    for _ in 0..2 {
        let result: Result<u32, _> = gateway.fetch(&service, "trends:x", TTL, &producer).await;
        assert!(matches!(result, Err(GatewayError::Upstream { .. })));
    }
    assert_eq!(gateway.breaker_state(&service), BreakerStateKind::Open);
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    // Open circuit: rejected before the producer runs.
    let result: Result<u32, _> = gateway.fetch(&service, "trends:x", TTL, &producer).await;
    assert!(matches!(result, Err(GatewayError::CircuitOpen { .. })));
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    // After the open timeout the single trial goes through and closes it.
    tokio::time::advance(Duration::from_secs(61)).await;
    healthy.store(true, Ordering::SeqCst);
    let value: u32 = gateway.fetch(&service, "trends:x", TTL, &producer).await.unwrap();
    assert_eq!(value, 9);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(gateway.breaker_state(&service), BreakerStateKind::Closed);
}

#[tokio::test(start_paused = true)]
async fn half_open_admits_exactly_one_trial() {
    let gateway = Arc::new(gateway());
    let service = ServiceId::from("trends");

    // Two failures trip the breaker.
    let (_, producer) = failing_producer::<u32>("boom");
    for _ in 0..2 {
        let _: Result<u32, _> = gateway.fetch(&service, "trends:a", TTL, &producer).await;
    }
    assert_eq!(gateway.breaker_state(&service), BreakerStateKind::Open);

    tokio::time::advance(Duration::from_secs(61)).await;

    // First caller wins the trial and blocks inside the producer.
    let trial_gateway = gateway.clone();
    let trial_service = service.clone();
    let trial = tokio::spawn(async move {
        let producer = || async {
            tokio::time::sleep(Duration::from_millis(500)).await;
            Ok::<u32, BoxError>(5)
        };
        trial_gateway
            .fetch(&trial_service, "trends:b", TTL, producer)
            .await
    });
    tokio::task::yield_now().await;
    assert_eq!(gateway.breaker_state(&service), BreakerStateKind::HalfOpen);

    // Second caller is rejected while the trial is in flight.
    let (bystander_calls, bystander) = counting_producer(6u32);
    let rejected: Result<u32, _> = gateway.fetch(&service, "trends:c", TTL, &bystander).await;
    assert!(matches!(rejected, Err(GatewayError::CircuitOpen { .. })));
    assert_eq!(bystander_calls.load(Ordering::SeqCst), 0);

    assert_eq!(trial.await.unwrap().unwrap(), 5);
    assert_eq!(gateway.breaker_state(&service), BreakerStateKind::Closed);
}

#[tokio::test(start_paused = true)]
async fn rate_limit_rejects_with_retry_hint_and_spares_the_breaker() {
    let mut config = test_gateway_config();
    config.rate_limits = RateLimitConfig {
        default: RateQuota {
            limit: 3,
            period_secs: 60,
        },
        ..Default::default()
    };
    let gateway = ResilientGateway::new(config).unwrap();
    let service = ServiceId::from("trends");
    let (calls, producer) = counting_producer(1u32);

    for key in ["k1", "k2", "k3"] {
        let value: u32 = gateway.fetch(&service, key, TTL, &producer).await.unwrap();
        assert_eq!(value, 1);
    }

    let result: Result<u32, _> = gateway.fetch(&service, "k4", TTL, &producer).await;
    match result {
        Err(GatewayError::RateLimitExceeded { retry_after, .. }) => {
            assert!(retry_after <= Duration::from_secs(60));
        }
        other => panic!("expected throttling rejection, got {other:?}"),
    }

    // Throttling is not a failure: breaker stays closed, health flag stays up.
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(gateway.breaker_state(&service), BreakerStateKind::Closed);
    assert!(gateway.router().is_healthy(&service));

    // The window rolls over and admits again.
    tokio::time::advance(Duration::from_secs(61)).await;
    let value: u32 = gateway.fetch(&service, "k5", TTL, &producer).await.unwrap();
    assert_eq!(value, 1);
}

#[tokio::test(start_paused = true)]
async fn producer_timeout_is_an_upstream_failure() {
    let gateway = gateway(); // producer_timeout_secs = 1
    let service = ServiceId::from("trends");
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();

    let producer = move || {
        let counter = counter.clone();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok::<u32, BoxError>(1)
        }
    };

    for _ in 0..2 {
        let result: Result<u32, _> = gateway.fetch(&service, "slow", TTL, &producer).await;
        assert!(matches!(result, Err(GatewayError::Upstream { .. })));
    }

    // Two timeouts count like two thrown failures: the breaker is open.
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(gateway.breaker_state(&service), BreakerStateKind::Open);
}

#[tokio::test(start_paused = true)]
async fn degraded_service_skips_the_producer_until_marked_healthy() {
    let gateway = gateway();
    let service = ServiceId::from("competitors");
    let (healthy, calls, producer) = switchable_producer(11u32);

    // First failure degrades the service and serves the fallback.
    let value: u32 = gateway
        .fetch_with_fallback(&service, "c1", TTL, &producer, || async { Ok(99) })
        .await
        .unwrap();
    assert_eq!(value, 99);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(!gateway.router().is_healthy(&service));

    // Degraded: straight to fallback, producer untouched.
    let value: u32 = gateway
        .fetch_with_fallback(&service, "c2", TTL, &producer, || async { Ok(99) })
        .await
        .unwrap();
    assert_eq!(value, 99);
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    // An external health check restores the primary path.
    healthy.store(true, Ordering::SeqCst);
    gateway.router().mark_healthy(&service);
    let value: u32 = gateway
        .fetch_with_fallback(&service, "c3", TTL, &producer, || async { Ok(99) })
        .await
        .unwrap();
    assert_eq!(value, 11);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn fallback_values_are_served_but_never_cached() {
    let gateway = gateway();
    let service = ServiceId::from("trends");
    let (_, producer) = failing_producer::<u32>("boom");

    let value: u32 = gateway
        .fetch_with_fallback(&service, "fb", TTL, &producer, || async { Ok(77) })
        .await
        .unwrap();
    assert_eq!(value, 77);
    assert!(gateway.cache().get("fb").await.is_none());
}

#[tokio::test(start_paused = true)]
async fn exhausted_fallback_propagates_upstream_error() {
    let gateway = gateway();
    let service = ServiceId::from("trends");
    let (_, producer) = failing_producer::<u32>("boom");

    let result: Result<u32, _> = gateway
        .fetch_with_fallback(&service, "nf", TTL, &producer, || async {
            Err::<u32, BoxError>("stale cache empty too".into())
        })
        .await;

    assert!(matches!(result, Err(GatewayError::Upstream { .. })));
}

#[tokio::test(start_paused = true)]
async fn retries_are_bounded_and_feed_the_breaker() {
    let mut config = test_gateway_config();
    config.retry.max_attempts = 3;
    config.breaker.failure_threshold = 10;
    let gateway = ResilientGateway::new(config).unwrap();
    let service = ServiceId::from("trends");
    let (calls, producer) = failing_producer::<u32>("boom");

    let result: Result<u32, _> = gateway.fetch(&service, "r", TTL, &producer).await;
    assert!(matches!(result, Err(GatewayError::Upstream { .. })));
    assert_eq!(calls.load(Ordering::SeqCst), 3, "exactly max_attempts calls");
}

#[tokio::test(start_paused = true)]
async fn services_have_independent_breakers_and_health() {
    let gateway = gateway();
    let trends = ServiceId::from("trends");
    let competitors = ServiceId::from("competitors");
    let (_, failing) = failing_producer::<u32>("boom");
    let (_, working) = counting_producer(5u32);

    for _ in 0..2 {
        let _: Result<u32, _> = gateway.fetch(&trends, "t", TTL, &failing).await;
    }
    assert_eq!(gateway.breaker_state(&trends), BreakerStateKind::Open);

    let value: u32 = gateway.fetch(&competitors, "c", TTL, &working).await.unwrap();
    assert_eq!(value, 5);
    assert_eq!(gateway.breaker_state(&competitors), BreakerStateKind::Closed);
    assert!(gateway.router().is_healthy(&competitors));
}

#[tokio::test(start_paused = true)]
async fn stats_report_cache_counters_and_service_state() {
    let gateway = gateway();
    let service = ServiceId::from("trends");
    let (_, producer) = counting_producer(3u32);
    let (_, failing) = failing_producer::<u32>("boom");

    let _: u32 = gateway.fetch(&service, "s1", TTL, &producer).await.unwrap();
    let _: u32 = gateway.fetch(&service, "s1", TTL, &producer).await.unwrap();
    let _: Result<u32, _> = gateway
        .fetch(&ServiceId::from("competitors"), "s2", TTL, &failing)
        .await;

    let stats = gateway.stats();
    assert_eq!(stats.cache.hits, 1);
    assert!(stats.cache.misses >= 1);
    assert_eq!(stats.cache.sets, 1);

    let competitors = stats
        .services
        .iter()
        .find(|s| s.service.as_str() == "competitors")
        .expect("competitors row");
    assert!(!competitors.healthy);
    assert_eq!(competitors.consecutive_failures, 1);
}

#[tokio::test(start_paused = true)]
async fn custom_backend_is_honored() {
    use nichelord::gateway::MemoryBackend;

    let backend = Arc::new(MemoryBackend::new(4));
    let gateway = ResilientGateway::with_backend(test_gateway_config(), backend.clone());
    let service = ServiceId::from("trends");
    let (_, producer) = counting_producer(8u32);

    let _: u32 = gateway.fetch(&service, "cb", TTL, &producer).await.unwrap();
    assert_eq!(backend.len(), 1, "value must land in the injected backend");
}

#[tokio::test(start_paused = true)]
async fn gateway_instances_do_not_interfere() {
    let a = gateway();
    let b = gateway();
    let service = ServiceId::from("trends");
    let (_, failing) = failing_producer::<u32>("boom");

    for _ in 0..2 {
        let _: Result<u32, _> = a.fetch(&service, "i", TTL, &failing).await;
    }
    assert_eq!(a.breaker_state(&service), BreakerStateKind::Open);
    assert_eq!(b.breaker_state(&service), BreakerStateKind::Closed);
}
