//! Shared helpers for integration tests.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use nichelord::error::BoxError;
use nichelord::gateway::{BreakerConfig, GatewayConfig, RateLimitConfig, RateQuota, RetryConfig};

pub type ProducerFuture<T> = Pin<Box<dyn Future<Output = Result<T, BoxError>> + Send>>;

/// Gateway config tuned for tests: single attempt, tight timeouts, a
/// two-failure breaker, and a generous rate window.
pub fn test_gateway_config() -> GatewayConfig {
    GatewayConfig {
        producer_timeout_secs: 1,
        retry: RetryConfig {
            max_attempts: 1,
            initial_delay_ms: 10,
            backoff_multiplier: 2.0,
            max_delay_ms: 50,
        },
        breaker: BreakerConfig {
            failure_threshold: 2,
            open_timeout_secs: 60,
        },
        rate_limits: RateLimitConfig {
            default: RateQuota {
                limit: 1000,
                period_secs: 60,
            },
            ..Default::default()
        },
        ..Default::default()
    }
}

/// Producer that counts invocations and always succeeds with `value`.
pub fn counting_producer<T>(value: T) -> (Arc<AtomicUsize>, impl Fn() -> ProducerFuture<T>)
where
    T: Clone + Send + Sync + 'static,
{
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let producer = move || {
        let counter = counter.clone();
        let value = value.clone();
        Box::pin(async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(value)
        }) as ProducerFuture<T>
    };
    (calls, producer)
}

/// Producer that counts invocations and always fails.
pub fn failing_producer<T>(
    message: &'static str,
) -> (Arc<AtomicUsize>, impl Fn() -> ProducerFuture<T>)
where
    T: Send + 'static,
{
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let producer = move || {
        let counter = counter.clone();
        Box::pin(async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(message.into())
        }) as ProducerFuture<T>
    };
    (calls, producer)
}

/// Producer gated by a health switch: fails while the switch is down.
pub fn switchable_producer<T>(
    value: T,
) -> (
    Arc<AtomicBool>,
    Arc<AtomicUsize>,
    impl Fn() -> ProducerFuture<T>,
)
where
    T: Clone + Send + Sync + 'static,
{
    let healthy = Arc::new(AtomicBool::new(false));
    let calls = Arc::new(AtomicUsize::new(0));
    let switch = healthy.clone();
    let counter = calls.clone();
    let producer = move || {
        let switch = switch.clone();
        let counter = counter.clone();
        let value = value.clone();
        Box::pin(async move {
            counter.fetch_add(1, Ordering::SeqCst);
            if switch.load(Ordering::SeqCst) {
                Ok(value)
            } else {
                Err("upstream unavailable".into())
            }
        }) as ProducerFuture<T>
    };
    (healthy, calls, producer)
}
