//! Engine-level behavior of the exchange-rate cache and fallback path.
//!
//! These tests drive the public `FareEngine` API with a scripted rate source
//! and an explicit clock, covering the properties the module-level unit tests
//! cannot see: fetch counting across calls, TTL expiry, and the
//! no-negative-caching rule.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use panaride_lib::fare::RATE_CACHE_TTL;
use panaride_lib::{
    Currency, Error, FareConfig, FareEngine, FareOptions, RateSource, Result,
};

struct Inner {
    responses: Mutex<VecDeque<Result<f64>>>,
    calls: AtomicUsize,
}

/// Rate source that replays a scripted sequence of outcomes and counts calls.
#[derive(Clone)]
struct ScriptedSource {
    inner: Arc<Inner>,
}

impl ScriptedSource {
    fn new(responses: Vec<Result<f64>>) -> Self {
        Self {
            inner: Arc::new(Inner {
                responses: Mutex::new(responses.into()),
                calls: AtomicUsize::new(0),
            }),
        }
    }

    fn calls(&self) -> usize {
        self.inner.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RateSource for ScriptedSource {
    async fn fetch_rate(&self) -> Result<f64> {
        self.inner.calls.fetch_add(1, Ordering::SeqCst);
        self.inner
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(Error::RateSourceMissingField))
    }
}

fn engine_with(source: &ScriptedSource) -> FareEngine {
    FareEngine::new(FareConfig::default(), Box::new(source.clone()))
}

#[tokio::test]
async fn second_usd_call_within_ttl_reuses_cached_rate() {
    // The second scripted response is a failure: if the cache were bypassed
    // the second call would fall back instead of returning 36.5.
    let source = ScriptedSource::new(vec![
        Ok(36.5),
        Err(Error::RateSourceStatus { status: 503 }),
    ]);
    let mut engine = engine_with(&source);

    let t0 = Instant::now();
    let first = engine
        .calculate_at(20.0, 60.0, FareOptions::in_currency(Currency::Usd), t0)
        .await;
    assert_eq!(first.exchange_rate, Some(36.5));
    assert_eq!(first.used_fallback_rate, Some(false));
    assert_eq!(source.calls(), 1);

    let t1 = t0 + Duration::from_secs(30 * 60);
    let second = engine
        .calculate_at(5.0, 15.0, FareOptions::in_currency(Currency::Usd), t1)
        .await;
    assert_eq!(second.exchange_rate, Some(36.5));
    assert_eq!(second.used_fallback_rate, Some(false));
    assert_eq!(source.calls(), 1, "cache hit must not refetch");
}

#[tokio::test]
async fn expired_cache_triggers_a_refetch() {
    let source = ScriptedSource::new(vec![Ok(36.5), Ok(37.25)]);
    let mut engine = engine_with(&source);

    let t0 = Instant::now();
    let quote = engine.exchange_rate_at(t0).await;
    assert_eq!(quote.rate, 36.5);

    let after_ttl = t0 + RATE_CACHE_TTL + Duration::from_secs(1);
    let quote = engine.exchange_rate_at(after_ttl).await;
    assert_eq!(quote.rate, 37.25);
    assert_eq!(source.calls(), 2);
}

#[tokio::test]
async fn fetch_failure_falls_back_without_poisoning_the_cache() {
    let source = ScriptedSource::new(vec![
        Err(Error::RateSourceStatus { status: 500 }),
        Ok(36.0),
    ]);
    let mut engine = engine_with(&source);

    let t0 = Instant::now();
    let fare = engine
        .calculate_at(15.0, 45.0, FareOptions::in_currency(Currency::Usd), t0)
        .await;

    // The breakdown stays valid, priced at the configured fallback rate.
    assert_eq!(fare.amount_bs, 55.50);
    assert_eq!(fare.exchange_rate, Some(45.0));
    assert_eq!(fare.amount_usd, Some(1.23));
    assert_eq!(fare.used_fallback_rate, Some(true));

    // No negative caching: the very next call retries the source even though
    // the previous attempt just failed.
    let t1 = t0 + Duration::from_secs(1);
    let quote = engine.exchange_rate_at(t1).await;
    assert_eq!(quote.rate, 36.0);
    assert!(!quote.used_fallback);
    assert_eq!(source.calls(), 2);
}

#[tokio::test]
async fn local_currency_never_consults_the_source() {
    let source = ScriptedSource::new(vec![Ok(36.5)]);
    let mut engine = engine_with(&source);

    for _ in 0..3 {
        let fare = engine.calculate(10.0, 30.0, FareOptions::default()).await;
        assert_eq!(fare.currency, Currency::Bs);
        assert!(fare.amount_usd.is_none());
    }

    assert_eq!(source.calls(), 0);
}
