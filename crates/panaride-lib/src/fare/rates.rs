//! Exchange-rate acquisition and caching.
//!
//! The engine needs exactly one external number: the current BS/USD rate
//! published by the BCV, served by DolarAPI. That fetch is wrapped behind the
//! [`RateSource`] trait so tests can inject a scripted source, and the last
//! successful value is kept in an explicit [`RateCache`] with a hard one-hour
//! TTL. Failures are never cached: every call after expiry retries the fetch.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::{Error, Result};

/// Well-known DolarAPI endpoint for the official BCV rate.
pub const DOLAR_API_URL: &str = "https://ve.dolarapi.com/v1/dolares/oficial";

/// Descriptive label attached to USD fare breakdowns.
pub const RATE_SOURCE_LABEL: &str = "DolarAPI (BCV Oficial)";

/// How long a fetched rate stays trusted.
pub const RATE_CACHE_TTL: Duration = Duration::from_secs(60 * 60);

/// Upper bound on a single rate fetch. A hung fetch would otherwise stall
/// the calling request indefinitely.
pub const RATE_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// An exchange rate together with its provenance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateQuote {
    /// Bolívars per US dollar.
    pub rate: f64,
    /// True when the configured fallback rate was used because the live
    /// source was unavailable.
    pub used_fallback: bool,
}

/// Last-value cache for the exchange rate.
///
/// Owned by exactly one [`FareEngine`](super::FareEngine); calls against one
/// engine are serialized by the surrounding dispatch layer, so no internal
/// locking is needed.
#[derive(Debug)]
pub struct RateCache {
    entry: Option<(f64, Instant)>,
    ttl: Duration,
}

impl RateCache {
    pub fn new(ttl: Duration) -> Self {
        Self { entry: None, ttl }
    }

    /// Return the cached rate if it is still within its TTL.
    pub fn get(&self, now: Instant) -> Option<f64> {
        self.entry
            .and_then(|(rate, fetched_at)| (now.duration_since(fetched_at) < self.ttl).then_some(rate))
    }

    /// Replace the cached entry with a freshly fetched rate.
    pub fn store(&mut self, rate: f64, now: Instant) {
        self.entry = Some((rate, now));
    }
}

impl Default for RateCache {
    fn default() -> Self {
        Self::new(RATE_CACHE_TTL)
    }
}

/// A source of the current BS/USD exchange rate.
#[async_trait]
pub trait RateSource: Send + Sync {
    /// Fetch the current rate. Any transport, status, or shape problem is an
    /// error; the caller decides whether to fall back.
    async fn fetch_rate(&self) -> Result<f64>;
}

/// Wire shape of the DolarAPI response. `promedio` is the published average
/// and is preferred; `venta` (sell) is the fallback field.
#[derive(Debug, Deserialize)]
struct DolarApiQuote {
    promedio: Option<f64>,
    venta: Option<f64>,
}

/// Production rate source backed by DolarAPI.
#[derive(Debug, Clone)]
pub struct DolarApiSource {
    client: reqwest::Client,
    url: String,
}

impl DolarApiSource {
    /// Build a source against the well-known DolarAPI endpoint.
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(RATE_FETCH_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            url: DOLAR_API_URL.to_string(),
        })
    }

    /// Build a source against an alternative endpoint (tests, mirrors).
    pub fn with_url(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl RateSource for DolarApiSource {
    async fn fetch_rate(&self) -> Result<f64> {
        let response = self.client.get(&self.url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::RateSourceStatus {
                status: status.as_u16(),
            });
        }

        let quote: DolarApiQuote = response.json().await?;
        quote
            .promedio
            .or(quote.venta)
            .ok_or(Error::RateSourceMissingField)
    }
}
