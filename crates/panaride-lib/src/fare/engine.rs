//! Fare calculation pipeline and platform commission split.

use std::time::Instant;

use serde::Serialize;
use tracing::warn;

use crate::round2;

use super::config::FareConfig;
use super::rates::{RateCache, RateQuote, RateSource, RATE_SOURCE_LABEL};

/// Reference fuel price baked into the surcharge model. Only the excess of
/// the configured fuel price over this value is surcharged.
pub const FUEL_REFERENCE_PRICE: f64 = 0.50;

/// Bolívars charged per unit of fuel-price excess.
const FUEL_SURCHARGE_FACTOR: f64 = 10.0;

/// Default platform commission rate for [`calculate_commission`].
pub const DEFAULT_COMMISSION_RATE: f64 = 0.15;

/// Currency a fare is quoted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, serde::Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
pub enum Currency {
    /// Venezuelan bolívar, the local pricing currency.
    #[default]
    #[serde(rename = "BS")]
    Bs,
    /// US dollar, converted at the live or fallback rate.
    #[serde(rename = "USD")]
    Usd,
}

/// Options recognized by [`FareEngine::calculate`].
#[derive(Debug, Clone, Copy, PartialEq, serde::Deserialize)]
pub struct FareOptions {
    #[serde(default)]
    pub currency: Currency,
    /// Demand multiplier applied before the minimum-fare floor.
    #[serde(default = "default_surge")]
    pub surge_multiplier: f64,
    #[serde(default = "default_true")]
    pub apply_fuel_surcharge: bool,
}

fn default_surge() -> f64 {
    1.0
}

fn default_true() -> bool {
    true
}

impl Default for FareOptions {
    fn default() -> Self {
        Self {
            currency: Currency::Bs,
            surge_multiplier: 1.0,
            apply_fuel_surcharge: true,
        }
    }
}

impl FareOptions {
    pub fn in_currency(currency: Currency) -> Self {
        Self {
            currency,
            ..Self::default()
        }
    }
}

/// Raw pricing components of a fare.
///
/// These are the pre-surge, pre-floor inputs kept for transparency: they do
/// NOT sum to [`FareBreakdown::amount_bs`] when the surge multiplier is not
/// 1.0 or the minimum-fare floor was applied. Callers must not expect the
/// fields to reconcile with the total.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BreakdownComponents {
    pub base_fare: f64,
    pub distance_charge: f64,
    pub time_charge: f64,
    pub surge_multiplier: f64,
    pub fuel_surcharge: f64,
}

/// A priced trip, built fresh on every [`FareEngine::calculate`] call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FareBreakdown {
    /// Final fare in bolívars, floored at `min_fare` and rounded to 2 decimals.
    pub amount_bs: f64,
    pub currency: Currency,
    pub breakdown: BreakdownComponents,
    /// Converted amount, present only for USD quotes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount_usd: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exchange_rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exchange_rate_source: Option<String>,
    /// True when the configured fallback rate priced this quote because the
    /// live source was unavailable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub used_fallback_rate: Option<bool>,
}

/// Platform/driver split of a fare amount.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CommissionBreakdown {
    pub total_fare: f64,
    pub platform_commission: f64,
    pub driver_earnings: f64,
    pub commission_rate: f64,
}

/// Split a fare between the platform and the driver.
///
/// `commission_rate` is not checked against [0, 1]; out-of-range values
/// propagate into the split.
pub fn calculate_commission(fare_amount: f64, commission_rate: f64) -> CommissionBreakdown {
    let commission = fare_amount * commission_rate;
    CommissionBreakdown {
        total_fare: fare_amount,
        platform_commission: round2(commission),
        driver_earnings: round2(fare_amount - commission),
        commission_rate,
    }
}

/// Trip pricing engine.
///
/// Owns the pricing configuration and the exchange-rate cache. One engine
/// instance serves one dispatch layer, which serializes calls against it; a
/// USD quote is the only operation that can suspend, and only when the cached
/// rate has expired.
pub struct FareEngine {
    config: FareConfig,
    source: Box<dyn RateSource>,
    cache: RateCache,
}

impl FareEngine {
    pub fn new(config: FareConfig, source: Box<dyn RateSource>) -> Self {
        Self {
            config,
            source,
            cache: RateCache::default(),
        }
    }

    pub fn config(&self) -> &FareConfig {
        &self.config
    }

    /// Current BS/USD rate, served from cache when fresh.
    ///
    /// On a cache miss a single fetch is attempted. Fetch failures are
    /// swallowed: the configured fallback rate is returned with
    /// `used_fallback` set and the cache is left untouched, so the next
    /// expired call retries the source.
    pub async fn exchange_rate(&mut self) -> RateQuote {
        self.exchange_rate_at(Instant::now()).await
    }

    /// [`exchange_rate`](Self::exchange_rate) with an explicit clock reading.
    pub async fn exchange_rate_at(&mut self, now: Instant) -> RateQuote {
        if let Some(rate) = self.cache.get(now) {
            return RateQuote {
                rate,
                used_fallback: false,
            };
        }

        match self.source.fetch_rate().await {
            Ok(rate) => {
                self.cache.store(rate, now);
                RateQuote {
                    rate,
                    used_fallback: false,
                }
            }
            Err(err) => {
                warn!(
                    error = %err,
                    fallback_rate = self.config.fallback_usd_rate,
                    "rate fetch failed, using configured fallback"
                );
                RateQuote {
                    rate: self.config.fallback_usd_rate,
                    used_fallback: true,
                }
            }
        }
    }

    /// Price a trip.
    ///
    /// The pipeline order is part of the contract: base + distance + time,
    /// then fuel surcharge, then surge, then the minimum-fare floor, then
    /// rounding. The floor comes after surge, so surge can neither push a
    /// fare below the minimum nor discount below it. Never returns an error:
    /// a failed rate fetch degrades to the fallback rate.
    pub async fn calculate(
        &mut self,
        distance_km: f64,
        duration_min: f64,
        options: FareOptions,
    ) -> FareBreakdown {
        self.calculate_at(distance_km, duration_min, options, Instant::now())
            .await
    }

    /// [`calculate`](Self::calculate) with an explicit clock reading.
    pub async fn calculate_at(
        &mut self,
        distance_km: f64,
        duration_min: f64,
        options: FareOptions,
        now: Instant,
    ) -> FareBreakdown {
        let config = self.config;

        let mut fare =
            config.base_fare + distance_km * config.per_km + duration_min * config.per_min;

        let fuel_surcharge =
            if options.apply_fuel_surcharge && config.fuel_price > FUEL_REFERENCE_PRICE {
                (config.fuel_price - FUEL_REFERENCE_PRICE) * FUEL_SURCHARGE_FACTOR
            } else {
                0.0
            };
        fare += fuel_surcharge;

        fare *= options.surge_multiplier;
        fare = fare.max(config.min_fare);
        let amount_bs = round2(fare);

        let mut result = FareBreakdown {
            amount_bs,
            currency: Currency::Bs,
            breakdown: BreakdownComponents {
                base_fare: config.base_fare,
                distance_charge: round2(distance_km * config.per_km),
                time_charge: round2(duration_min * config.per_min),
                surge_multiplier: options.surge_multiplier,
                fuel_surcharge: round2(fuel_surcharge),
            },
            amount_usd: None,
            exchange_rate: None,
            exchange_rate_source: None,
            used_fallback_rate: None,
        };

        if options.currency == Currency::Usd {
            let quote = self.exchange_rate_at(now).await;
            result.currency = Currency::Usd;
            result.amount_usd = Some(round2(amount_bs / quote.rate));
            result.exchange_rate = Some(quote.rate);
            result.exchange_rate_source = Some(RATE_SOURCE_LABEL.to_string());
            result.used_fallback_rate = Some(quote.used_fallback);
        }

        result
    }
}

impl std::fmt::Debug for FareEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FareEngine")
            .field("config", &self.config)
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}
