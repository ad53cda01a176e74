//! Pricing configuration for the fare engine.

use serde::{Deserialize, Serialize};

/// Pricing knobs, fixed for the lifetime of a [`FareEngine`](super::FareEngine).
///
/// The engine reads no environment or other ambient state: the bootstrap
/// layer builds one of these once at startup and passes it in by value.
/// All amounts are expressed in bolívars. None of the fields are
/// range-checked; a negative `per_km` produces a negative distance charge
/// rather than an error.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FareConfig {
    /// Flat amount charged on every trip.
    pub base_fare: f64,
    /// Charge per kilometer traveled.
    pub per_km: f64,
    /// Charge per minute of trip duration.
    pub per_min: f64,
    /// Floor applied to the final fare, after surge.
    pub min_fare: f64,
    /// Current fuel price per liter; drives the fuel surcharge.
    pub fuel_price: f64,
    /// Exchange rate used when the live rate source is unavailable.
    pub fallback_usd_rate: f64,
}

impl Default for FareConfig {
    fn default() -> Self {
        Self {
            base_fare: 3.0,
            per_km: 2.0,
            per_min: 0.5,
            min_fare: 5.0,
            fuel_price: 0.50,
            fallback_usd_rate: 45.0,
        }
    }
}
