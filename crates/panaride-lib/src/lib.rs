//! Panaride library entry points.
//!
//! This crate exposes the ride-hailing domain calculations (great-circle
//! distance, travel-time estimates, fare pricing with cached currency
//! conversion), the remote collection-store client for driver and ride
//! records, and driver statistics aggregation. Higher-level consumers (the
//! MCP tool server, the HTTP facade) should only depend on the functions
//! exported here instead of reimplementing behavior.

#![deny(warnings)]

pub mod error;
pub mod fare;
pub mod geo;
pub mod stats;
pub mod store;

pub use error::{Error, Result};
pub use fare::{
    calculate_commission, CommissionBreakdown, Currency, DolarApiSource, FareBreakdown,
    FareConfig, FareEngine, FareOptions, RateQuote, RateSource, DEFAULT_COMMISSION_RATE,
};
pub use geo::{distance_km, eta_minutes, Coordinate};
pub use stats::{summarize_rides, DriverStats, StatsPeriod};
pub use store::{Driver, LocationUpdate, NewRide, Ride, RideCompletion, Store, StoreConfig};

/// Round to 2 decimal places, the fixed money/display precision used across
/// the fare and geo calculations.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
