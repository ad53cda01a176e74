//! Trip pricing: fare pipeline, commission split, and exchange-rate caching.
//!
//! The engine is deliberately permissive about numeric inputs (negative
//! distances, out-of-range commission rates): garbage propagates instead of
//! erroring. The only fallible external dependency is the exchange-rate
//! fetch, and that failure never escapes the engine; it degrades to the
//! configured fallback rate.

mod config;
mod engine;
mod rates;

pub use config::FareConfig;
pub use engine::{
    calculate_commission, BreakdownComponents, CommissionBreakdown, Currency, FareBreakdown,
    FareEngine, FareOptions, DEFAULT_COMMISSION_RATE, FUEL_REFERENCE_PRICE,
};
pub use rates::{
    DolarApiSource, RateCache, RateQuote, RateSource, DOLAR_API_URL, RATE_CACHE_TTL,
    RATE_FETCH_TIMEOUT, RATE_SOURCE_LABEL,
};
