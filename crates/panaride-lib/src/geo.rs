//! Geo-kinematics: great-circle distance and naive travel-time estimates.
//!
//! These are pure functions with no I/O and no state. Coordinates are not
//! range-checked: out-of-range or NaN inputs propagate into the result
//! instead of raising an error. Callers that need strict validation must do
//! it at the edge.

use serde::{Deserialize, Serialize};

use crate::round2;

/// Mean Earth radius in kilometers, as used by the haversine formula.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Assumed average city travel speed for ETA estimates, in km/h.
pub const AVG_CITY_SPEED_KMH: f64 = 20.0;

/// A geographic position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// Great-circle distance between two coordinates via the haversine formula.
///
/// The result is rounded to exactly 2 decimal places, so two coordinates
/// closer than ~5 meters collapse to 0.00 km. Symmetric in its arguments.
pub fn distance_km(a: Coordinate, b: Coordinate) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();

    let h = (d_lat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (d_lng / 2.0).sin().powi(2);

    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    round2(EARTH_RADIUS_KM * c)
}

/// Estimated travel time in whole minutes at the average city speed.
///
/// Partial minutes always count as a full minute. Zero distance yields zero.
/// Negative distances are not rejected and produce a negative-or-zero result.
pub fn eta_minutes(distance_km: f64) -> i64 {
    (distance_km / AVG_CITY_SPEED_KMH * 60.0).ceil() as i64
}
