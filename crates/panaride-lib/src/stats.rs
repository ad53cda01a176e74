//! Driver performance statistics.
//!
//! Pure aggregation over ride records fetched by the dispatch layer. Earnings
//! and distances only count completed rides; missing amounts and ratings
//! count as zero.

use chrono::{DateTime, Months, NaiveTime, TimeDelta, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::round2;
use crate::store::Ride;

/// Reporting window for driver statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
#[serde(rename_all = "snake_case")]
pub enum StatsPeriod {
    #[default]
    Today,
    Week,
    Month,
    AllTime,
}

impl StatsPeriod {
    /// Inclusive start of the reporting window, given the current time.
    pub fn start_from(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            StatsPeriod::Today => now.date_naive().and_time(NaiveTime::MIN).and_utc(),
            StatsPeriod::Week => now.checked_sub_signed(TimeDelta::days(7)).unwrap_or(now),
            StatsPeriod::Month => now.checked_sub_months(Months::new(1)).unwrap_or(now),
            StatsPeriod::AllTime => Utc
                .with_ymd_and_hms(2020, 1, 1, 0, 0, 0)
                .single()
                .unwrap_or(DateTime::<Utc>::UNIX_EPOCH),
        }
    }
}

/// Aggregated performance figures for one driver over one period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DriverStats {
    #[serde(rename = "periodo")]
    pub period: StatsPeriod,
    #[serde(rename = "total_viajes")]
    pub total_rides: usize,
    #[serde(rename = "viajes_completados")]
    pub completed_rides: usize,
    #[serde(rename = "viajes_cancelados")]
    pub cancelled_rides: usize,
    #[serde(rename = "ganancia_total_bs")]
    pub total_earnings_bs: f64,
    #[serde(rename = "distancia_total_km")]
    pub total_distance_km: f64,
    #[serde(rename = "calificacion_promedio")]
    pub average_rating: f64,
    /// Cancelled share of all rides in the window, as a percentage.
    #[serde(rename = "tasa_cancelacion")]
    pub cancellation_rate_pct: f64,
}

/// Aggregate a driver's rides for the given period.
///
/// The input is expected to be pre-filtered to completed and cancelled rides
/// inside the window; this function only classifies and sums.
pub fn summarize_rides(period: StatsPeriod, rides: &[Ride]) -> DriverStats {
    let completed: Vec<&Ride> = rides
        .iter()
        .filter(|r| r.status.as_deref() == Some("completed"))
        .collect();
    let cancelled_count = rides
        .iter()
        .filter(|r| r.status.as_deref() == Some("cancelled"))
        .count();

    let total_earnings: f64 = completed.iter().map(|r| r.final_amount.unwrap_or(0.0)).sum();
    let total_distance: f64 = completed
        .iter()
        .map(|r| r.actual_distance_km.unwrap_or(0.0))
        .sum();
    let average_rating = if completed.is_empty() {
        0.0
    } else {
        completed.iter().map(|r| r.rating.unwrap_or(0.0)).sum::<f64>() / completed.len() as f64
    };
    let cancellation_rate = if rides.is_empty() {
        0.0
    } else {
        cancelled_count as f64 / rides.len() as f64 * 100.0
    };

    DriverStats {
        period,
        total_rides: rides.len(),
        completed_rides: completed.len(),
        cancelled_rides: cancelled_count,
        total_earnings_bs: round2(total_earnings),
        total_distance_km: round2(total_distance),
        average_rating: round2(average_rating),
        cancellation_rate_pct: round2(cancellation_rate),
    }
}
