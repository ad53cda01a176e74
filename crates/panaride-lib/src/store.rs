//! Typed client for the remote collection store.
//!
//! Drivers and rides live in a hosted PostgREST-style store (Supabase in
//! production). This module is a thin I/O wrapper: it shapes
//! requests, forwards the service key, and maps non-success responses to
//! [`Error::StoreRequest`]. No business logic lives here.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{Error, Result};

const STORE_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Connection settings for the collection store, built once at bootstrap.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Base URL of the store, e.g. `https://project.supabase.co`.
    pub base_url: String,
    /// Service key sent as both `apikey` and bearer token.
    pub service_key: String,
}

/// A driver record.
///
/// Only the fields the tools read are typed; everything else the store keeps
/// on the record is carried through `extra` so search results echo the full
/// row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Driver {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_online: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_lat: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_lng: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heading: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_location_update: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A ride record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ride {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub driver_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pickup_lat: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pickup_lng: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pickup_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dropoff_lat: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dropoff_lng: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dropoff_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_distance_km: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_duration_min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_fare_bs: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual_distance_km: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual_duration_min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Insert payload for a new ride request.
#[derive(Debug, Clone, Serialize)]
pub struct NewRide {
    pub user_id: String,
    pub pickup_lat: f64,
    pub pickup_lng: f64,
    pub pickup_address: String,
    pub dropoff_lat: f64,
    pub dropoff_lng: f64,
    pub dropoff_address: String,
    pub payment_method: String,
    pub status: String,
    pub estimated_distance_km: f64,
    pub estimated_duration_min: i64,
    pub estimated_fare_bs: f64,
    pub created_at: DateTime<Utc>,
}

/// Update payload marking a ride completed.
#[derive(Debug, Clone, Serialize)]
pub struct RideCompletion {
    pub status: String,
    pub actual_distance_km: f64,
    pub actual_duration_min: f64,
    pub final_amount: f64,
    pub completed_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
}

/// Update payload for a driver position report.
#[derive(Debug, Clone, Serialize)]
pub struct LocationUpdate {
    pub current_lat: f64,
    pub current_lng: f64,
    pub last_location_update: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heading: Option<f64>,
}

/// Client for the drivers/rides collection store.
#[derive(Debug, Clone)]
pub struct Store {
    client: reqwest::Client,
    config: StoreConfig,
}

impl Store {
    pub fn new(config: StoreConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(STORE_REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { client, config })
    }

    fn collection_url(&self, collection: &str) -> String {
        format!(
            "{}/rest/v1/{}",
            self.config.base_url.trim_end_matches('/'),
            collection
        )
    }

    fn request(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, url)
            .header("apikey", &self.config.service_key)
            .bearer_auth(&self.config.service_key)
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let detail = response.text().await.unwrap_or_default();
        Err(Error::StoreRequest {
            status: status.as_u16(),
            detail,
        })
    }

    /// Drivers currently marked available and online.
    pub async fn available_drivers(&self) -> Result<Vec<Driver>> {
        let url = self.collection_url("drivers");
        let response = self
            .request(reqwest::Method::GET, &url)
            .query(&[
                ("select", "*"),
                ("status", "eq.available"),
                ("is_online", "eq.true"),
            ])
            .send()
            .await?;

        let drivers: Vec<Driver> = Self::check(response).await?.json().await?;
        debug!(count = drivers.len(), "fetched available drivers");
        Ok(drivers)
    }

    /// Insert a new ride and return the stored record.
    pub async fn insert_ride(&self, ride: &NewRide) -> Result<Ride> {
        let url = self.collection_url("rides");
        let response = self
            .request(reqwest::Method::POST, &url)
            .header("Prefer", "return=representation")
            .json(ride)
            .send()
            .await?;

        let mut rows: Vec<Ride> = Self::check(response).await?.json().await?;
        rows.pop().ok_or(Error::StoreRequest {
            status: 200,
            detail: "insert returned no representation".to_string(),
        })
    }

    /// Apply a completion update to a ride and return the updated record.
    pub async fn complete_ride(&self, ride_id: &str, update: &RideCompletion) -> Result<Ride> {
        let url = self.collection_url("rides");
        let response = self
            .request(reqwest::Method::PATCH, &url)
            .header("Prefer", "return=representation")
            .query(&[("id", format!("eq.{ride_id}"))])
            .json(update)
            .send()
            .await?;

        let mut rows: Vec<Ride> = Self::check(response).await?.json().await?;
        rows.pop().ok_or_else(|| Error::RideNotFound {
            id: ride_id.to_string(),
        })
    }

    /// Apply a position report to a driver and return the updated record.
    pub async fn update_driver_location(
        &self,
        driver_id: &str,
        update: &LocationUpdate,
    ) -> Result<Driver> {
        let url = self.collection_url("drivers");
        let response = self
            .request(reqwest::Method::PATCH, &url)
            .header("Prefer", "return=representation")
            .query(&[("id", format!("eq.{driver_id}"))])
            .json(update)
            .send()
            .await?;

        let mut rows: Vec<Driver> = Self::check(response).await?.json().await?;
        rows.pop().ok_or_else(|| Error::DriverNotFound {
            id: driver_id.to_string(),
        })
    }

    /// Completed and cancelled rides for a driver since a point in time.
    pub async fn driver_rides_since(
        &self,
        driver_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<Ride>> {
        let url = self.collection_url("rides");
        let response = self
            .request(reqwest::Method::GET, &url)
            .query(&[
                ("select", "*".to_string()),
                ("driver_id", format!("eq.{driver_id}")),
                ("created_at", format!("gte.{}", since.to_rfc3339())),
                ("status", "in.(completed,cancelled)".to_string()),
            ])
            .send()
            .await?;

        Self::check(response).await?.json().await.map_err(Error::from)
    }
}
