use std::env;

use anyhow::Result;
use tracing::info;

use panaride_lib::{FareConfig, StoreConfig};
use panaride_mcp::{rpc, ServerState};

/// Default store project URL, overridable via `SUPABASE_URL`.
const DEFAULT_STORE_URL: &str = "https://mdaksestqxfdxpirudsc.supabase.co";

#[tokio::main]
async fn main() -> Result<()> {
    // Logging MUST go to stderr: stdout carries the protocol stream.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("panaride_mcp=info".parse()?),
        )
        .init();

    let fare_config = fare_config_from_env();
    let store_config = store_config_from_env();

    info!(
        store_url = %store_config.base_url,
        "starting Panaride MCP server on stdio"
    );

    let state = ServerState::new(fare_config, store_config)?;
    rpc::run(state).await?;

    Ok(())
}

/// Build the fare configuration from the environment, falling back to the
/// default tariff for each knob independently. All configuration reading
/// happens here: the engine itself takes no ambient state.
fn fare_config_from_env() -> FareConfig {
    let defaults = FareConfig::default();
    FareConfig {
        base_fare: env_f64("BASE_FARE_BS", defaults.base_fare),
        per_km: env_f64("PER_KM_BS", defaults.per_km),
        per_min: env_f64("PER_MIN_BS", defaults.per_min),
        min_fare: env_f64("MIN_FARE_BS", defaults.min_fare),
        fuel_price: env_f64("FUEL_PRICE_BS", defaults.fuel_price),
        fallback_usd_rate: env_f64("USD_EXCHANGE_RATE", defaults.fallback_usd_rate),
    }
}

fn store_config_from_env() -> StoreConfig {
    StoreConfig {
        base_url: env::var("SUPABASE_URL").unwrap_or_else(|_| DEFAULT_STORE_URL.to_string()),
        service_key: env::var("SUPABASE_SERVICE_KEY").unwrap_or_default(),
    }
}

fn env_f64(name: &str, default: f64) -> f64 {
    env::var(name)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}
