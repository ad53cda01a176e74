//! Tool input and output types.
//!
//! Inputs derive `JsonSchema` so the catalog can publish their shape; the
//! doc comments double as the Spanish field descriptions the original API
//! contract uses. Outputs serialize into the exact payloads the clients
//! already consume (`success`, `conductores`, `tarifa`, ...).

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use panaride_lib::{Currency, Driver, DriverStats, FareBreakdown, Ride, StatsPeriod};

// ============================================================================
// TOOL INPUTS
// ============================================================================

/// Un punto geográfico.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema)]
pub struct GeoPoint {
    /// Latitud en grados decimales
    pub latitud: f64,
    /// Longitud en grados decimales
    pub longitud: f64,
}

/// Un extremo del viaje: coordenadas más dirección legible.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TripEndpoint {
    pub latitud: f64,
    pub longitud: f64,
    /// Dirección legible del punto
    pub direccion: String,
}

/// Método de pago aceptado para un viaje.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Efectivo,
    Transferencia,
    PagoMovil,
}

/// Tipo de servicio solicitado.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ServiceType {
    Mototaxi,
    #[default]
    ElPana,
    ElAmigo,
    FullPana,
}

/// Input for `buscar_conductores_disponibles`.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SearchDriversInput {
    /// Latitud del punto de búsqueda
    pub latitud: f64,
    /// Longitud del punto de búsqueda
    pub longitud: f64,
    /// Radio de búsqueda en kilómetros (por defecto: 5)
    #[serde(default = "default_radius_km")]
    pub radio_km: f64,
}

fn default_radius_km() -> f64 {
    5.0
}

/// Input for `crear_viaje`.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct CreateRideInput {
    /// ID del usuario que solicita el viaje
    pub user_id: String,
    /// Origen del viaje
    pub origen: TripEndpoint,
    /// Destino del viaje
    pub destino: TripEndpoint,
    /// Método de pago para el viaje
    pub metodo_pago: PaymentMethod,
}

/// Input for `calcular_tarifa`.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct FareQuoteInput {
    /// Distancia del viaje en kilómetros
    pub distancia_km: f64,
    /// Duración estimada del viaje en minutos (opcional)
    pub duracion_min: Option<f64>,
    /// Tipo de servicio solicitado
    #[serde(default)]
    pub tipo_servicio: ServiceType,
    /// Moneda para el cálculo (BS o USD)
    #[serde(default)]
    pub moneda: Currency,
}

/// Input for `actualizar_ubicacion_conductor`.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct UpdateLocationInput {
    /// ID del conductor
    pub conductor_id: String,
    /// Latitud actual del conductor
    pub latitud: f64,
    /// Longitud actual del conductor
    pub longitud: f64,
    /// Rumbo del conductor en grados (0-360, opcional)
    pub rumbo: Option<f64>,
}

/// Input for `obtener_estadisticas_conductor`.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct DriverStatsInput {
    /// ID del conductor
    pub conductor_id: String,
    /// Período de tiempo para las estadísticas
    #[serde(default)]
    pub periodo: StatsPeriod,
}

/// Input for `completar_viaje`.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct CompleteRideInput {
    /// ID del viaje a completar
    pub viaje_id: String,
    /// Distancia real recorrida en kilómetros
    pub distancia_real_km: f64,
    /// Duración real del viaje en minutos
    pub duracion_real_min: f64,
    /// Calificación del pasajero (1-5, opcional)
    pub calificacion: Option<f64>,
}

/// Input for `calcular_distancia`.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct DistanceInput {
    /// Punto de origen
    pub origen: GeoPoint,
    /// Punto de destino
    pub destino: GeoPoint,
}

// ============================================================================
// TOOL OUTPUTS
// ============================================================================

/// A driver row annotated with its distance from the search center.
#[derive(Debug, Clone, Serialize)]
pub struct NearbyDriver {
    #[serde(flatten)]
    pub driver: Driver,
    pub distancia_km: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchArea {
    pub centro: GeoPoint,
    pub radio_km: f64,
}

/// Output from `buscar_conductores_disponibles`.
#[derive(Debug, Clone, Serialize)]
pub struct SearchDriversOutput {
    pub success: bool,
    pub total: usize,
    pub conductores: Vec<NearbyDriver>,
    pub area_busqueda: SearchArea,
}

/// Output from `crear_viaje`.
#[derive(Debug, Clone, Serialize)]
pub struct CreateRideOutput {
    pub success: bool,
    pub viaje: Ride,
    pub estimacion_tarifa: FareBreakdown,
    pub distancia_km: f64,
    pub duracion_estimada_min: i64,
}

/// Output from `calcular_tarifa`.
#[derive(Debug, Clone, Serialize)]
pub struct FareQuoteOutput {
    pub success: bool,
    pub tipo_servicio: ServiceType,
    pub distancia_km: f64,
    pub duracion_min: f64,
    pub tarifa: FareBreakdown,
}

/// Output from `actualizar_ubicacion_conductor`.
#[derive(Debug, Clone, Serialize)]
pub struct UpdateLocationOutput {
    pub success: bool,
    pub conductor: Driver,
    pub mensaje: String,
}

/// Output from `obtener_estadisticas_conductor`.
#[derive(Debug, Clone, Serialize)]
pub struct DriverStatsOutput {
    pub success: bool,
    pub estadisticas: DriverStats,
}

/// Output from `completar_viaje`.
#[derive(Debug, Clone, Serialize)]
pub struct CompleteRideOutput {
    pub success: bool,
    pub viaje: Ride,
    pub tarifa_final: FareBreakdown,
    pub mensaje: String,
}

/// Output from `calcular_distancia`.
#[derive(Debug, Clone, Serialize)]
pub struct DistanceOutput {
    pub success: bool,
    pub distancia_km: f64,
    pub duracion_estimada_min: i64,
    pub origen: GeoPoint,
    pub destino: GeoPoint,
}
