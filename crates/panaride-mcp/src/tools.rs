//! Tool implementations for the ride-hailing catalog.
//!
//! Each tool is a thin caller: geometry and pricing go through
//! `panaride-lib`, records go through the collection store. Store failures
//! bubble up as [`Error::upstream`] and become `{success: false, error}`
//! payloads at the transport; nothing here can crash the server.

use chrono::Utc;
use tracing::{debug, info};

use panaride_lib::{
    distance_km, eta_minutes, summarize_rides, Coordinate, FareOptions, LocationUpdate, NewRide,
    RideCompletion,
};

use crate::server::ServerState;
use crate::types::*;
use crate::Error;

/// `buscar_conductores_disponibles`: available drivers within a radius.
pub struct SearchDriversTool;

impl SearchDriversTool {
    pub async fn execute(
        state: &ServerState,
        input: SearchDriversInput,
    ) -> crate::Result<SearchDriversOutput> {
        debug!(
            lat = input.latitud,
            lng = input.longitud,
            radius_km = input.radio_km,
            "searching available drivers"
        );

        let drivers = state.store().available_drivers().await.map_err(Error::upstream)?;
        let center = Coordinate::new(input.latitud, input.longitud);

        // Bounded linear scan: annotate with distance, keep those inside the
        // radius, closest first. Drivers without a reported position are
        // unreachable and dropped.
        let mut conductores: Vec<NearbyDriver> = drivers
            .into_iter()
            .filter_map(|driver| {
                let lat = driver.current_lat?;
                let lng = driver.current_lng?;
                let distancia_km = distance_km(center, Coordinate::new(lat, lng));
                (distancia_km <= input.radio_km).then_some(NearbyDriver {
                    driver,
                    distancia_km,
                })
            })
            .collect();
        conductores.sort_by(|a, b| a.distancia_km.total_cmp(&b.distancia_km));

        Ok(SearchDriversOutput {
            success: true,
            total: conductores.len(),
            conductores,
            area_busqueda: SearchArea {
                centro: GeoPoint {
                    latitud: input.latitud,
                    longitud: input.longitud,
                },
                radio_km: input.radio_km,
            },
        })
    }
}

/// `crear_viaje`: register a new ride request with its estimates.
pub struct CreateRideTool;

impl CreateRideTool {
    pub async fn execute(
        state: &ServerState,
        input: CreateRideInput,
    ) -> crate::Result<CreateRideOutput> {
        let origen = Coordinate::new(input.origen.latitud, input.origen.longitud);
        let destino = Coordinate::new(input.destino.latitud, input.destino.longitud);

        let distancia = distance_km(origen, destino);
        let duracion_estimada = eta_minutes(distancia);
        let estimacion = state
            .engine()
            .lock()
            .await
            .calculate(distancia, duracion_estimada as f64, FareOptions::default())
            .await;

        let nuevo = NewRide {
            user_id: input.user_id,
            pickup_lat: input.origen.latitud,
            pickup_lng: input.origen.longitud,
            pickup_address: input.origen.direccion,
            dropoff_lat: input.destino.latitud,
            dropoff_lng: input.destino.longitud,
            dropoff_address: input.destino.direccion,
            payment_method: payment_method_value(input.metodo_pago),
            status: "pending".to_string(),
            estimated_distance_km: distancia,
            estimated_duration_min: duracion_estimada,
            estimated_fare_bs: estimacion.amount_bs,
            created_at: Utc::now(),
        };

        let viaje = state.store().insert_ride(&nuevo).await.map_err(Error::upstream)?;

        info!(
            ride_id = %viaje.id,
            distance_km = distancia,
            fare_bs = estimacion.amount_bs,
            "ride created"
        );

        Ok(CreateRideOutput {
            success: true,
            viaje,
            estimacion_tarifa: estimacion,
            distancia_km: distancia,
            duracion_estimada_min: duracion_estimada,
        })
    }
}

/// `calcular_tarifa`: price a trip from its distance and duration.
pub struct FareQuoteTool;

impl FareQuoteTool {
    pub async fn execute(
        state: &ServerState,
        input: FareQuoteInput,
    ) -> crate::Result<FareQuoteOutput> {
        let duracion = input
            .duracion_min
            .unwrap_or_else(|| eta_minutes(input.distancia_km) as f64);

        let tarifa = state
            .engine()
            .lock()
            .await
            .calculate(
                input.distancia_km,
                duracion,
                FareOptions::in_currency(input.moneda),
            )
            .await;

        Ok(FareQuoteOutput {
            success: true,
            tipo_servicio: input.tipo_servicio,
            distancia_km: input.distancia_km,
            duracion_min: duracion,
            tarifa,
        })
    }
}

/// `actualizar_ubicacion_conductor`: record a driver position report.
pub struct UpdateLocationTool;

impl UpdateLocationTool {
    pub async fn execute(
        state: &ServerState,
        input: UpdateLocationInput,
    ) -> crate::Result<UpdateLocationOutput> {
        let update = LocationUpdate {
            current_lat: input.latitud,
            current_lng: input.longitud,
            last_location_update: Utc::now(),
            heading: input.rumbo,
        };

        let conductor = state
            .store()
            .update_driver_location(&input.conductor_id, &update)
            .await
            .map_err(Error::upstream)?;

        Ok(UpdateLocationOutput {
            success: true,
            conductor,
            mensaje: "Ubicación actualizada correctamente".to_string(),
        })
    }
}

/// `obtener_estadisticas_conductor`: aggregate a driver's recent rides.
pub struct DriverStatsTool;

impl DriverStatsTool {
    pub async fn execute(
        state: &ServerState,
        input: DriverStatsInput,
    ) -> crate::Result<DriverStatsOutput> {
        let since = input.periodo.start_from(Utc::now());
        let rides = state
            .store()
            .driver_rides_since(&input.conductor_id, since)
            .await
            .map_err(Error::upstream)?;

        debug!(
            driver_id = %input.conductor_id,
            rides = rides.len(),
            period = ?input.periodo,
            "aggregating driver statistics"
        );

        Ok(DriverStatsOutput {
            success: true,
            estadisticas: summarize_rides(input.periodo, &rides),
        })
    }
}

/// `completar_viaje`: close a ride with its final measurements and fare.
pub struct CompleteRideTool;

impl CompleteRideTool {
    pub async fn execute(
        state: &ServerState,
        input: CompleteRideInput,
    ) -> crate::Result<CompleteRideOutput> {
        let tarifa_final = state
            .engine()
            .lock()
            .await
            .calculate(
                input.distancia_real_km,
                input.duracion_real_min,
                FareOptions::default(),
            )
            .await;

        let update = RideCompletion {
            status: "completed".to_string(),
            actual_distance_km: input.distancia_real_km,
            actual_duration_min: input.duracion_real_min,
            final_amount: tarifa_final.amount_bs,
            completed_at: Utc::now(),
            rating: input.calificacion,
        };

        let viaje = state
            .store()
            .complete_ride(&input.viaje_id, &update)
            .await
            .map_err(Error::upstream)?;

        info!(ride_id = %viaje.id, final_amount = tarifa_final.amount_bs, "ride completed");

        Ok(CompleteRideOutput {
            success: true,
            viaje,
            tarifa_final,
            mensaje: "Viaje completado exitosamente".to_string(),
        })
    }
}

/// `calcular_distancia`: distance and ETA between two points.
pub struct DistanceTool;

impl DistanceTool {
    pub async fn execute(input: DistanceInput) -> crate::Result<DistanceOutput> {
        let distancia = distance_km(
            Coordinate::new(input.origen.latitud, input.origen.longitud),
            Coordinate::new(input.destino.latitud, input.destino.longitud),
        );

        Ok(DistanceOutput {
            success: true,
            distancia_km: distancia,
            duracion_estimada_min: eta_minutes(distancia),
            origen: input.origen,
            destino: input.destino,
        })
    }
}

fn payment_method_value(method: PaymentMethod) -> String {
    match method {
        PaymentMethod::Efectivo => "efectivo",
        PaymentMethod::Transferencia => "transferencia",
        PaymentMethod::PagoMovil => "pago_movil",
    }
    .to_string()
}
