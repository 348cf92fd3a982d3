use std::path::PathBuf;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;
use sizing_model::sizing::{
    PanelAngleRequest, PanelHourRecord, SavingsRequest, SavingsResponse, SizingRequest,
    SizingResponse,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::general::panel_angle::optimize_panel_angles;
use crate::general::savings::run_savings_simulation;
use crate::sizing::error::SizingError;
use crate::sizing::plot::plot_soc_schedule;
use crate::sizing::sizing_opt::run_sizing_from_request;

/// Deployment configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Restrict the sizing variables to whole units (MILP instead of LP).
    pub integer_sizing: bool,
    /// When set, every successful sizing also writes a schedule chart here.
    pub plot_dir: Option<PathBuf>,
}

/// Success envelope shared by all endpoints.
#[derive(Debug, Serialize)]
pub struct ApiReply<T> {
    pub status: &'static str,
    pub results: T,
}

impl<T: Serialize> ApiReply<T> {
    fn success(results: T) -> Self {
        Self {
            status: "success",
            results,
        }
    }
}

/// Panel endpoint carries the total alongside the hourly records.
#[derive(Debug, Serialize)]
pub struct PanelReply {
    pub status: &'static str,
    pub results: Vec<PanelHourRecord>,
    pub total_energy: f64,
}

/// Boundary-side wrapper translating the core's typed errors into
/// HTTP status codes and the `{"status":"error", ...}` envelope.
#[derive(Debug)]
pub struct ApiError(SizingError);

impl From<SizingError> for ApiError {
    fn from(err: SizingError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            SizingError::DimensionMismatch { .. } | SizingError::InvalidParameter { .. } => {
                StatusCode::BAD_REQUEST
            }
            SizingError::NoOptimalSolution(_) => StatusCode::UNPROCESSABLE_ENTITY,
            SizingError::EngineUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        };
        tracing::error!(status = %status, error = %self.0, "request failed");

        let body = Json(serde_json::json!({
            "status": "error",
            "message": self.0.to_string(),
        }));
        (status, body).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/v1/optimize", post(optimize))
        .route("/api/v1/panel", post(optimize_panel))
        .route("/api/v1/savings", post(simulate_savings))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// POST /api/v1/optimize - size panel area and battery capacity
async fn optimize(
    State(state): State<AppState>,
    Json(request): Json<SizingRequest>,
) -> Result<Json<ApiReply<SizingResponse>>, ApiError> {
    tracing::info!(
        horizon_days = request.horizon_days,
        integer_sizing = state.integer_sizing,
        "sizing request received"
    );

    // The engine call blocks, so it leaves the async runtime. A panicking or
    // cancelled solve surfaces as EngineUnavailable, distinct from a solve
    // that completed without an optimum.
    let integer_sizing = state.integer_sizing;
    let solve_request = request.clone();
    let result = tokio::task::spawn_blocking(move || {
        if integer_sizing {
            run_sizing_from_request(&solve_request, true, good_lp::highs)
        } else {
            run_sizing_from_request(&solve_request, false, good_lp::clarabel)
        }
    })
    .await
    .map_err(|e| SizingError::EngineUnavailable(e.to_string()))??;

    if let Some(dir) = &state.plot_dir {
        let path = dir.join("soc_schedule.png");
        if let Err(e) = plot_soc_schedule(
            &result.state_of_charge_kwh,
            &request.generacion_solar,
            &request.consumo_energia,
            &path.to_string_lossy(),
        ) {
            tracing::warn!(error = %e, "failed to draw schedule chart");
        }
    }

    Ok(Json(ApiReply::success(SizingResponse {
        panel_area_m2: result.panel_area_m2,
        battery_capacity_kwh: result.battery_capacity_kwh,
        state_of_charge_kwh: result.state_of_charge_kwh,
        solar_series: None,
        consumption_series: None,
    })))
}

/// POST /api/v1/panel - optimize panel orientation hour by hour
async fn optimize_panel(
    State(_state): State<AppState>,
    Json(request): Json<PanelAngleRequest>,
) -> Result<Json<PanelReply>, ApiError> {
    tracing::info!(daylight_hours = request.horas_sol, "panel-angle request received");

    let result = optimize_panel_angles(&request, &mut rand::thread_rng())?;

    let records = result
        .hours
        .into_iter()
        .map(|hour| PanelHourRecord {
            hour: hour.hour,
            irradiance_kwh_m2: hour.irradiance_kwh_m2,
            tilt_deg: hour.tilt_deg,
            azimuth_deg: hour.azimuth_deg,
            energy_kwh: hour.energy_kwh,
        })
        .collect();

    Ok(Json(PanelReply {
        status: "success",
        results: records,
        total_energy: result.total_energy_kwh,
    }))
}

/// POST /api/v1/savings - Monte Carlo savings simulation
async fn simulate_savings(
    State(_state): State<AppState>,
    Json(request): Json<SavingsRequest>,
) -> Result<Json<ApiReply<SavingsResponse>>, ApiError> {
    tracing::info!(trials = request.num_simulaciones, "savings request received");

    let simulation = run_savings_simulation(&request, &mut rand::thread_rng())?;
    Ok(Json(ApiReply::success(simulation.summarize(&request))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    fn test_router() -> Router {
        router(AppState {
            integer_sizing: false,
            plot_dir: None,
        })
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn response_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn sizing_body() -> serde_json::Value {
        serde_json::json!({
            "K": 3,
            "c1": 100, "c2": 500, "c3": 0.05, "c4": 0.25,
            "gamma": 0.9, "r": 0.2, "X_max": 20,
            "generacion_solar": [4.5, 5.0, 4.8],
            "consumo_energia": [5.5, 6.0, 7.2]
        })
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let response = test_router()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_optimize_endpoint_returns_schedule() {
        let response = test_router()
            .oneshot(post_json("/api/v1/optimize", sizing_body()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = response_json(response).await;
        assert_eq!(json["status"], "success");
        let results = &json["results"];
        assert!(results["Area_Panel_m2"].as_f64().unwrap() <= 20.0 + 1e-3);
        assert!(results["Capacidad_Bateria_kWh"].as_f64().unwrap() >= -1e-3);
        assert_eq!(results["Estado_Carga_kWh"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_optimize_endpoint_rejects_mismatched_series() {
        let mut body = sizing_body();
        body["K"] = serde_json::json!(5);
        let response = test_router()
            .oneshot(post_json("/api/v1/optimize", body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let json = response_json(response).await;
        assert_eq!(json["status"], "error");
        assert!(json["message"].as_str().unwrap().contains("generacion_solar"));
    }

    #[tokio::test]
    async fn test_infeasible_model_maps_to_unprocessable() {
        let mut body = sizing_body();
        body["X_max"] = serde_json::json!(0.0);
        let response = test_router()
            .oneshot(post_json("/api/v1/optimize", body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_panel_endpoint_returns_hourly_records() {
        let body = serde_json::json!({
            "A": 10.0, "eta": 0.2, "I_promedio": 5.0, "horas_sol": 8
        });
        let response = test_router()
            .oneshot(post_json("/api/v1/panel", body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = response_json(response).await;
        assert_eq!(json["status"], "success");
        assert_eq!(json["results"].as_array().unwrap().len(), 8);
        assert!(json["total_energy"].as_f64().unwrap() > 0.0);
    }

    #[tokio::test]
    async fn test_savings_endpoint_rejects_zero_trials() {
        let body = serde_json::json!({
            "num_simulaciones": 0,
            "precio_energia_range": [0.05, 0.15],
            "produccion_solar_range": [3.0, 7.0],
            "consumo_energia_range": [10.0, 30.0],
            "impuesto_mensual": 5.0,
            "region": "Cundinamarca",
            "area_vivienda": 80.0,
            "consumo_mensual": 450.0
        });
        let response = test_router()
            .oneshot(post_json("/api/v1/savings", body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_savings_endpoint_returns_summary() {
        let body = serde_json::json!({
            "num_simulaciones": 200,
            "precio_energia_range": [0.05, 0.15],
            "produccion_solar_range": [3.0, 7.0],
            "consumo_energia_range": [10.0, 30.0],
            "impuesto_mensual": 5.0,
            "region": "Cundinamarca",
            "area_vivienda": 80.0,
            "consumo_mensual": 450.0
        });
        let response = test_router()
            .oneshot(post_json("/api/v1/savings", body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = response_json(response).await;
        assert_eq!(json["status"], "success");
        assert_eq!(json["results"]["region"], "Cundinamarca");
        assert!(json["results"]["roi_promedio"].as_f64().unwrap() > 0.0);
    }
}
