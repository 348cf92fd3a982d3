use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

use crate::sizing::parameters::{BatteryParameters, CostParameters, ForecastSeries};

/// Request body of the sizing endpoint.
///
/// Field names follow the wire format of the deployed service, so the short
/// mathematical names (`c1`..`c4`, `gamma`, `r`) are kept on the wire and
/// mapped to the descriptive parameter structs via the accessors below.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, TS)]
#[ts(export, export_to = "./sizing.ts")]
pub struct SizingRequest {
    /// Planning horizon length in days.
    #[serde(rename = "K")]
    pub horizon_days: usize,
    /// Panel cost per m².
    pub c1: f64,
    /// Battery cost per kWh.
    pub c2: f64,
    /// Surplus penalty per kWh.
    pub c3: f64,
    /// Deficit penalty per kWh.
    pub c4: f64,
    /// Battery round-trip efficiency.
    pub gamma: f64,
    /// Maximum charge/discharge rate fraction.
    pub r: f64,
    /// Maximum installable panel area in m².
    #[serde(rename = "X_max")]
    pub x_max: f64,
    /// Daily solar yield per m² (kWh/m²), length K.
    pub generacion_solar: Vec<f64>,
    /// Daily consumption (kWh), length K.
    pub consumo_energia: Vec<f64>,
}

impl SizingRequest {
    pub fn cost_parameters(&self) -> CostParameters {
        CostParameters {
            panel_cost_per_m2: self.c1,
            battery_cost_per_kwh: self.c2,
            surplus_cost_per_kwh: self.c3,
            deficit_cost_per_kwh: self.c4,
        }
    }

    pub fn battery_parameters(&self) -> BatteryParameters {
        BatteryParameters {
            round_trip_efficiency: self.gamma,
            max_rate_fraction: self.r,
            max_panel_area_m2: self.x_max,
        }
    }

    pub fn forecast(&self) -> ForecastSeries {
        ForecastSeries::new(self.generacion_solar.clone(), self.consumo_energia.clone())
    }
}

/// Successful sizing response.
///
/// The forecast echo fields are only populated by deployments that generate
/// the series synthetically instead of receiving them from the caller.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, TS)]
#[ts(export, export_to = "./sizing.ts")]
pub struct SizingResponse {
    #[serde(rename = "Area_Panel_m2")]
    pub panel_area_m2: f64,
    #[serde(rename = "Capacidad_Bateria_kWh")]
    pub battery_capacity_kwh: f64,
    #[serde(rename = "Estado_Carga_kWh")]
    pub state_of_charge_kwh: Vec<f64>,
    #[serde(rename = "generacion_solar", skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub solar_series: Option<Vec<f64>>,
    #[serde(rename = "consumo_energia", skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub consumption_series: Option<Vec<f64>>,
}

/// Request body of the panel-orientation endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, TS)]
#[ts(export, export_to = "./sizing.ts")]
pub struct PanelAngleRequest {
    /// Panel area in m².
    #[serde(rename = "A")]
    pub area_m2: f64,
    /// Panel efficiency in (0, 1].
    pub eta: f64,
    /// Mean daily irradiance (kWh/m²).
    #[serde(rename = "I_promedio")]
    pub mean_irradiance: f64,
    /// Number of daylight hours, starting at 06:00.
    pub horas_sol: u32,
}

/// One optimized hour of the panel-orientation schedule.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, TS)]
#[ts(export, export_to = "./sizing.ts")]
pub struct PanelHourRecord {
    #[serde(rename = "Hora")]
    pub hour: u32,
    #[serde(rename = "Radiación Solar (kWh/m²)")]
    pub irradiance_kwh_m2: f64,
    #[serde(rename = "Inclinación (θ)")]
    pub tilt_deg: f64,
    #[serde(rename = "Orientación (φ)")]
    pub azimuth_deg: f64,
    #[serde(rename = "Energía Generada (kWh)")]
    pub energy_kwh: f64,
}

/// Request body of the Monte Carlo savings endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, TS)]
#[ts(export, export_to = "./sizing.ts")]
pub struct SavingsRequest {
    pub num_simulaciones: usize,
    /// [low, high] grid energy price range (USD/kWh).
    pub precio_energia_range: [f64; 2],
    /// [low, high] daily solar production range (kWh).
    pub produccion_solar_range: [f64; 2],
    /// [low, high] daily consumption range (kWh).
    pub consumo_energia_range: [f64; 2],
    /// Fixed monthly third-party taxes (USD).
    pub impuesto_mensual: f64,
    pub region: String,
    pub area_vivienda: f64,
    pub consumo_mensual: f64,
}

/// Aggregated Monte Carlo savings response.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, TS)]
#[ts(export, export_to = "./sizing.ts")]
pub struct SavingsResponse {
    pub region: String,
    pub area_vivienda: f64,
    pub consumo_mensual: f64,
    pub vpn_promedio: f64,
    pub roi_promedio: f64,
    pub probabilidad_vpn_positivo: f64,
    pub periodo_recuperacion_promedio: f64,
    pub inversion_promedio: f64,
    pub produccion_anual_promedio: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sizing_request_wire_names() {
        let body = r#"{
            "K": 3,
            "c1": 100, "c2": 500, "c3": 0.05, "c4": 0.25,
            "gamma": 0.9, "r": 0.2, "X_max": 20,
            "generacion_solar": [4.5, 5.0, 4.8],
            "consumo_energia": [5.5, 6.0, 7.2]
        }"#;
        let request: SizingRequest = serde_json::from_str(body).unwrap();
        assert_eq!(request.horizon_days, 3);
        assert_eq!(request.x_max, 20.0);
        assert_eq!(request.generacion_solar.len(), 3);

        let costs = request.cost_parameters();
        assert_eq!(costs.panel_cost_per_m2, 100.0);
        assert_eq!(costs.deficit_cost_per_kwh, 0.25);

        let battery = request.battery_parameters();
        assert_eq!(battery.round_trip_efficiency, 0.9);
        assert_eq!(battery.max_panel_area_m2, 20.0);
    }

    #[test]
    fn test_sizing_response_skips_empty_echo() {
        let response = SizingResponse {
            panel_area_m2: 1.5,
            battery_capacity_kwh: 3.0,
            state_of_charge_kwh: vec![0.0, 1.0],
            solar_series: None,
            consumption_series: None,
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("Area_Panel_m2"));
        assert!(json.contains("Estado_Carga_kWh"));
        assert!(!json.contains("generacion_solar"));
    }
}
