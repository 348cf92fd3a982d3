use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

/// Unit costs of the sizing model.
///
/// The capital terms price the two sized components, the penalty terms price
/// each kWh by which the daily state of charge overshoots or undershoots the
/// effective battery ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema, TS)]
#[ts(export, export_to = "./sizing.ts")]
pub struct CostParameters {
    /// Capital cost per m² of installed panel area.
    pub panel_cost_per_m2: f64,
    /// Capital cost per kWh of installed battery capacity.
    pub battery_cost_per_kwh: f64,
    /// Penalty per kWh of daily energy surplus.
    pub surplus_cost_per_kwh: f64,
    /// Penalty per kWh of daily energy deficit.
    pub deficit_cost_per_kwh: f64,
}

/// Physical limits of the battery and the installation site.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema, TS)]
#[ts(export, export_to = "./sizing.ts")]
pub struct BatteryParameters {
    /// Round-trip efficiency γ: fraction of stored energy retained across one
    /// day of carry-over. Expected in (0, 1].
    pub round_trip_efficiency: f64,
    /// Maximum charge/discharge rate r as a fraction of capacity per day.
    pub max_rate_fraction: f64,
    /// Maximum installable panel area in m².
    pub max_panel_area_m2: f64,
}

/// The two forecast series driving one sizing request.
///
/// Both series are indexed by planning day and must have exactly the
/// horizon's length. They are owned for the duration of one request and not
/// retained afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, TS)]
#[ts(export, export_to = "./sizing.ts")]
pub struct ForecastSeries {
    /// Daily solar yield per m² of panel (kWh/m²).
    pub solar_yield_kwh_per_m2: Vec<f64>,
    /// Daily household consumption (kWh).
    pub consumption_kwh: Vec<f64>,
}

impl ForecastSeries {
    pub fn new(solar_yield_kwh_per_m2: Vec<f64>, consumption_kwh: Vec<f64>) -> Self {
        Self {
            solar_yield_kwh_per_m2,
            consumption_kwh,
        }
    }

    /// Total solar yield per m² over the whole horizon.
    pub fn total_solar_yield(&self) -> f64 {
        self.solar_yield_kwh_per_m2.iter().sum()
    }

    /// Total consumption over the whole horizon.
    pub fn total_consumption(&self) -> f64 {
        self.consumption_kwh.iter().sum()
    }
}
