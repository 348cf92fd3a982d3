use rand::Rng;
use sizing_model::sizing::{SavingsRequest, SavingsResponse};

use crate::sizing::error::SizingError;

/// Reference installation cost a trial is amortized against (USD).
const REFERENCE_INVESTMENT: f64 = 1000.0;
/// Annual discount rate for the net-present-value calculation.
const DISCOUNT_RATE: f64 = 0.05;

/// Raw per-trial draws and derived metrics, kept as parallel arrays so the
/// caller can hand them to a charting frontend unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct SavingsSimulation {
    pub annual_savings: Vec<f64>,
    pub payback_periods: Vec<f64>,
    pub rois: Vec<f64>,
    pub net_present_values: Vec<f64>,
    pub sampled_production: Vec<f64>,
}

impl SavingsSimulation {
    fn mean(values: &[f64]) -> f64 {
        if values.is_empty() {
            return 0.0;
        }
        values.iter().sum::<f64>() / values.len() as f64
    }

    /// Aggregates the trials into the wire-level summary.
    pub fn summarize(&self, request: &SavingsRequest) -> SavingsResponse {
        let trials = self.net_present_values.len() as f64;
        let positive_npv = self
            .net_present_values
            .iter()
            .filter(|npv| **npv > 0.0)
            .count() as f64;

        SavingsResponse {
            region: request.region.clone(),
            area_vivienda: request.area_vivienda,
            consumo_mensual: request.consumo_mensual,
            vpn_promedio: Self::mean(&self.net_present_values),
            roi_promedio: Self::mean(&self.rois),
            probabilidad_vpn_positivo: positive_npv / trials * 100.0,
            periodo_recuperacion_promedio: Self::mean(&self.payback_periods),
            inversion_promedio: REFERENCE_INVESTMENT,
            produccion_anual_promedio: Self::mean(&self.sampled_production) * 365.0,
        }
    }
}

fn validate_range(name: &'static str, range: [f64; 2]) -> Result<(), SizingError> {
    let [low, high] = range;
    if !low.is_finite() || !high.is_finite() || low < 0.0 || low > high {
        return Err(SizingError::invalid_parameter(
            name,
            format!("expected 0 <= low <= high, got [{low}, {high}]"),
        ));
    }
    Ok(())
}

/// Runs the Monte Carlo savings simulation.
///
/// Each trial draws an energy price, a daily solar production and a daily
/// consumption from the request's uniform ranges, prices the residual grid
/// energy over a year, and derives payback, ROI and NPV against the fixed
/// reference investment. Trials are independent, so the only state is the
/// caller-supplied generator.
pub fn run_savings_simulation<R: Rng>(
    request: &SavingsRequest,
    rng: &mut R,
) -> Result<SavingsSimulation, SizingError> {
    if request.num_simulaciones == 0 {
        return Err(SizingError::invalid_parameter(
            "num_simulaciones",
            "at least one trial is required",
        ));
    }
    validate_range("precio_energia_range", request.precio_energia_range)?;
    validate_range("produccion_solar_range", request.produccion_solar_range)?;
    validate_range("consumo_energia_range", request.consumo_energia_range)?;
    if !request.impuesto_mensual.is_finite() || request.impuesto_mensual < 0.0 {
        return Err(SizingError::invalid_parameter(
            "impuesto_mensual",
            format!(
                "monthly tax must be non-negative, got {}",
                request.impuesto_mensual
            ),
        ));
    }

    let trials = request.num_simulaciones;
    let mut simulation = SavingsSimulation {
        annual_savings: Vec::with_capacity(trials),
        payback_periods: Vec::with_capacity(trials),
        rois: Vec::with_capacity(trials),
        net_present_values: Vec::with_capacity(trials),
        sampled_production: Vec::with_capacity(trials),
    };

    for _ in 0..trials {
        let price = sample_uniform(rng, request.precio_energia_range);
        let production = sample_uniform(rng, request.produccion_solar_range);
        let consumption = sample_uniform(rng, request.consumo_energia_range);

        // Energy still bought from the grid once solar production is used up
        let grid_energy = (consumption - production).max(0.0);
        let daily_grid_cost = grid_energy * price;
        let annual_saving = daily_grid_cost * 365.0;

        let payback_years = REFERENCE_INVESTMENT / annual_saving;
        let roi = annual_saving * 100.0 / REFERENCE_INVESTMENT;
        let npv = annual_saving / (1.0 + DISCOUNT_RATE).powf(payback_years);

        simulation.annual_savings.push(annual_saving);
        simulation.payback_periods.push(payback_years);
        simulation.rois.push(roi);
        simulation.net_present_values.push(npv);
        simulation.sampled_production.push(production);
    }

    Ok(simulation)
}

fn sample_uniform<R: Rng>(rng: &mut R, range: [f64; 2]) -> f64 {
    let [low, high] = range;
    if low == high {
        return low;
    }
    rng.gen_range(low..high)
}
