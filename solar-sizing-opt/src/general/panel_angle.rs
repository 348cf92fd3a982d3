use rand::Rng;
use sizing_model::sizing::PanelAngleRequest;

use crate::sizing::error::SizingError;

// Search bounds and grid resolution for the orientation hill-climb
const TILT_MIN: f64 = 0.0;
const TILT_MAX: f64 = 90.0;
const AZIMUTH_MIN: f64 = -180.0;
const AZIMUTH_MAX: f64 = 180.0;
const COARSE_TILT_STEP: f64 = 5.0;
const COARSE_AZIMUTH_STEP: f64 = 10.0;
const REFINE_TOLERANCE: f64 = 1e-3;

// Hourly irradiance varies around the daily mean by this uniform band
const IRRADIANCE_NOISE_LOW: f64 = 0.7;
const IRRADIANCE_NOISE_HIGH: f64 = 1.3;

/// Optimal orientation of one daylight hour.
#[derive(Debug, Clone, PartialEq)]
pub struct HourlyOrientation {
    pub hour: u32,
    /// Sampled irradiance for this hour (kWh/m²)
    pub irradiance_kwh_m2: f64,
    pub tilt_deg: f64,
    pub azimuth_deg: f64,
    pub energy_kwh: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PanelAngleResult {
    pub hours: Vec<HourlyOrientation>,
    pub total_energy_kwh: f64,
}

/// Energy captured by a panel at orientation (tilt, azimuth) under a sun at
/// (altitude, azimuth), both solar angles in radians, panel angles in degrees.
fn captured_energy(
    tilt_deg: f64,
    azimuth_deg: f64,
    sun_altitude_rad: f64,
    sun_azimuth_rad: f64,
    area_m2: f64,
    efficiency: f64,
    irradiance: f64,
) -> f64 {
    let tilt = tilt_deg.to_radians();
    let azimuth = azimuth_deg.to_radians();
    area_m2
        * efficiency
        * irradiance
        * (tilt.sin() * sun_altitude_rad.sin()
            + tilt.cos() * sun_altitude_rad.cos() * (azimuth - sun_azimuth_rad).cos())
}

/// Finds the orientation maximizing [`captured_energy`] for one sun position.
///
/// Coarse grid scan followed by a shrinking-step pattern search around the
/// best grid point. Each hour is an independent problem, so there is no
/// state carried between calls.
fn optimize_orientation(
    sun_altitude_rad: f64,
    sun_azimuth_rad: f64,
    area_m2: f64,
    efficiency: f64,
    irradiance: f64,
) -> (f64, f64, f64) {
    let energy =
        |tilt: f64, azimuth: f64| -> f64 {
            captured_energy(
                tilt,
                azimuth,
                sun_altitude_rad,
                sun_azimuth_rad,
                area_m2,
                efficiency,
                irradiance,
            )
        };

    // Coarse scan over the whole feasible rectangle
    let mut best_tilt = TILT_MIN;
    let mut best_azimuth = AZIMUTH_MIN;
    let mut best_energy = f64::NEG_INFINITY;

    let mut tilt = TILT_MIN;
    while tilt <= TILT_MAX {
        let mut azimuth = AZIMUTH_MIN;
        while azimuth <= AZIMUTH_MAX {
            let e = energy(tilt, azimuth);
            if e > best_energy {
                best_energy = e;
                best_tilt = tilt;
                best_azimuth = azimuth;
            }
            azimuth += COARSE_AZIMUTH_STEP;
        }
        tilt += COARSE_TILT_STEP;
    }

    // Pattern search: halve the step whenever no neighbour improves
    let mut tilt_step = COARSE_TILT_STEP / 2.0;
    let mut azimuth_step = COARSE_AZIMUTH_STEP / 2.0;
    while tilt_step > REFINE_TOLERANCE || azimuth_step > REFINE_TOLERANCE {
        let mut improved = false;
        let candidates = [
            (best_tilt + tilt_step, best_azimuth),
            (best_tilt - tilt_step, best_azimuth),
            (best_tilt, best_azimuth + azimuth_step),
            (best_tilt, best_azimuth - azimuth_step),
        ];
        for (tilt, azimuth) in candidates {
            let tilt = tilt.clamp(TILT_MIN, TILT_MAX);
            let azimuth = azimuth.clamp(AZIMUTH_MIN, AZIMUTH_MAX);
            let e = energy(tilt, azimuth);
            if e > best_energy {
                best_energy = e;
                best_tilt = tilt;
                best_azimuth = azimuth;
                improved = true;
            }
        }
        if !improved {
            tilt_step /= 2.0;
            azimuth_step /= 2.0;
        }
    }

    (best_tilt, best_azimuth, best_energy)
}

/// Solar altitude and azimuth (radians) of the simplified daily sun path.
fn sun_position(hour: u32) -> (f64, f64) {
    let h = hour as f64;
    let altitude_deg = 45.0 + 15.0 * ((h - 12.0) * std::f64::consts::PI / 12.0).sin();
    let azimuth_deg = (h - 12.0) * 15.0;
    (altitude_deg.to_radians(), azimuth_deg.to_radians())
}

/// Optimizes the panel orientation hour by hour across the daylight window.
///
/// Hours run from 06:00 for `horas_sol` hours; hourly irradiance is the daily
/// mean scaled by a uniform random factor, so callers that need reproducible
/// schedules must pass a seeded generator.
pub fn optimize_panel_angles<R: Rng>(
    request: &PanelAngleRequest,
    rng: &mut R,
) -> Result<PanelAngleResult, SizingError> {
    if !request.area_m2.is_finite() || request.area_m2 <= 0.0 {
        return Err(SizingError::invalid_parameter(
            "A",
            format!("panel area must be positive, got {}", request.area_m2),
        ));
    }
    if !request.eta.is_finite() || request.eta <= 0.0 || request.eta > 1.0 {
        return Err(SizingError::invalid_parameter(
            "eta",
            format!("panel efficiency must lie in (0, 1], got {}", request.eta),
        ));
    }
    if !request.mean_irradiance.is_finite() || request.mean_irradiance < 0.0 {
        return Err(SizingError::invalid_parameter(
            "I_promedio",
            format!(
                "mean irradiance must be non-negative, got {}",
                request.mean_irradiance
            ),
        ));
    }
    if request.horas_sol == 0 || request.horas_sol > 18 {
        return Err(SizingError::invalid_parameter(
            "horas_sol",
            format!("daylight hours must lie in 1..=18, got {}", request.horas_sol),
        ));
    }

    let mut hours = Vec::with_capacity(request.horas_sol as usize);
    let mut total_energy_kwh = 0.0;

    for hour in 6..6 + request.horas_sol {
        let (sun_altitude, sun_azimuth) = sun_position(hour);
        let irradiance =
            request.mean_irradiance * rng.gen_range(IRRADIANCE_NOISE_LOW..=IRRADIANCE_NOISE_HIGH);

        let (tilt_deg, azimuth_deg, energy_kwh) = optimize_orientation(
            sun_altitude,
            sun_azimuth,
            request.area_m2,
            request.eta,
            irradiance,
        );

        total_energy_kwh += energy_kwh;
        hours.push(HourlyOrientation {
            hour,
            irradiance_kwh_m2: irradiance,
            tilt_deg,
            azimuth_deg,
            energy_kwh,
        });
    }

    Ok(PanelAngleResult {
        hours,
        total_energy_kwh,
    })
}
