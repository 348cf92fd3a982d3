use good_lp::{Expression, Solver, SolverModel, constraint, variable};
use good_lp::{ResolutionError, variables};
use sizing_model::sizing::{BatteryParameters, CostParameters, ForecastSeries, SizingRequest};

use crate::sizing::error::{SizingError, SolutionStatus};

/// Decision variables of one sizing run, created fresh per request.
struct SizingVariables {
    /// X1: installed panel area (m²), bounded [0, X_max]
    panel_area: good_lp::Variable,
    /// X2: installed battery capacity (kWh), bounded [0, ∞)
    battery_capacity: good_lp::Variable,
    /// X3[k]: end-of-day state of charge (kWh), one per planning day
    state_of_charge: Vec<good_lp::Variable>,
    /// Positive part of X3[k] − γ·X2
    surplus: Vec<good_lp::Variable>,
    /// Negative part of X3[k] − γ·X2
    deficit: Vec<good_lp::Variable>,
}

/// Solved sizing decision, the only output exposed across the boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct SizingResult {
    pub panel_area_m2: f64,
    pub battery_capacity_kwh: f64,
    /// End-of-day state of charge, same order and length as the input series.
    pub state_of_charge_kwh: Vec<f64>,
}

/// Verifies that both forecast series have exactly the horizon's length.
///
/// Runs before any decision variable is created, since the variable count
/// depends on the horizon.
pub fn check_series_lengths(
    horizon_days: usize,
    forecast: &ForecastSeries,
) -> Result<(), SizingError> {
    if forecast.solar_yield_kwh_per_m2.len() != horizon_days {
        return Err(SizingError::DimensionMismatch {
            series: "generacion_solar",
            expected: horizon_days,
            actual: forecast.solar_yield_kwh_per_m2.len(),
        });
    }
    if forecast.consumption_kwh.len() != horizon_days {
        return Err(SizingError::DimensionMismatch {
            series: "consumo_energia",
            expected: horizon_days,
            actual: forecast.consumption_kwh.len(),
        });
    }
    Ok(())
}

fn validate_parameters(
    horizon_days: usize,
    costs: &CostParameters,
    battery: &BatteryParameters,
    forecast: &ForecastSeries,
) -> Result<(), SizingError> {
    if horizon_days == 0 {
        return Err(SizingError::invalid_parameter(
            "K",
            "planning horizon must be at least 1 day",
        ));
    }

    let cost_fields = [
        ("c1", costs.panel_cost_per_m2),
        ("c2", costs.battery_cost_per_kwh),
        ("c3", costs.surplus_cost_per_kwh),
        ("c4", costs.deficit_cost_per_kwh),
    ];
    for (name, value) in cost_fields {
        if !value.is_finite() || value < 0.0 {
            return Err(SizingError::InvalidParameter {
                name,
                reason: format!("cost must be a non-negative number, got {value}"),
            });
        }
    }

    let gamma = battery.round_trip_efficiency;
    if !gamma.is_finite() || gamma <= 0.0 || gamma > 1.0 {
        return Err(SizingError::invalid_parameter(
            "gamma",
            format!("round-trip efficiency must lie in (0, 1], got {gamma}"),
        ));
    }
    if !battery.max_rate_fraction.is_finite() || battery.max_rate_fraction <= 0.0 {
        return Err(SizingError::invalid_parameter(
            "r",
            format!(
                "charge/discharge rate fraction must be positive, got {}",
                battery.max_rate_fraction
            ),
        ));
    }
    // X_max = 0 is left to the coverage constraint: the model becomes
    // infeasible and the caller sees NoOptimalSolution, not InvalidParameter.
    if !battery.max_panel_area_m2.is_finite() || battery.max_panel_area_m2 < 0.0 {
        return Err(SizingError::invalid_parameter(
            "X_max",
            format!(
                "maximum panel area must be non-negative, got {}",
                battery.max_panel_area_m2
            ),
        ));
    }

    if forecast
        .solar_yield_kwh_per_m2
        .iter()
        .any(|v| !v.is_finite() || *v < 0.0)
    {
        return Err(SizingError::invalid_parameter(
            "generacion_solar",
            "solar yield values must be non-negative numbers",
        ));
    }
    if forecast
        .consumption_kwh
        .iter()
        .any(|v| !v.is_finite() || *v < 0.0)
    {
        return Err(SizingError::invalid_parameter(
            "consumo_energia",
            "consumption values must be non-negative numbers",
        ));
    }

    Ok(())
}

/// Sizes the panel area and battery capacity for one forecast horizon.
///
/// Builds the LP (or MILP, when `integer_sizing` is set) described by the
/// request parameters, hands it to the given solver backend and maps the
/// solved variables back into a [`SizingResult`]. Model construction is a
/// pure function of its inputs: identical requests build identical models.
pub fn run_sizing<S: Solver>(
    horizon_days: usize,
    costs: &CostParameters,
    battery: &BatteryParameters,
    forecast: &ForecastSeries,
    integer_sizing: bool,
    solver: S,
) -> Result<SizingResult, SizingError>
where
    S::Model: SolverModel<Error = ResolutionError>,
{
    check_series_lengths(horizon_days, forecast)?;
    validate_parameters(horizon_days, costs, battery, forecast)?;

    let gamma = battery.round_trip_efficiency;
    let rate = battery.max_rate_fraction;
    let solar = &forecast.solar_yield_kwh_per_m2;
    let consumption = &forecast.consumption_kwh;

    let mut vars = variables!();

    // Sizing variables switch domain on the deployment flag; the constraint
    // system below is built once, identically for both domains.
    let (panel_area, battery_capacity) = if integer_sizing {
        (
            vars.add(
                variable()
                    .integer()
                    .min(0.0)
                    .max(battery.max_panel_area_m2),
            ),
            vars.add(variable().integer().min(0.0)),
        )
    } else {
        (
            vars.add(variable().min(0.0).max(battery.max_panel_area_m2)),
            vars.add(variable().min(0.0)),
        )
    };

    let mut state_of_charge = Vec::with_capacity(horizon_days);
    let mut surplus = Vec::with_capacity(horizon_days);
    let mut deficit = Vec::with_capacity(horizon_days);
    for _k in 0..horizon_days {
        state_of_charge.push(vars.add(variable().min(0.0)));
        surplus.push(vars.add(variable().min(0.0)));
        deficit.push(vars.add(variable().min(0.0)));
    }

    // Minimize capital cost plus the per-day surplus/deficit penalties.
    let mut objective = Expression::default();
    objective += costs.panel_cost_per_m2 * panel_area;
    objective += costs.battery_cost_per_kwh * battery_capacity;
    for k in 0..horizon_days {
        objective += costs.surplus_cost_per_kwh * surplus[k];
        objective += costs.deficit_cost_per_kwh * deficit[k];
    }

    let sizing_vars = SizingVariables {
        panel_area,
        battery_capacity,
        state_of_charge,
        surplus,
        deficit,
    };

    let mut model = vars.minimise(objective).using(solver);
    model = add_period_constraints(model, &sizing_vars, gamma, rate, solar, consumption);

    // Horizon-wide coverage cut: total generation must at least match total
    // consumption. Redundant with the per-day balance in the idealized sense,
    // kept as an explicit infeasibility pre-filter.
    let total_solar_yield = forecast.total_solar_yield();
    let total_consumption = forecast.total_consumption();
    model = model.with(constraint!(
        total_solar_yield * sizing_vars.panel_area >= total_consumption
    ));

    match model.solve() {
        Ok(solution) => Ok(extract_result(&solution, &sizing_vars, integer_sizing)),
        Err(ResolutionError::Infeasible) => {
            Err(SizingError::NoOptimalSolution(SolutionStatus::Infeasible))
        }
        Err(ResolutionError::Unbounded) => {
            Err(SizingError::NoOptimalSolution(SolutionStatus::Unbounded))
        }
        Err(e) => {
            tracing::error!(error = ?e, "sizing engine terminated abnormally");
            Err(SizingError::NoOptimalSolution(SolutionStatus::SolverError))
        }
    }
}

/// Adds the per-day energy balance, penalty bounds and rate limits.
fn add_period_constraints<M>(
    mut model: M,
    vars: &SizingVariables,
    gamma: f64,
    rate: f64,
    solar: &[f64],
    consumption: &[f64],
) -> M
where
    M: SolverModel,
{
    let soc = &vars.state_of_charge;
    let horizon_days = soc.len();

    for k in 0..horizon_days {
        let solar_k = solar[k];
        let consumption_k = consumption[k];

        // State-of-charge recurrence, with an implicit empty battery before
        // the first day. This couples the panel-area variable into every
        // day's balance and every day's state to its predecessor.
        if k == 0 {
            model = model.with(constraint!(
                soc[0] - solar_k * vars.panel_area == -consumption_k
            ));
        } else {
            model = model.with(constraint!(
                soc[k] - gamma * soc[k - 1] - solar_k * vars.panel_area == -consumption_k
            ));
        }

        // surplus/deficit are the positive/negative parts of
        // X3[k] − γ·X2, kept linear via two one-sided inequalities.
        model = model.with(constraint!(
            vars.surplus[k] - soc[k] + gamma * vars.battery_capacity >= 0.0
        ));
        model = model.with(constraint!(
            vars.deficit[k] + soc[k] - gamma * vars.battery_capacity >= 0.0
        ));

        // SoC can never exceed the installed capacity.
        model = model.with(constraint!(vars.battery_capacity - soc[k] >= 0.0));
    }

    // Adjacent-day charge and discharge rate limits.
    for k in 1..horizon_days {
        model = model.with(constraint!(
            soc[k] - soc[k - 1] - rate * vars.battery_capacity <= 0.0
        ));
        model = model.with(constraint!(
            soc[k - 1] - soc[k] - rate * vars.battery_capacity <= 0.0
        ));
    }

    model
}

/// Maps an optimal assignment back into domain values.
///
/// When integer sizing is configured the sizing variables are truncated
/// toward zero, matching the solver's own integer representation; no extra
/// rounding is introduced here.
fn extract_result(
    solution: &dyn good_lp::Solution,
    vars: &SizingVariables,
    integer_sizing: bool,
) -> SizingResult {
    let mut panel_area_m2 = solution.value(vars.panel_area);
    let mut battery_capacity_kwh = solution.value(vars.battery_capacity);
    if integer_sizing {
        panel_area_m2 = panel_area_m2.trunc();
        battery_capacity_kwh = battery_capacity_kwh.trunc();
    }

    SizingResult {
        panel_area_m2,
        battery_capacity_kwh,
        state_of_charge_kwh: vars
            .state_of_charge
            .iter()
            .map(|&v| solution.value(v))
            .collect(),
    }
}

/// Runs the sizing directly from the wire request.
pub fn run_sizing_from_request<S: Solver>(
    request: &SizingRequest,
    integer_sizing: bool,
    solver: S,
) -> Result<SizingResult, SizingError>
where
    S::Model: SolverModel<Error = ResolutionError>,
{
    run_sizing(
        request.horizon_days,
        &request.cost_parameters(),
        &request.battery_parameters(),
        &request.forecast(),
        integer_sizing,
        solver,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 1e-3;

    fn reference_costs() -> CostParameters {
        CostParameters {
            panel_cost_per_m2: 100.0,
            battery_cost_per_kwh: 500.0,
            surplus_cost_per_kwh: 0.05,
            deficit_cost_per_kwh: 0.25,
        }
    }

    fn reference_battery() -> BatteryParameters {
        BatteryParameters {
            round_trip_efficiency: 0.9,
            max_rate_fraction: 0.2,
            max_panel_area_m2: 20.0,
        }
    }

    fn reference_forecast() -> ForecastSeries {
        ForecastSeries::new(vec![4.5, 5.0, 4.8], vec![5.5, 6.0, 7.2])
    }

    fn solve_reference() -> SizingResult {
        run_sizing(
            3,
            &reference_costs(),
            &reference_battery(),
            &reference_forecast(),
            false,
            good_lp::clarabel,
        )
        .unwrap()
    }

    #[test]
    fn test_reference_scenario_sizes_within_bounds() {
        let result = solve_reference();

        assert_eq!(result.state_of_charge_kwh.len(), 3);
        assert!(result.panel_area_m2 >= -TOL);
        assert!(result.panel_area_m2 <= 20.0 + TOL);
        assert!(result.battery_capacity_kwh >= -TOL);
        for &soc in &result.state_of_charge_kwh {
            assert!(soc >= -TOL);
            assert!(soc <= result.battery_capacity_kwh + TOL);
        }
    }

    #[test]
    fn test_state_of_charge_follows_recurrence() {
        let forecast = reference_forecast();
        let battery = reference_battery();
        let result = solve_reference();

        let gamma = battery.round_trip_efficiency;
        let mut previous = 0.0;
        for k in 0..3 {
            let expected = gamma * previous
                + result.panel_area_m2 * forecast.solar_yield_kwh_per_m2[k]
                - forecast.consumption_kwh[k];
            assert!(
                (result.state_of_charge_kwh[k] - expected).abs() < TOL,
                "day {k}: got {}, expected {expected}",
                result.state_of_charge_kwh[k]
            );
            previous = result.state_of_charge_kwh[k];
        }
    }

    #[test]
    fn test_rate_limits_hold_between_adjacent_days() {
        let battery = reference_battery();
        let result = solve_reference();

        let cap = battery.max_rate_fraction * result.battery_capacity_kwh;
        for k in 1..3 {
            let swing = result.state_of_charge_kwh[k] - result.state_of_charge_kwh[k - 1];
            assert!(swing.abs() <= cap + TOL, "day {k}: swing {swing} > {cap}");
        }
    }

    #[test]
    fn test_identical_inputs_produce_identical_results() {
        let first = solve_reference();
        let second = solve_reference();
        assert_eq!(first, second);
    }

    #[test]
    fn test_raising_panel_cost_never_raises_panel_area() {
        let cheap = solve_reference();

        let mut expensive_costs = reference_costs();
        expensive_costs.panel_cost_per_m2 = 400.0;
        let expensive = run_sizing(
            3,
            &expensive_costs,
            &reference_battery(),
            &reference_forecast(),
            false,
            good_lp::clarabel,
        )
        .unwrap();

        assert!(expensive.panel_area_m2 <= cheap.panel_area_m2 + TOL);
    }

    #[test]
    fn test_mismatched_series_length_is_rejected_before_solving() {
        let forecast = ForecastSeries::new(vec![4.5, 5.0, 4.8], vec![5.5, 6.0, 7.2]);
        let err = run_sizing(
            5,
            &reference_costs(),
            &reference_battery(),
            &forecast,
            false,
            good_lp::clarabel,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            SizingError::DimensionMismatch {
                series: "generacion_solar",
                expected: 5,
                actual: 3,
            }
        ));
    }

    #[test]
    fn test_invalid_efficiency_is_rejected() {
        let mut battery = reference_battery();
        battery.round_trip_efficiency = 0.0;
        let err = run_sizing(
            3,
            &reference_costs(),
            &battery,
            &reference_forecast(),
            false,
            good_lp::clarabel,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            SizingError::InvalidParameter { name: "gamma", .. }
        ));
    }

    #[test]
    fn test_zero_panel_allowance_is_infeasible() {
        let mut battery = reference_battery();
        battery.max_panel_area_m2 = 0.0;
        let err = run_sizing(
            3,
            &reference_costs(),
            &battery,
            &reference_forecast(),
            false,
            good_lp::clarabel,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            SizingError::NoOptimalSolution(SolutionStatus::Infeasible)
        ));
    }

    #[test]
    fn test_integer_sizing_yields_whole_units() {
        let result = run_sizing(
            3,
            &reference_costs(),
            &reference_battery(),
            &reference_forecast(),
            true,
            good_lp::highs,
        )
        .unwrap();

        assert_eq!(result.panel_area_m2.fract(), 0.0);
        assert_eq!(result.battery_capacity_kwh.fract(), 0.0);
        assert_eq!(result.state_of_charge_kwh.len(), 3);
        assert!(result.panel_area_m2 <= 20.0 + TOL);
    }

    #[test]
    fn test_run_from_wire_request() {
        let request: SizingRequest = serde_json::from_str(
            r#"{
                "K": 3,
                "c1": 100, "c2": 500, "c3": 0.05, "c4": 0.25,
                "gamma": 0.9, "r": 0.2, "X_max": 20,
                "generacion_solar": [4.5, 5.0, 4.8],
                "consumo_energia": [5.5, 6.0, 7.2]
            }"#,
        )
        .unwrap();
        let result = run_sizing_from_request(&request, false, good_lp::clarabel).unwrap();
        assert_eq!(result, solve_reference());
    }
}
