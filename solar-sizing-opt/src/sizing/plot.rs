use plotters::prelude::*;

/// Draws the solved daily schedule: state of charge as a line over the two
/// forecast series drawn as paired bars.
pub fn plot_soc_schedule(
    state_of_charge: &[f64],
    solar: &[f64],
    consumption: &[f64],
    filename: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let root = BitMapBackend::new(filename, (800, 600)).into_drawing_area();
    root.fill(&WHITE)?;

    let y_max = state_of_charge
        .iter()
        .chain(solar.iter())
        .chain(consumption.iter())
        .fold(0f64, |a, &b| a.max(b));
    let y_min = state_of_charge.iter().fold(0f64, |a, &b| a.min(b));

    let mut chart = ChartBuilder::on(&root)
        .caption("Daily Sizing Schedule", ("sans-serif", 30))
        .margin(20)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(-0.5f64..state_of_charge.len() as f64, y_min..y_max * 1.1)?;

    chart
        .configure_mesh()
        .x_desc("Day")
        .y_desc("Energy (kWh)")
        .draw()?;

    chart
        .draw_series(solar.iter().enumerate().map(|(i, &y)| {
            Rectangle::new([(i as f64 - 0.35, 0.0), (i as f64 - 0.05, y)], BLUE.filled())
        }))?
        .label("Solar yield per m²")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 10, y)], &BLUE));

    chart
        .draw_series(consumption.iter().enumerate().map(|(i, &y)| {
            Rectangle::new([(i as f64 + 0.05, 0.0), (i as f64 + 0.35, y)], GREEN.filled())
        }))?
        .label("Consumption")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 10, y)], &GREEN));

    chart
        .draw_series(LineSeries::new(
            state_of_charge
                .iter()
                .enumerate()
                .map(|(i, &y)| (i as f64, y)),
            &RED,
        ))?
        .label("State of charge")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 10, y)], &RED));

    chart.draw_series(PointSeries::of_element(
        state_of_charge
            .iter()
            .enumerate()
            .map(|(i, &y)| (i as f64, y)),
        4,
        &RED,
        &|c, s, st| EmptyElement::at(c) + Circle::new((0, 0), s, st.filled()),
    ))?;

    chart.configure_series_labels().draw()?;
    root.present()?;
    tracing::debug!(filename, "schedule plot saved");
    Ok(())
}
