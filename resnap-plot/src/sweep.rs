use plotters::prelude::*;

use super::{padded_range, Result};

/// Mean validation error against the position of each hyperparameter in the sweep.
/// The x axis is labelled with the hyperparameter values and the y axis is limited to `bounds`.
pub fn plot_sweep(
    params: &[f64],
    errors: &[f64],
    bounds: (f64, f64),
    filename: &str,
    dims: (u32, u32),
) -> Result<()> {
    if errors.is_empty() || params.len() != errors.len() {
        return Err(format!(
            "cannot plot {} errors against {} hyperparameters",
            errors.len(),
            params.len()
        )
        .into());
    }
    info!("plotting sweep of {} hyperparameters to {}", params.len(), filename);

    let points: Vec<(f64, f64)> = errors.iter().enumerate().map(|(i, e)| (i as f64, *e)).collect();

    let root_area = BitMapBackend::new(filename, dims).into_drawing_area();
    root_area.fill(&WHITE)?;

    let label_of = |v: &f64| {
        let i = v.round();
        if (v - i).abs() < 1e-6 && i >= 0.0 && (i as usize) < params.len() {
            format!("{}", params[i as usize])
        } else {
            String::new()
        }
    };
    let mut cc0 = ChartBuilder::on(&root_area)
        .margin(5)
        .set_all_label_area_size(60)
        .build_cartesian_2d(-0.5..errors.len() as f64 - 0.5, padded_range(bounds.0, bounds.1))?;
    cc0.configure_mesh()
        .x_labels(errors.len())
        .x_label_formatter(&label_of)
        .y_label_formatter(&|v| format!("{:.4}", v))
        .x_desc("Hyperparameter")
        .y_desc("Mean validation error (eV/atom)")
        .draw()?;

    cc0.draw_series(LineSeries::new(points.clone(), RED.stroke_width(2)))?;
    cc0.draw_series(points.iter().map(|p| Circle::new(*p, 6, RED.filled())))?;

    root_area.present()?;
    info!("successfully plotted to {}", filename);

    Ok(())
}
