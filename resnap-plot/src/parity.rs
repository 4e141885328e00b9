use plotters::prelude::*;

use super::{extent, linear_fit, Result};

const DEEP_SKY_BLUE: RGBColor = RGBColor(0, 191, 255);

/// Scatter true values (x) against predictions (y) together with their least squares fit line
///
/// # Arguments:
/// points: (true, predicted) pairs
/// unit: Unit shown on both axes, e.g. `eV/atom`
/// filename: Where to save the png
/// dims: Image dimensions in pixels
pub fn plot_parity(
    points: &[(f64, f64)],
    unit: &str,
    filename: &str,
    dims: (u32, u32),
) -> Result<()> {
    info!("n_points: {}, plotting to {}", points.len(), filename);

    let (x_range, y_range) = extent(points);

    let root_area = BitMapBackend::new(filename, dims).into_drawing_area();
    root_area.fill(&WHITE)?;

    let mut cc0 = ChartBuilder::on(&root_area)
        .margin(5)
        .set_all_label_area_size(60)
        .caption(filename, ("sans-serif", 20).into_font().with_color(&BLACK))
        .build_cartesian_2d(x_range.clone(), y_range)?;
    cc0.configure_mesh()
        .x_labels(10)
        .y_labels(10)
        .x_desc(format!("y ({})", unit))
        .y_desc(format!("y_hat ({})", unit))
        .x_label_formatter(&|v| format!("{:.3}", v))
        .y_label_formatter(&|v| format!("{:.3}", v))
        .draw()?;

    if let Some((slope, intercept)) = linear_fit(points) {
        let line = vec![
            (x_range.start, slope * x_range.start + intercept),
            (x_range.end, slope * x_range.end + intercept),
        ];
        cc0.draw_series(LineSeries::new(line, RED.mix(0.3).stroke_width(3)))?;
    }
    cc0.draw_series(
        points.iter().map(|(x, y)| Circle::new((*x, *y), 3, DEEP_SKY_BLUE.mix(0.3).filled())),
    )?;

    root_area.present()?;
    info!("successfully plotted to {}", filename);

    Ok(())
}
