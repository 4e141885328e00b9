use std::ops::Range;

use plotters::{prelude::*, style::HSLColor};

use super::{extent, Result};

/// 2-D density heatmap of true values (x) against predictions (y).
/// Empty bins are left blank, occupied ones go from blue (sparse) to red (dense).
pub fn plot_parity_heat(
    points: &[(f64, f64)],
    bins: usize,
    filename: &str,
    dims: (u32, u32),
) -> Result<()> {
    if bins == 0 {
        return Err("heatmap needs at least one bin per axis".into());
    }
    let (x_range, y_range) = extent(points);
    let counts = histogram_2d(points, bins, &x_range, &y_range);
    let max_count = counts.iter().flatten().copied().max().unwrap_or(0).max(1) as f64;
    debug!("heatmap with {}x{} bins, densest bin holds {}", bins, bins, max_count);

    let root_area = BitMapBackend::new(filename, dims).into_drawing_area();
    root_area.fill(&WHITE)?;

    let mut cc0 = ChartBuilder::on(&root_area)
        .margin(5)
        .set_all_label_area_size(60)
        .caption(filename, ("sans-serif", 20).into_font().with_color(&BLACK))
        .build_cartesian_2d(x_range.clone(), y_range.clone())?;
    cc0.configure_mesh()
        .disable_mesh()
        .x_desc("y (eV/atom)")
        .y_desc("y_hat (eV/atom)")
        .x_label_formatter(&|v| format!("{:.3}", v))
        .y_label_formatter(&|v| format!("{:.3}", v))
        .draw()?;

    let dx = (x_range.end - x_range.start) / bins as f64;
    let dy = (y_range.end - y_range.start) / bins as f64;
    cc0.draw_series(counts.iter().enumerate().flat_map(|(i, row)| {
        let x0 = x_range.start + i as f64 * dx;
        let y_start = y_range.start;
        row.iter().enumerate().filter(|(_, c)| **c > 0).map(move |(j, c)| {
            let y0 = y_start + j as f64 * dy;
            let density = *c as f64 / max_count;
            Rectangle::new(
                [(x0, y0), (x0 + dx, y0 + dy)],
                HSLColor(0.66 * (1.0 - density), 1.0, 0.5).filled(),
            )
        })
    }))?;

    root_area.present()?;
    info!("successfully plotted heatmap to {}", filename);

    Ok(())
}

/// Count points per cell, indexed as `counts[x_bin][y_bin]`
pub(crate) fn histogram_2d(
    points: &[(f64, f64)],
    bins: usize,
    x_range: &Range<f64>,
    y_range: &Range<f64>,
) -> Vec<Vec<usize>> {
    let mut counts = vec![vec![0; bins]; bins];
    let bin_of = |v: f64, r: &Range<f64>| -> usize {
        let frac = (v - r.start) / (r.end - r.start);
        ((frac * bins as f64) as usize).min(bins - 1)
    };
    for (x, y) in points {
        counts[bin_of(*x, x_range)][bin_of(*y, y_range)] += 1;
    }

    counts
}
