#[macro_use]
extern crate log;

use std::ops::Range;

mod heat;
mod parity;
mod sweep;

pub use heat::plot_parity_heat;
pub use parity::plot_parity;
pub use sweep::plot_sweep;

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;

/// Least squares line `y = slope * x + intercept` through the points.
/// `None` if there are fewer than two distinct x values.
pub fn linear_fit(points: &[(f64, f64)]) -> Option<(f64, f64)> {
    let n = points.len() as f64;
    if points.len() < 2 {
        return None;
    }
    let mean_x = points.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = points.iter().map(|p| p.1).sum::<f64>() / n;

    let mut sxx = 0.0;
    let mut sxy = 0.0;
    for (x, y) in points {
        sxx += (x - mean_x) * (x - mean_x);
        sxy += (x - mean_x) * (y - mean_y);
    }
    if sxx == 0.0 {
        return None;
    }
    let slope = sxy / sxx;

    Some((slope, mean_y - slope * mean_x))
}

/// Axis range from `lo` to `hi`, widened when it would be empty
pub fn padded_range(lo: f64, hi: f64) -> Range<f64> {
    if hi > lo {
        return lo..hi;
    }
    let pad = if lo.abs() > 0.0 { lo.abs() * 0.05 } else { 1e-3 };

    lo - pad..hi + pad
}

/// Ranges covering all x and all y values of the points
pub(crate) fn extent(points: &[(f64, f64)]) -> (Range<f64>, Range<f64>) {
    let mut x_min = f64::MAX;
    let mut x_max = f64::MIN;
    let mut y_min = f64::MAX;
    let mut y_max = f64::MIN;
    for (x, y) in points {
        x_min = x_min.min(*x);
        x_max = x_max.max(*x);
        y_min = y_min.min(*y);
        y_max = y_max.max(*y);
    }
    if points.is_empty() {
        return (padded_range(0.0, 0.0), padded_range(0.0, 0.0));
    }

    (padded_range(x_min, x_max), padded_range(y_min, y_max))
}
