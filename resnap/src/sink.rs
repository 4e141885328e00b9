use crate::{PlotMode, Result, Split};

/// Receives the figures produced by cross validation.
/// Implementations only render, nothing they do flows back into training.
pub trait PlottingSink {
    /// True against predicted energies of one split of fold 0
    fn parity(&mut self, split: Split, mode: PlotMode, alpha: f64, points: &[(f64, f64)])
        -> Result<()>;

    /// Mean validation error of every alpha in the sweep, y axis limited to `bounds`
    fn sweep(&mut self, alphas: &[f64], errors: &[f64], bounds: (f64, f64)) -> Result<()>;
}

/// Discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl PlottingSink for NullSink {
    fn parity(&mut self, _: Split, _: PlotMode, _: f64, _: &[(f64, f64)]) -> Result<()> {
        Ok(())
    }

    fn sweep(&mut self, _: &[f64], _: &[f64], _: (f64, f64)) -> Result<()> {
        Ok(())
    }
}

#[cfg(feature = "plot")]
pub use png::PngSink;

#[cfg(feature = "plot")]
mod png {
    use std::path::{Path, PathBuf};

    use super::PlottingSink;
    use crate::{Error, PlotMode, Result, Split};

    /// Writes every figure as a png into a directory
    #[derive(Debug, Clone)]
    pub struct PngSink {
        dir: PathBuf,
        dims: (u32, u32),
        heatmap: bool,
    }

    impl PngSink {
        /// Render into `dir`, creating it if needed
        pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
            std::fs::create_dir_all(dir.as_ref())?;

            Ok(Self {
                dir: dir.as_ref().to_path_buf(),
                dims: (1080, 1080),
                heatmap: false,
            })
        }

        /// Image size in pixels
        pub fn with_dims(mut self, dims: (u32, u32)) -> Self {
            self.dims = dims;
            self
        }

        /// Additionally render a density heatmap for every per-atom parity plot
        pub fn with_heatmap(mut self, heatmap: bool) -> Self {
            self.heatmap = heatmap;
            self
        }

        fn file(&self, name: String) -> String {
            self.dir.join(name).to_string_lossy().into_owned()
        }
    }

    impl PlottingSink for PngSink {
        fn parity(
            &mut self,
            split: Split,
            mode: PlotMode,
            alpha: f64,
            points: &[(f64, f64)],
        ) -> Result<()> {
            let unit = match mode {
                PlotMode::Atom => "eV/atom",
                PlotMode::Sample => "eV",
            };
            let filename = self.file(format!("parity_{}_{}_alpha_{}.png", mode, split, alpha));
            resnap_plot::plot_parity(points, unit, &filename, self.dims)
                .map_err(|e| Error::Plot(e.to_string()))?;

            if self.heatmap && mode == PlotMode::Atom {
                let filename = self.file(format!("heat_{}_alpha_{}.png", split, alpha));
                resnap_plot::plot_parity_heat(points, 300, &filename, self.dims)
                    .map_err(|e| Error::Plot(e.to_string()))?;
            }

            Ok(())
        }

        fn sweep(&mut self, alphas: &[f64], errors: &[f64], bounds: (f64, f64)) -> Result<()> {
            let filename = self.file("cross_validation.png".to_string());
            resnap_plot::plot_sweep(alphas, errors, bounds, &filename, self.dims)
                .map_err(|e| Error::Plot(e.to_string()))
        }
    }
}
