use std::{
    fs::File,
    io::{BufRead, BufReader, BufWriter, Write},
    path::Path,
};

use lin_reg::{LinReg, ModelKind};
use nalgebra::DVector;

use crate::{Dataset, Error, NormalizationState, Result};

/// Default name of the written potential file
pub const POTENTIAL_FILE_NAME: &str = "re_potential";

/// Fits one model on the whole dataset and persists its coefficients
#[derive(Debug, Clone)]
pub struct PotentialFitter<'a> {
    dataset: &'a Dataset,
    kind: ModelKind,
    normalization: Option<&'a NormalizationState>,
    file_name: String,
}

impl<'a> PotentialFitter<'a> {
    /// # Arguments:
    /// dataset: The (possibly normalized) training data
    /// kind: Which penalized model to fit
    /// normalization: The scales `dataset` was normalized with, if any
    pub fn new(
        dataset: &'a Dataset,
        kind: ModelKind,
        normalization: Option<&'a NormalizationState>,
    ) -> Self {
        Self {
            dataset,
            kind,
            normalization,
            file_name: POTENTIAL_FILE_NAME.to_string(),
        }
    }

    /// Name of the file created inside the output directory
    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = file_name.into();
        self
    }

    /// Fitted coefficients in terms of the raw, unnormalized features
    pub fn fit(&self, alpha: f64, max_iter: usize, tol: f64) -> Result<DVector<f64>> {
        let model = self
            .kind
            .regressor(alpha, max_iter, tol)
            .fit(self.dataset.x(), self.dataset.y())?;
        info!("Fitted potential: {}", model.coefficients.transpose());

        match self.normalization {
            Some(state) => {
                let potential = state.unscale(&model.coefficients)?;
                info!("Fitted unnormalized potential: {}", potential.transpose());
                Ok(potential)
            }
            None => Ok(model.coefficients),
        }
    }

    /// Fit and write the potential to `<output_dir>/<file_name>`, replacing any existing file
    pub fn fit_and_save(
        &self,
        output_dir: impl AsRef<Path>,
        alpha: f64,
        max_iter: usize,
        tol: f64,
    ) -> Result<DVector<f64>> {
        let potential = self.fit(alpha, max_iter, tol)?;
        let path = output_dir.as_ref().join(&self.file_name);
        write_potential(&path, &potential)?;
        info!("wrote {} coefficients to {}", potential.len(), path.display());

        Ok(potential)
    }
}

/// One coefficient per line, formatted so that parsing it back gives the same value
pub fn write_potential(path: impl AsRef<Path>, potential: &DVector<f64>) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    for c in potential.iter() {
        writeln!(writer, "{}", c)?;
    }
    writer.flush()?;

    Ok(())
}

/// Read a potential file back into its coefficients
pub fn read_potential(path: impl AsRef<Path>) -> Result<Vec<f64>> {
    let reader = BufReader::new(File::open(path)?);
    let mut potential: Vec<f64> = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        potential.push(line.parse().map_err(|_| Error::Parse {
            context: format!("potential line {}", i + 1),
            value: line.to_string(),
        })?);
    }

    Ok(potential)
}
