use std::path::Path;

use lin_reg::ModelKind;
use nalgebra::DVector;

use crate::{
    load_dataset, CrossValidator, CvParams, CvReport, Dataset, NormKind, NormalizationState,
    PotentialFitter, Result,
};

/// Training data of one element together with the model kind used to fit it
#[derive(Debug, Clone)]
pub struct PotentialTrainer {
    dataset: Dataset,
    normalization: Option<NormalizationState>,
    kind: ModelKind,
}

impl PotentialTrainer {
    /// # Arguments:
    /// dataset: The raw training data
    /// kind: Penalized model used for cross validation and the final fit
    /// norm: Normalize the descriptors with this norm, `None` keeps them as is
    pub fn new(dataset: Dataset, kind: ModelKind, norm: Option<NormKind>) -> Self {
        let (dataset, normalization) = match norm {
            Some(norm) => {
                let (normalized, state) = dataset.normalized(norm);
                (normalized, Some(state))
            }
            None => (dataset, None),
        };

        Self {
            dataset,
            normalization,
            kind,
        }
    }

    /// Load the dataset stored at `path`, see [`load_dataset`]
    pub fn load(path: impl AsRef<Path>, kind: ModelKind, norm: Option<NormKind>) -> Result<Self> {
        Ok(Self::new(load_dataset(path)?, kind, norm))
    }

    /// The dataset models are fitted on, normalized if a norm was given
    #[inline(always)]
    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// The descriptor scales, if normalized
    #[inline(always)]
    pub fn normalization(&self) -> Option<&NormalizationState> {
        self.normalization.as_ref()
    }

    /// The penalized model kind
    #[inline(always)]
    pub fn kind(&self) -> ModelKind {
        self.kind
    }

    /// Cross validate every alpha of the sweep
    pub fn cross_validation(&self, alphas: &[f64], params: &CvParams) -> Result<CvReport> {
        CrossValidator::new(&self.dataset, self.kind).evaluate(alphas, params)
    }

    /// Fit on all structures and write the potential into `output_dir`
    pub fn make_potential(
        &self,
        output_dir: impl AsRef<Path>,
        alpha: f64,
        max_iter: usize,
        tol: f64,
    ) -> Result<DVector<f64>> {
        PotentialFitter::new(&self.dataset, self.kind, self.normalization.as_ref())
            .fit_and_save(output_dir, alpha, max_iter, tol)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use nalgebra::DMatrix;

    use super::*;
    use crate::{read_potential, POTENTIAL_FILE_NAME};

    fn write_csv(dir: &Path) -> std::path::PathBuf {
        let path = dir.join("re.csv");
        let mut content = String::from("n_atoms,b0,b1,y\n");
        for i in 0..20 {
            let n = (2 + i % 3) as f64;
            let b0 = 0.1 * i as f64;
            let b1 = ((i * 7) % 5) as f64;
            let y = -1.5 * n + 2.0 * b0 - 0.5 * b1;
            content.push_str(&format!("{},{},{},{}\n", n, b0, b1, y));
        }
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn load_cross_validate_and_make_potential() {
        if let Err(_) = pretty_env_logger::try_init() {}

        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(dir.path());

        let trainer = PotentialTrainer::load(&path, ModelKind::Ridge, Some(NormKind::L2)).unwrap();
        assert_eq!(trainer.dataset().n_samples(), 20);
        assert_eq!(trainer.normalization().unwrap().scales().len(), 2);

        let report = trainer
            .cross_validation(&[0.0, 0.01, 0.1, 1.0], &CvParams::default())
            .unwrap();
        assert_eq!(report.alphas().len(), 4);
        assert!(report.validation_errors()[0] < 1e-9);
        assert_eq!(report.best_alpha(), Some(0.0));

        let potential = trainer.make_potential(dir.path(), 0.0, 1_000, 1e-4).unwrap();
        let written = read_potential(dir.path().join(POTENTIAL_FILE_NAME)).unwrap();

        assert_eq!(written.len(), 3);
        assert_eq!(written, potential.iter().copied().collect::<Vec<_>>());
        for (w, e) in written.iter().zip([-1.5, 2.0, -0.5].iter()) {
            assert!((w - e).abs() < 1e-8, "{} vs {}", w, e);
        }
    }

    #[test]
    fn without_norm_dataset_is_unchanged() {
        let x = DMatrix::from_fn(5, 2, |i, j| (i + j) as f64 + 1.0);
        let y = DVector::from_element(5, 1.0);
        let dataset = Dataset::new(x.clone(), y).unwrap();

        let trainer = PotentialTrainer::new(dataset, ModelKind::Lasso, None);

        assert!(trainer.normalization().is_none());
        assert_eq!(trainer.dataset().x(), &x);
        assert_eq!(trainer.kind(), ModelKind::Lasso);
    }
}
