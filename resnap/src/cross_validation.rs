use std::{fmt, str::FromStr};

use lin_reg::{LinReg, ModelKind};
use nalgebra::{DMatrix, DVector};
use nanorand::{Rng, WyRand};

use crate::{Dataset, Error, PlottingSink, Result};

/// Number of folds used in cross validation
pub const NUM_FOLDS: usize = 5;

/// Settings of a cross validation run
#[derive(Debug, Clone)]
pub struct CvParams {
    /// Iteration cap of the lasso solver
    pub max_iter: usize,
    /// Convergence tolerance of the lasso solver
    pub tol: f64,
    /// Seed of the row shuffle that assigns structures to folds
    pub seed: u64,
    /// Keep the true and predicted energies of fold 0 for parity plots
    pub capture_parity: bool,
}

impl Default for CvParams {
    fn default() -> Self {
        Self {
            max_iter: 1_000_000,
            tol: 1e-4,
            seed: 2020,
            capture_parity: false,
        }
    }
}

/// How energies are presented in parity plots
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlotMode {
    /// Energies divided by the number of atoms, eV/atom
    Atom,
    /// Energies of whole structures, eV
    Sample,
}

impl FromStr for PlotMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "atom" => Ok(PlotMode::Atom),
            "sample" => Ok(PlotMode::Sample),
            _ => Err(Error::UnknownPlotMode(s.to_string())),
        }
    }
}

impl fmt::Display for PlotMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlotMode::Atom => write!(f, "atom"),
            PlotMode::Sample => write!(f, "sample"),
        }
    }
}

/// The two halves of a fold
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Split {
    /// Rows the model was fitted on
    Train,
    /// Held out rows
    Validation,
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Split::Train => write!(f, "train"),
            Split::Validation => write!(f, "validation"),
        }
    }
}

/// True energy, predicted energy and atom count of every row of one split
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParitySet {
    /// True energies
    pub energies: Vec<f64>,
    /// Predicted energies
    pub predictions: Vec<f64>,
    /// Number of atoms per structure
    pub atom_counts: Vec<f64>,
}

impl ParitySet {
    /// (true, predicted) pairs as presented by `mode`
    pub fn points(&self, mode: PlotMode) -> Vec<(f64, f64)> {
        self.energies
            .iter()
            .zip(self.predictions.iter())
            .zip(self.atom_counts.iter())
            .map(|((e, p), n)| match mode {
                PlotMode::Atom => (e / n, p / n),
                PlotMode::Sample => (*e, *p),
            })
            .collect()
    }
}

/// Parity data of the first fold
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FoldParity {
    /// Training rows
    pub train: ParitySet,
    /// Validation rows
    pub validation: ParitySet,
}

/// Cross validation outcome for one alpha
#[derive(Debug, Clone)]
pub struct AlphaReport {
    /// Regularization strength
    pub alpha: f64,
    /// Per-atom training error of each fold
    pub fold_train_errors: Vec<f64>,
    /// Per-atom validation error of each fold
    pub fold_validation_errors: Vec<f64>,
    /// Mean of `fold_train_errors`
    pub mean_train_error: f64,
    /// Mean of `fold_validation_errors`
    pub mean_validation_error: f64,
    /// Fold 0 energies, present when requested in [`CvParams`]
    pub parity: Option<FoldParity>,
}

/// Cross validation outcome of a whole alpha sweep, in sweep order
#[derive(Debug, Clone, Default)]
pub struct CvReport {
    reports: Vec<AlphaReport>,
}

impl CvReport {
    /// Per alpha reports in sweep order
    #[inline(always)]
    pub fn alphas(&self) -> &[AlphaReport] {
        &self.reports
    }

    /// Mean validation error per alpha
    pub fn validation_errors(&self) -> Vec<f64> {
        self.reports.iter().map(|r| r.mean_validation_error).collect()
    }

    /// Mean training error per alpha
    pub fn train_errors(&self) -> Vec<f64> {
        self.reports.iter().map(|r| r.mean_train_error).collect()
    }

    /// The alpha with the lowest mean validation error, the earliest one on ties.
    /// Alphas whose error is NaN are never chosen.
    pub fn best_alpha(&self) -> Option<f64> {
        self.reports
            .iter()
            .filter(|r| !r.mean_validation_error.is_nan())
            .fold(None, |best: Option<&AlphaReport>, r| match best {
                Some(b) if b.mean_validation_error <= r.mean_validation_error => Some(b),
                _ => Some(r),
            })
            .map(|r| r.alpha)
    }

    /// Y axis limits for the sweep plot: `[min - range, max + range]` with
    /// `range = max - min` of the mean validation errors
    pub fn sweep_bounds(&self) -> Result<(f64, f64)> {
        if self.reports.is_empty() {
            return Err(Error::EmptySweep);
        }
        let errors = self.validation_errors();
        let min = errors.iter().copied().fold(f64::INFINITY, f64::min);
        let max = errors.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let range = max - min;

        Ok((min - range, max + range))
    }

    /// Hand the fold 0 parity sets (if captured and a `mode` is given) and the sweep to `sink`
    pub fn render<S: PlottingSink + ?Sized>(
        &self,
        sink: &mut S,
        mode: Option<PlotMode>,
    ) -> Result<()> {
        if let Some(mode) = mode {
            for r in self.reports.iter() {
                if let Some(parity) = &r.parity {
                    sink.parity(Split::Train, mode, r.alpha, &parity.train.points(mode))?;
                    sink.parity(Split::Validation, mode, r.alpha, &parity.validation.points(mode))?;
                }
            }
        }
        let bounds = self.sweep_bounds()?;
        let alphas: Vec<f64> = self.reports.iter().map(|r| r.alpha).collect();

        sink.sweep(&alphas, &self.validation_errors(), bounds)
    }
}

/// Assignment of rows to folds: one seeded shuffle of all row indices, after which
/// fold `i` validates on every `NUM_FOLDS`th shuffled row starting at `i`
#[derive(Debug, Clone)]
pub struct Folds {
    order: Vec<usize>,
}

impl Folds {
    /// Shuffle `n_rows` row indices with `seed`
    pub fn new(n_rows: usize, seed: u64) -> Self {
        let mut order: Vec<usize> = (0..n_rows).collect();
        let mut rng = WyRand::new_seed(seed);
        rng.shuffle(&mut order);

        Self { order }
    }

    /// The shuffled row order
    #[inline(always)]
    pub fn order(&self) -> &[usize] {
        &self.order
    }

    /// Dataset row indices validated on in `fold`
    pub fn validation(&self, fold: usize) -> Vec<usize> {
        self.order.iter().skip(fold).step_by(NUM_FOLDS).copied().collect()
    }

    /// Dataset row indices trained on in `fold`
    pub fn train(&self, fold: usize) -> Vec<usize> {
        self.order
            .iter()
            .enumerate()
            .filter(|(pos, _)| pos % NUM_FOLDS != fold)
            .map(|(_, row)| *row)
            .collect()
    }
}

/// Mean over rows of `|energy - prediction| / atom_count`
pub fn per_atom_error(
    energies: &DVector<f64>,
    predictions: &DVector<f64>,
    atom_counts: &DVector<f64>,
) -> f64 {
    let total: f64 = energies
        .iter()
        .zip(predictions.iter())
        .zip(atom_counts.iter())
        .map(|((e, p), n)| (e - p).abs() / n)
        .sum();

    total / energies.len() as f64
}

/// Rows of the dataset selected for one side of a fold
struct SplitData {
    x: DMatrix<f64>,
    y: DVector<f64>,
    atom_counts: DVector<f64>,
}

impl SplitData {
    fn select(dataset: &Dataset, rows: &[usize]) -> Self {
        let x = dataset.x().select_rows(rows);
        let atom_counts = x.column(0).into_owned();

        Self {
            y: dataset.y().select_rows(rows),
            x,
            atom_counts,
        }
    }

    fn parity(&self, predictions: &DVector<f64>) -> ParitySet {
        ParitySet {
            energies: self.y.iter().copied().collect(),
            predictions: predictions.iter().copied().collect(),
            atom_counts: self.atom_counts.iter().copied().collect(),
        }
    }
}

/// K-fold cross validation of one model kind over a sweep of regularization strengths
#[derive(Debug, Clone)]
pub struct CrossValidator<'a> {
    dataset: &'a Dataset,
    kind: ModelKind,
}

impl<'a> CrossValidator<'a> {
    /// Validate `kind` models on `dataset`
    pub fn new(dataset: &'a Dataset, kind: ModelKind) -> Self {
        Self { dataset, kind }
    }

    /// Mean per-atom errors of every alpha, in the order given.
    /// All alphas share the same fold assignment.
    pub fn evaluate(&self, alphas: &[f64], params: &CvParams) -> Result<CvReport> {
        let folds = Folds::new(self.dataset.n_samples(), params.seed);
        let splits: Vec<(SplitData, SplitData)> = (0..NUM_FOLDS)
            .map(|i| {
                (
                    SplitData::select(self.dataset, &folds.train(i)),
                    SplitData::select(self.dataset, &folds.validation(i)),
                )
            })
            .collect();

        let mut reports = Vec::with_capacity(alphas.len());
        for alpha in alphas.iter().copied() {
            info!("{}-fold error of {} with alpha = {}", NUM_FOLDS, self.kind, alpha);
            let regressor = self.kind.regressor(alpha, params.max_iter, params.tol);

            let mut fold_train_errors = Vec::with_capacity(NUM_FOLDS);
            let mut fold_validation_errors = Vec::with_capacity(NUM_FOLDS);
            let mut parity = None;
            for (i, (train, validation)) in splits.iter().enumerate() {
                let model = regressor.fit(&train.x, &train.y)?;
                let predicted_train = model.predict(&train.x)?;
                let predicted_validation = model.predict(&validation.x)?;

                let error_train = per_atom_error(&train.y, &predicted_train, &train.atom_counts);
                let error_validation = per_atom_error(
                    &validation.y,
                    &predicted_validation,
                    &validation.atom_counts,
                );
                debug!(
                    "fold {}: train error {} eV/atom, validation error {} eV/atom",
                    i, error_train, error_validation
                );

                if i == 0 && params.capture_parity {
                    parity = Some(FoldParity {
                        train: train.parity(&predicted_train),
                        validation: validation.parity(&predicted_validation),
                    });
                }
                fold_train_errors.push(error_train);
                fold_validation_errors.push(error_validation);
            }

            let mean_train_error = mean(&fold_train_errors);
            let mean_validation_error = mean(&fold_validation_errors);
            info!("Mean error train: {} eV/atom", mean_train_error);
            info!("Mean error validation: {} eV/atom", mean_validation_error);

            reports.push(AlphaReport {
                alpha,
                fold_train_errors,
                fold_validation_errors,
                mean_train_error,
                mean_validation_error,
                parity,
            });
        }

        let report = CvReport { reports };
        info!("validation errors: {:?}", report.validation_errors());

        Ok(report)
    }
}

#[inline(always)]
fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use round::round;

    use super::*;

    /// 10 structures of 2 atoms each whose energy is exactly twice the descriptor
    fn exact_dataset() -> Dataset {
        let features = [0.5, 1.0, 1.5, 2.0, 2.5, 3.0, 3.5, 4.0, 4.5, 5.0];
        let x = DMatrix::from_fn(features.len(), 2, |i, j| if j == 0 { 2.0 } else { features[i] });
        let y = DVector::from_iterator(features.len(), features.iter().map(|f| 2.0 * f));

        Dataset::new(x, y).unwrap()
    }

    #[derive(Default)]
    struct RecordingSink {
        parity: Vec<(Split, PlotMode, f64, Vec<(f64, f64)>)>,
        sweeps: Vec<(Vec<f64>, Vec<f64>, (f64, f64))>,
    }

    impl PlottingSink for RecordingSink {
        fn parity(
            &mut self,
            split: Split,
            mode: PlotMode,
            alpha: f64,
            points: &[(f64, f64)],
        ) -> Result<()> {
            self.parity.push((split, mode, alpha, points.to_vec()));
            Ok(())
        }

        fn sweep(&mut self, alphas: &[f64], errors: &[f64], bounds: (f64, f64)) -> Result<()> {
            self.sweeps.push((alphas.to_vec(), errors.to_vec(), bounds));
            Ok(())
        }
    }

    #[test]
    fn folds_partition_all_rows() {
        for n in [5, 10, 13, 101] {
            let folds = Folds::new(n, 2020);
            let mut seen = HashSet::new();
            for i in 0..NUM_FOLDS {
                let validation = folds.validation(i);
                let train = folds.train(i);
                assert_eq!(validation.len() + train.len(), n);
                for row in validation.iter() {
                    // pairwise disjoint validation sets
                    assert!(seen.insert(*row));
                    assert!(!train.contains(row));
                }
            }
            assert_eq!(seen, (0..n).collect::<HashSet<usize>>());
        }
    }

    #[test]
    fn folds_follow_modulo_striding() {
        let folds = Folds::new(12, 7);
        let order = folds.order().to_vec();

        assert_eq!(folds.validation(0), vec![order[0], order[5], order[10]]);
        assert_eq!(folds.validation(4), vec![order[4], order[9]]);
    }

    #[test]
    fn folds_are_deterministic_per_seed() {
        let a = Folds::new(50, 2020);
        let b = Folds::new(50, 2020);
        assert_eq!(a.order(), b.order());
        for i in 0..NUM_FOLDS {
            assert_eq!(a.validation(i), b.validation(i));
        }

        let c = Folds::new(50, 2021);
        assert_ne!(a.order(), c.order());
    }

    #[test]
    fn per_atom_error_divides_by_atom_count() {
        let energies = DVector::from_vec(vec![10.0, -4.0]);
        let predictions = DVector::from_vec(vec![8.0, -1.0]);
        let atom_counts = DVector::from_vec(vec![2.0, 3.0]);

        assert_eq!(per_atom_error(&energies, &predictions, &atom_counts), 1.0);
        assert_eq!(per_atom_error(&energies, &energies, &atom_counts), 0.0);
    }

    #[test]
    fn exact_data_has_zero_error() {
        if let Err(_) = pretty_env_logger::try_init() {}

        let dataset = exact_dataset();
        let report = CrossValidator::new(&dataset, ModelKind::Ridge)
            .evaluate(&[0.0], &CvParams::default())
            .unwrap();

        assert_eq!(report.alphas().len(), 1);
        assert_eq!(round(report.validation_errors()[0], 9), 0.0);
        assert_eq!(round(report.train_errors()[0], 9), 0.0);
        assert_eq!(report.alphas()[0].fold_validation_errors.len(), NUM_FOLDS);
    }

    #[test]
    fn regularization_does_not_reduce_error_on_exact_data() {
        if let Err(_) = pretty_env_logger::try_init() {}

        let dataset = exact_dataset();
        // tight tolerance so the lasso reaches the exact fit at alpha 0
        let params = CvParams {
            tol: 1e-12,
            ..Default::default()
        };
        for kind in [ModelKind::Ridge, ModelKind::Lasso] {
            let report = CrossValidator::new(&dataset, kind).evaluate(&[0.0, 1.0], &params).unwrap();
            let errors = report.validation_errors();
            info!("{} errors: {:?}", kind, errors);

            assert!(errors[0] < 1e-3, "{} error at alpha 0: {}", kind, errors[0]);
            assert!(errors[1] >= errors[0]);
            assert_eq!(report.best_alpha(), Some(0.0));
        }
    }

    #[test]
    fn results_follow_input_order() {
        let dataset = exact_dataset();
        let cv = CrossValidator::new(&dataset, ModelKind::Ridge);
        let params = CvParams::default();

        let forward = cv.evaluate(&[0.1, 10.0], &params).unwrap();
        let backward = cv.evaluate(&[10.0, 0.1], &params).unwrap();

        assert_eq!(forward.alphas()[0].alpha, 0.1);
        assert_eq!(backward.alphas()[0].alpha, 10.0);
        assert_eq!(forward.validation_errors()[0], backward.validation_errors()[1]);
        assert_eq!(forward.validation_errors()[1], backward.validation_errors()[0]);
    }

    #[test]
    fn empty_sweep_fails_on_bounds() {
        let dataset = exact_dataset();
        let report = CrossValidator::new(&dataset, ModelKind::Ridge)
            .evaluate(&[], &CvParams::default())
            .unwrap();

        assert!(report.alphas().is_empty());
        assert_eq!(report.best_alpha(), None);
        assert!(matches!(report.sweep_bounds(), Err(Error::EmptySweep)));
        assert!(matches!(
            report.render(&mut RecordingSink::default(), None),
            Err(Error::EmptySweep)
        ));
    }

    #[test]
    fn single_alpha_bounds_degenerate() {
        let dataset = exact_dataset();
        let report = CrossValidator::new(&dataset, ModelKind::Ridge)
            .evaluate(&[0.5], &CvParams::default())
            .unwrap();
        let error = report.validation_errors()[0];

        assert_eq!(report.sweep_bounds().unwrap(), (error, error));

        let mut sink = RecordingSink::default();
        report.render(&mut sink, None).unwrap();
        assert_eq!(sink.sweeps, vec![(vec![0.5], vec![error], (error, error))]);
    }

    /// Report with the given (alpha, mean validation error) pairs
    fn report_of(sweep: &[(f64, f64)]) -> CvReport {
        CvReport {
            reports: sweep
                .iter()
                .map(|(alpha, e)| AlphaReport {
                    alpha: *alpha,
                    fold_train_errors: vec![],
                    fold_validation_errors: vec![],
                    mean_train_error: 0.0,
                    mean_validation_error: *e,
                    parity: None,
                })
                .collect(),
        }
    }

    #[test]
    fn sweep_bounds_widen_by_range() {
        let report = report_of(&[(0.0, 0.2), (0.1, 0.5), (1.0, 0.3)]);
        let (lo, hi) = report.sweep_bounds().unwrap();

        assert_eq!(round(lo, 12), -0.1);
        assert_eq!(round(hi, 12), 0.8);
    }

    #[test]
    fn best_alpha_skips_nan_errors() {
        // zero atom counts turn exact predictions into 0 / 0
        let report = report_of(&[(0.0, 0.1), (1.0, f64::NAN)]);
        assert_eq!(report.best_alpha(), Some(0.0));

        let report = report_of(&[(0.0, f64::NAN), (0.5, 0.3), (1.0, 0.2)]);
        assert_eq!(report.best_alpha(), Some(1.0));

        let report = report_of(&[(0.0, 0.2), (1.0, 0.2)]);
        assert_eq!(report.best_alpha(), Some(0.0));

        let report = report_of(&[(0.0, f64::NAN), (1.0, f64::NAN)]);
        assert_eq!(report.best_alpha(), None);
    }

    #[test]
    fn parity_is_only_captured_on_request() {
        let dataset = exact_dataset();
        let cv = CrossValidator::new(&dataset, ModelKind::Ridge);

        let report = cv.evaluate(&[0.0], &CvParams::default()).unwrap();
        assert!(report.alphas()[0].parity.is_none());

        let params = CvParams {
            capture_parity: true,
            ..Default::default()
        };
        let report = cv.evaluate(&[0.0, 1.0], &params).unwrap();
        let parity = report.alphas()[0].parity.as_ref().unwrap();

        // fold 0 of 10 rows validates on 2 and trains on 8
        assert_eq!(parity.validation.energies.len(), 2);
        assert_eq!(parity.train.energies.len(), 8);
        assert!(parity.train.atom_counts.iter().all(|n| *n == 2.0));

        let mut sink = RecordingSink::default();
        report.render(&mut sink, Some(PlotMode::Atom)).unwrap();
        // train and validation for each alpha, then one sweep
        assert_eq!(sink.parity.len(), 4);
        assert_eq!(sink.sweeps.len(), 1);
        assert_eq!(sink.parity[0].0, Split::Train);
        assert_eq!(sink.parity[1].0, Split::Validation);
        assert_eq!(sink.parity[3].2, 1.0);

        let mut sink = RecordingSink::default();
        report.render(&mut sink, None).unwrap();
        assert!(sink.parity.is_empty());
    }

    #[test]
    fn parity_points_per_mode() {
        let set = ParitySet {
            energies: vec![-10.0, -6.0],
            predictions: vec![-8.0, -9.0],
            atom_counts: vec![2.0, 3.0],
        };

        assert_eq!(set.points(PlotMode::Atom), vec![(-5.0, -4.0), (-2.0, -3.0)]);
        assert_eq!(set.points(PlotMode::Sample), vec![(-10.0, -8.0), (-6.0, -9.0)]);
    }

    #[test]
    fn parse_plot_mode() {
        assert_eq!("atom".parse::<PlotMode>().unwrap(), PlotMode::Atom);
        assert_eq!("Sample".parse::<PlotMode>().unwrap(), PlotMode::Sample);
        assert!(matches!("heat".parse::<PlotMode>(), Err(Error::UnknownPlotMode(_))));
    }
}
