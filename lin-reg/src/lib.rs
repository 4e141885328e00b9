#[macro_use]
extern crate log;

use nalgebra::{DMatrix, DVector};

mod lasso;
mod regressor;
mod tikhonov_regularization;

pub use lasso::Lasso;
pub use regressor::{ModelKind, Regressor};
pub use tikhonov_regularization::TikhonovRegularization;

pub type Result<T> = std::result::Result<T, LinRegError>;

#[derive(Debug, thiserror::Error)]
pub enum LinRegError {
    #[error("design has {design_rows} rows but there are {target_rows} targets")]
    ShapeMismatch { design_rows: usize, target_rows: usize },

    #[error("model has {coefficients} coefficients but the design has {columns} columns")]
    FeatureMismatch { coefficients: usize, columns: usize },

    #[error("design or targets contain non finite values")]
    NonFinite,

    #[error("failed to solve the normal equations: {0}")]
    Solve(String),

    #[error("unknown model kind '{0}', expected one of LASSO, RIDGE")]
    UnknownModel(String),
}

/// Generic way of fitting a linear model without intercept
pub trait LinReg: Clone {
    /// Fit the coefficients mapping the design rows onto the targets
    ///
    /// # Parameters
    /// design: Input data with one row per sample and one column per feature
    /// targets: One target value per design row
    fn fit(&self, design: &DMatrix<f64>, targets: &DVector<f64>) -> Result<FittedModel>;
}

/// The outcome of a single fit, together with the settings that produced it
#[derive(Debug, Clone)]
pub struct FittedModel {
    /// One weight per design column
    pub coefficients: DVector<f64>,
    /// Penalty strength used
    pub regularization_coeff: f64,
    /// Iteration cap the solver was configured with, `None` for a bare closed form solver
    pub max_iter: Option<usize>,
    /// Convergence tolerance the solver was configured with, `None` for a bare closed form solver
    pub tol: Option<f64>,
}

impl FittedModel {
    /// Predict one value per design row
    pub fn predict(&self, design: &DMatrix<f64>) -> Result<DVector<f64>> {
        if design.ncols() != self.coefficients.len() {
            return Err(LinRegError::FeatureMismatch {
                coefficients: self.coefficients.len(),
                columns: design.ncols(),
            });
        }

        Ok(design * &self.coefficients)
    }
}

pub(crate) fn check_inputs(design: &DMatrix<f64>, targets: &DVector<f64>) -> Result<()> {
    if design.nrows() != targets.len() {
        return Err(LinRegError::ShapeMismatch {
            design_rows: design.nrows(),
            target_rows: targets.len(),
        });
    }
    if design.iter().chain(targets.iter()).any(|v| !v.is_finite()) {
        return Err(LinRegError::NonFinite);
    }

    Ok(())
}
