use std::{fmt, str::FromStr};

use nalgebra::{DMatrix, DVector};

use super::{FittedModel, Lasso, LinReg, LinRegError, Result, TikhonovRegularization};

/// The supported penalized linear models
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelKind {
    /// L1 penalty
    Lasso,
    /// L2 penalty
    Ridge,
}

impl ModelKind {
    /// Build the solver for this kind with the given penalty and solver limits.
    /// `max_iter` and `tol` only affect iterative solvers.
    pub fn regressor(self, regularization_coeff: f64, max_iter: usize, tol: f64) -> Regressor {
        match self {
            ModelKind::Lasso => Regressor::Lasso(Lasso {
                regularization_coeff,
                max_iter,
                tol,
            }),
            ModelKind::Ridge => Regressor::Ridge {
                ridge: TikhonovRegularization {
                    regularization_coeff,
                },
                max_iter,
                tol,
            },
        }
    }
}

impl FromStr for ModelKind {
    type Err = LinRegError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "LASSO" => Ok(ModelKind::Lasso),
            "RIDGE" => Ok(ModelKind::Ridge),
            _ => Err(LinRegError::UnknownModel(s.to_string())),
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelKind::Lasso => write!(f, "LASSO"),
            ModelKind::Ridge => write!(f, "RIDGE"),
        }
    }
}

/// A configured solver of one of the [`ModelKind`]s
#[derive(Debug, Clone)]
pub enum Regressor {
    Lasso(Lasso),
    /// Closed form, `max_iter` and `tol` are only recorded in the fitted model
    Ridge {
        ridge: TikhonovRegularization,
        max_iter: usize,
        tol: f64,
    },
}

impl Regressor {
    #[inline(always)]
    pub fn kind(&self) -> ModelKind {
        match self {
            Regressor::Lasso(_) => ModelKind::Lasso,
            Regressor::Ridge { .. } => ModelKind::Ridge,
        }
    }
}

impl LinReg for Regressor {
    fn fit(&self, design: &DMatrix<f64>, targets: &DVector<f64>) -> Result<FittedModel> {
        match self {
            Regressor::Lasso(r) => r.fit(design, targets),
            Regressor::Ridge {
                ridge,
                max_iter,
                tol,
            } => {
                let mut model = ridge.fit(design, targets)?;
                model.max_iter = Some(*max_iter);
                model.tol = Some(*tol);
                Ok(model)
            }
        }
    }
}
