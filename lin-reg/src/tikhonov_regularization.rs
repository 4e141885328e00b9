use nalgebra::{DMatrix, DVector};

use super::{check_inputs, FittedModel, LinReg, LinRegError, Result};

/// Tikhonov regularization aka ridge regression
/// It is particularly useful to mitigate the problem of multicollinearity in
/// linear regression.
/// Minimizes `||y - Xw||^2 + regularization_coeff * ||w||^2` without intercept.
#[derive(Debug, Clone)]
pub struct TikhonovRegularization {
    /// Ridge parameter
    pub regularization_coeff: f64,
}

impl LinReg for TikhonovRegularization {
    fn fit(&self, design: &DMatrix<f64>, targets: &DVector<f64>) -> Result<FittedModel> {
        check_inputs(design, targets)?;

        let n = design.ncols();
        let gram = design.tr_mul(design) + DMatrix::identity(n, n) * self.regularization_coeff;
        let moment = design.tr_mul(targets);

        let coefficients = match solve_cholesky(&gram, &moment) {
            Some(coefficients) => coefficients,
            None => {
                // singular for alpha = 0 and collinear columns, take the least squares solution
                debug!("gram matrix is not positive definite, solving with svd");
                let eps = gram.amax() * 1e-10;
                gram.svd(true, true)
                    .solve(&moment, eps)
                    .map_err(|e| LinRegError::Solve(e.to_string()))?
            }
        };
        trace!("ridge coefficients: {}", coefficients);

        Ok(FittedModel {
            coefficients,
            regularization_coeff: self.regularization_coeff,
            max_iter: None,
            tol: None,
        })
    }
}

/// Cholesky solve, `None` when the factor is (numerically) rank deficient
fn solve_cholesky(gram: &DMatrix<f64>, moment: &DVector<f64>) -> Option<DVector<f64>> {
    if gram.is_empty() {
        return Some(DVector::zeros(0));
    }
    let cholesky = gram.clone().cholesky()?;
    let diagonal = cholesky.l_dirty().diagonal();
    if diagonal.min() <= diagonal.max() * 1e-7 {
        return None;
    }

    Some(cholesky.solve(moment))
}
