use nalgebra::{DMatrix, DVector};

use super::{check_inputs, FittedModel, LinReg, Result};

/// L1 penalized least squares without intercept, fitted by cyclic coordinate descent.
/// Minimizes `1 / (2 * n_samples) * ||y - Xw||^2 + regularization_coeff * ||w||_1`
#[derive(Debug, Clone)]
pub struct Lasso {
    /// Weight of the L1 penalty
    pub regularization_coeff: f64,
    /// Maximum number of sweeps over all coordinates
    pub max_iter: usize,
    /// Relative tolerance on both the coordinate updates and the duality gap
    pub tol: f64,
}

impl LinReg for Lasso {
    fn fit(&self, design: &DMatrix<f64>, targets: &DVector<f64>) -> Result<FittedModel> {
        check_inputs(design, targets)?;

        let (n_samples, n_features) = design.shape();
        let l1_reg = self.regularization_coeff * n_samples as f64;
        let gap_tol = self.tol * targets.norm_squared();
        let col_norms: Vec<f64> = design.column_iter().map(|c| c.norm_squared()).collect();

        let mut weights: DVector<f64> = DVector::zeros(n_features);
        let mut residuals = targets.clone();
        let mut converged = false;

        for iter in 0..self.max_iter {
            let mut w_max: f64 = 0.0;
            let mut d_w_max: f64 = 0.0;

            for (j, norm) in col_norms.iter().enumerate() {
                if *norm == 0.0 {
                    continue;
                }
                let column = design.column(j);
                let w_old = weights[j];
                let rho = column.dot(&residuals) + w_old * norm;
                let w_new = soft_threshold(rho, l1_reg) / norm;

                let delta = w_new - w_old;
                if delta != 0.0 {
                    for (r, x) in residuals.iter_mut().zip(column.iter()) {
                        *r -= delta * x;
                    }
                }
                weights[j] = w_new;

                d_w_max = d_w_max.max(delta.abs());
                w_max = w_max.max(w_new.abs());
            }

            if w_max == 0.0 || d_w_max / w_max < self.tol || iter + 1 == self.max_iter {
                let gap = duality_gap(design, targets, &weights, &residuals, l1_reg);
                trace!("iter {}: duality gap {} (tol {})", iter, gap, gap_tol);
                if gap <= gap_tol {
                    debug!("lasso converged after {} sweeps", iter + 1);
                    converged = true;
                    break;
                }
            }
        }
        if !converged {
            warn!(
                "lasso did not converge within {} iterations, consider increasing max_iter",
                self.max_iter
            );
        }

        Ok(FittedModel {
            coefficients: weights,
            regularization_coeff: self.regularization_coeff,
            max_iter: Some(self.max_iter),
            tol: Some(self.tol),
        })
    }
}

#[inline(always)]
fn soft_threshold(value: f64, threshold: f64) -> f64 {
    value.signum() * (value.abs() - threshold).max(0.0)
}

/// Gap between the primal objective and its dual, scaled by n_samples
fn duality_gap(
    design: &DMatrix<f64>,
    targets: &DVector<f64>,
    weights: &DVector<f64>,
    residuals: &DVector<f64>,
    l1_reg: f64,
) -> f64 {
    let dual_norm = design.tr_mul(residuals).amax();
    let r_norm2 = residuals.norm_squared();

    let (scale, gap) = if dual_norm > l1_reg {
        let c = l1_reg / dual_norm;
        (c, 0.5 * r_norm2 * (1.0 + c * c))
    } else {
        (1.0, r_norm2)
    };

    gap + l1_reg * weights.lp_norm(1) - scale * residuals.dot(targets)
}

#[cfg(test)]
mod tests {
    use round::round;

    use super::*;

    #[test]
    fn soft_threshold_shrinks_towards_zero() {
        assert_eq!(soft_threshold(3.0, 1.0), 2.0);
        assert_eq!(soft_threshold(-3.0, 1.0), -2.0);
        assert_eq!(soft_threshold(0.5, 1.0), 0.0);
        assert_eq!(soft_threshold(-0.5, 1.0), 0.0);
    }

    #[test]
    fn lasso_without_penalty_recovers_exact_fit() {
        if let Err(_) = pretty_env_logger::try_init() {}

        let design: DMatrix<f64> = DMatrix::from_column_slice(
            5,
            2,
            &[1.0, 1.0, 1.0, 1.0, 1.0, 0.0, 1.0, 2.0, 3.0, 4.0],
        );
        let targets = DVector::from_vec(vec![1.0, 3.0, 5.0, 7.0, 9.0]);

        let model = Lasso {
            regularization_coeff: 0.0,
            max_iter: 100_000,
            tol: 1e-10,
        }
        .fit(&design, &targets)
        .unwrap();
        info!("coefficients: {}", model.coefficients);

        assert_eq!(round(model.coefficients[0], 4), 1.0);
        assert_eq!(round(model.coefficients[1], 4), 2.0);
        assert_eq!(model.max_iter, Some(100_000));
    }

    #[test]
    fn orthogonal_design_matches_soft_thresholding() {
        // columns are orthonormal up to scale, so every coordinate is solved in closed form
        let design: DMatrix<f64> =
            DMatrix::from_column_slice(4, 2, &[1.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 1.0]);
        let targets = DVector::from_vec(vec![3.0, 0.4, 3.0, 0.4]);
        let alpha = 0.25;

        let model = Lasso {
            regularization_coeff: alpha,
            max_iter: 1000,
            tol: 1e-8,
        }
        .fit(&design, &targets)
        .unwrap();

        // w_j = S(x_j.y, n * alpha) / x_j.x
        assert!((model.coefficients[0] - (6.0 - 1.0) / 2.0).abs() < 1e-9);
        assert_eq!(model.coefficients[1], 0.0);
    }

    #[test]
    fn large_penalty_zeroes_all_weights() {
        let design: DMatrix<f64> =
            DMatrix::from_column_slice(5, 2, &[1.0, 2.0, 3.0, 4.0, 5.0, 2.0, 1.0, 0.0, 1.0, 2.0]);
        let targets = DVector::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0]);

        let model = Lasso {
            regularization_coeff: 1e3,
            max_iter: 1000,
            tol: 1e-4,
        }
        .fit(&design, &targets)
        .unwrap();

        assert!(model.coefficients.iter().all(|w| *w == 0.0));
    }
}
