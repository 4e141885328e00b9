use std::{fmt, str::FromStr};

use nalgebra::{DMatrix, DVector};

use crate::{Dataset, Error, Result};

/// Norm used to rescale each descriptor column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormKind {
    /// Sum of absolute values
    L1,
    /// Euclidean length
    L2,
    /// Largest absolute value
    Max,
}

impl NormKind {
    fn column_norm<'a, I>(self, values: I) -> f64
    where
        I: Iterator<Item = &'a f64>,
    {
        match self {
            NormKind::L1 => values.map(|v| v.abs()).sum(),
            NormKind::L2 => values.map(|v| v * v).sum::<f64>().sqrt(),
            NormKind::Max => values.fold(0.0, |m, v| m.max(v.abs())),
        }
    }
}

impl FromStr for NormKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "l1" => Ok(NormKind::L1),
            "l2" => Ok(NormKind::L2),
            "max" => Ok(NormKind::Max),
            _ => Err(Error::UnknownNorm(s.to_string())),
        }
    }
}

impl fmt::Display for NormKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NormKind::L1 => write!(f, "l1"),
            NormKind::L2 => write!(f, "l2"),
            NormKind::Max => write!(f, "max"),
        }
    }
}

/// The per descriptor scale factors applied by [`normalize`]
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizationState {
    kind: NormKind,
    scales: DVector<f64>,
}

impl NormalizationState {
    /// The norm the scales were computed with
    #[inline(always)]
    pub fn kind(&self) -> NormKind {
        self.kind
    }

    /// One scale per descriptor column, the atom count column is not included
    #[inline(always)]
    pub fn scales(&self) -> &DVector<f64> {
        &self.scales
    }

    /// Map coefficients fitted on normalized features back onto the raw features.
    /// `coefficients` has one entry per column of `X`; the atom count coefficient stays as is
    /// since that column was never scaled.
    pub fn unscale(&self, coefficients: &DVector<f64>) -> Result<DVector<f64>> {
        if coefficients.len() != self.scales.len() + 1 {
            return Err(Error::Shape(format!(
                "{} coefficients cannot be unscaled by {} descriptor scales",
                coefficients.len(),
                self.scales.len()
            )));
        }

        Ok(DVector::from_fn(coefficients.len(), |i, _| {
            if i == 0 {
                coefficients[0]
            } else {
                coefficients[i] / self.scales[i - 1]
            }
        }))
    }
}

/// Divide every descriptor column (all but column 0) of `x` by its norm.
/// Columns with a zero norm are left untouched and get a scale of 1.
pub fn normalize(x: &DMatrix<f64>, kind: NormKind) -> (DMatrix<f64>, NormalizationState) {
    let mut normalized = x.clone();
    let n_descriptors = x.ncols().saturating_sub(1);
    let mut scales = DVector::from_element(n_descriptors, 1.0);

    for j in 0..n_descriptors {
        let mut column = normalized.column_mut(j + 1);
        let norm = kind.column_norm(column.iter());
        if norm > 0.0 {
            column /= norm;
            scales[j] = norm;
        }
    }
    trace!("{} scales: {}", kind, scales);

    (normalized, NormalizationState { kind, scales })
}

impl Dataset {
    /// Copy of the dataset with normalized descriptors, plus the scales needed to undo it
    pub fn normalized(&self, kind: NormKind) -> (Dataset, NormalizationState) {
        let (x, state) = normalize(self.x(), kind);
        info!("normalized {} descriptor columns with the {} norm", state.scales.len(), kind);

        (
            Dataset {
                x,
                y: self.y().clone(),
            },
            state,
        )
    }
}
