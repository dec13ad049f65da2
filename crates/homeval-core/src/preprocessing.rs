//! Standardization shared by training and serving.
//!
//! The scaler is fitted on the training split only, persisted next to the
//! model artifact, and re-applied to raw request vectors at serving time so
//! the model always sees inputs on the scale it was trained on.

use serde::{Deserialize, Serialize};

use crate::error::ScalerError;
use crate::math::Array2;

/// Standard scaler (per-column mean / population std).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Scaler {
    pub mean: Vec<f32>,
    pub std: Vec<f32>,
}

impl Scaler {
    /// Minimum stddev to avoid division by zero when transforming.
    const MIN_STD: f32 = 1e-6;

    pub fn n_features(&self) -> usize {
        self.mean.len()
    }

    /// A scaler read from disk may carry `mean` and `std` of different
    /// lengths; such a scaler cannot be applied.
    pub fn check(&self) -> Result<(), ScalerError> {
        if self.mean.len() == self.std.len() {
            Ok(())
        } else {
            Err(ScalerError::Inconsistent {
                mean: self.mean.len(),
                std: self.std.len(),
            })
        }
    }

    /// Scale a single raw input row. Arithmetic runs in f64 and only the
    /// scaled value is narrowed, so raw values beyond the f32 range still
    /// scale to finite numbers.
    pub fn transform_row(&self, row: &[f64]) -> Result<Vec<f32>, ScalerError> {
        self.check()?;
        if row.len() != self.n_features() {
            return Err(ScalerError::DimensionMismatch {
                expected: self.n_features(),
                got: row.len(),
            });
        }
        row.iter()
            .enumerate()
            .map(|(c, &v)| {
                let scaled = scale(v, self.mean[c], self.std[c]);
                if scaled.is_finite() {
                    Ok(scaled)
                } else {
                    Err(ScalerError::NonFinite { column: c })
                }
            })
            .collect()
    }
}

fn scale(v: f64, mean: f32, std: f32) -> f32 {
    ((v - mean as f64) / std as f64) as f32
}

/// Fit a `Scaler` from an `Array2<f32>` where rows are samples and
/// columns are features.
pub fn fit_scaler(x: &Array2<f32>) -> Scaler {
    let (nrows, ncols) = x.shape();
    assert!(
        nrows > 0 && ncols > 0,
        "fit_scaler requires non-empty matrix"
    );

    // Accumulate in f64; sale prices and lot areas lose precision in f32 sums.
    let mut mean = vec![0.0f64; ncols];
    for row in x.rows() {
        for (c, &v) in row.iter().enumerate() {
            mean[c] += v as f64;
        }
    }
    let nrows_f = nrows as f64;
    for v in mean.iter_mut() {
        *v /= nrows_f;
    }

    let mut var = vec![0.0f64; ncols];
    for row in x.rows() {
        for (c, &v) in row.iter().enumerate() {
            let d = v as f64 - mean[c];
            var[c] += d * d;
        }
    }

    Scaler {
        mean: mean.iter().map(|&m| m as f32).collect(),
        std: var
            .iter()
            .map(|&v| ((v / nrows_f).sqrt() as f32).max(Scaler::MIN_STD))
            .collect(),
    }
}

/// Transform all rows using the provided `Scaler` and return a new `Array2<f32>`.
///
/// Panics if the matrix width differs from the scaler; callers inside
/// this crate fit and apply on the same column set.
pub fn transform_all(x: &Array2<f32>, sc: &Scaler) -> Array2<f32> {
    let (nrows, ncols) = x.shape();
    assert_eq!(ncols, sc.n_features(), "transform_all: width mismatch");
    let mut out = Vec::with_capacity(nrows * ncols);

    for row in x.rows() {
        for (c, &v) in row.iter().enumerate() {
            out.push(scale(v as f64, sc.mean[c], sc.std[c]));
        }
    }

    Array2::from_shape_vec((nrows, ncols), out).expect("transform_all: shape mismatch")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transform_row_matches_transform_all() {
        let x = Array2::from_shape_vec((3, 2), vec![1.0, 10.0, 2.0, 20.0, 3.0, 60.0]).unwrap();
        let sc = fit_scaler(&x);
        let all = transform_all(&x, &sc);
        let raw: Vec<f64> = x.row_slice(2).iter().map(|&v| v as f64).collect();
        let row = sc.transform_row(&raw).unwrap();
        assert_eq!(row.as_slice(), all.row_slice(2));
    }

    #[test]
    fn transform_row_rejects_wrong_width() {
        let sc = Scaler {
            mean: vec![0.0, 0.0],
            std: vec![1.0, 1.0],
        };
        assert_eq!(
            sc.transform_row(&[1.0]),
            Err(ScalerError::DimensionMismatch { expected: 2, got: 1 })
        );
    }

    #[test]
    fn transform_row_rejects_non_finite_input() {
        let sc = Scaler {
            mean: vec![0.0],
            std: vec![1.0],
        };
        assert_eq!(
            sc.transform_row(&[f64::INFINITY]),
            Err(ScalerError::NonFinite { column: 0 })
        );
    }

    #[test]
    fn transform_row_rejects_mismatched_mean_and_std() {
        let sc = Scaler {
            mean: vec![0.0, 0.0],
            std: vec![1.0],
        };
        assert_eq!(
            sc.transform_row(&[1.0, 2.0]),
            Err(ScalerError::Inconsistent { mean: 2, std: 1 })
        );
    }

    #[test]
    fn values_beyond_f32_range_scale_to_finite_numbers() {
        let sc = Scaler {
            mean: vec![0.0, 0.0],
            std: vec![1e10, 1e10],
        };
        let row = sc.transform_row(&[1e39, 0.0]).unwrap();
        assert!(row[0].is_finite());
        assert!((row[0] - 1e29).abs() / 1e29 < 1e-6);
        assert_eq!(row[1], 0.0);
    }
}
