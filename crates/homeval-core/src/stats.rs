//! Regression metrics reported after the final fit.
//!
//! All metrics accumulate in f64 even though models predict in f32; squared
//! errors on sale prices overflow f32 precision quickly.
use serde::Serialize;

/// Metrics of a fitted model on the held-out split.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RegressionMetrics {
    pub mse: f64,
    pub r2: f64,
    pub mae: f64,
    pub mape: f64,
}

impl RegressionMetrics {
    pub fn compute(y_true: &[f32], y_pred: &[f32]) -> Self {
        RegressionMetrics {
            mse: mean_squared_error(y_true, y_pred),
            r2: r2_score(y_true, y_pred),
            mae: mean_absolute_error(y_true, y_pred),
            mape: mean_absolute_percentage_error(y_true, y_pred),
        }
    }

    /// (name, value) pairs in logging order.
    pub fn as_pairs(&self) -> [(&'static str, f64); 4] {
        [
            ("mse", self.mse),
            ("r2", self.r2),
            ("mae", self.mae),
            ("mape", self.mape),
        ]
    }
}

fn check_lengths(y_true: &[f32], y_pred: &[f32]) {
    assert_eq!(
        y_true.len(),
        y_pred.len(),
        "y_true and y_pred must have equal length"
    );
    assert!(!y_true.is_empty(), "metrics require at least one sample");
}

pub fn mean_squared_error(y_true: &[f32], y_pred: &[f32]) -> f64 {
    check_lengths(y_true, y_pred);
    let sum: f64 = y_true
        .iter()
        .zip(y_pred)
        .map(|(&t, &p)| (t as f64 - p as f64).powi(2))
        .sum();
    sum / y_true.len() as f64
}

pub fn mean_absolute_error(y_true: &[f32], y_pred: &[f32]) -> f64 {
    check_lengths(y_true, y_pred);
    let sum: f64 = y_true
        .iter()
        .zip(y_pred)
        .map(|(&t, &p)| (t as f64 - p as f64).abs())
        .sum();
    sum / y_true.len() as f64
}

/// Coefficient of determination.
///
/// A constant target yields 1.0 for a perfect fit and 0.0 otherwise.
pub fn r2_score(y_true: &[f32], y_pred: &[f32]) -> f64 {
    check_lengths(y_true, y_pred);
    let n = y_true.len() as f64;
    let mean = y_true.iter().map(|&v| v as f64).sum::<f64>() / n;
    let ss_res: f64 = y_true
        .iter()
        .zip(y_pred)
        .map(|(&t, &p)| (t as f64 - p as f64).powi(2))
        .sum();
    let ss_tot: f64 = y_true.iter().map(|&t| (t as f64 - mean).powi(2)).sum();
    if ss_tot == 0.0 {
        return if ss_res == 0.0 { 1.0 } else { 0.0 };
    }
    1.0 - ss_res / ss_tot
}

/// Mean of `|y - ŷ| / max(|y|, eps)`, as a fraction (not percent).
pub fn mean_absolute_percentage_error(y_true: &[f32], y_pred: &[f32]) -> f64 {
    check_lengths(y_true, y_pred);
    let sum: f64 = y_true
        .iter()
        .zip(y_pred)
        .map(|(&t, &p)| {
            let t = t as f64;
            (t - p as f64).abs() / t.abs().max(f64::EPSILON)
        })
        .sum();
    sum / y_true.len() as f64
}
