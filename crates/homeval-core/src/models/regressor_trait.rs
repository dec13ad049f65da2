use crate::error::ModelError;
use crate::math::Array2;

/// Contract shared by every regression model the trainer can fit and the
/// serving layer can call.
pub trait Regressor {
    /// Fit the model on row-major samples `x` and targets `y`.
    fn fit(&mut self, x: &Array2<f32>, y: &[f32]) -> Result<(), ModelError>;

    /// Predict one value per row of `x`.
    fn predict(&self, x: &Array2<f32>) -> Result<Vec<f32>, ModelError>;

    /// Human readable name, logged as the `model_type` run parameter.
    fn name(&self) -> &str {
        "regressor"
    }
}
