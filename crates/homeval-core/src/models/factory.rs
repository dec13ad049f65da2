use serde::{Deserialize, Serialize};

use crate::config::{ModelConfig, ModelType};
use crate::error::ModelError;
use crate::math::Array2;
use crate::models::forest::RandomForestRegressor;
use crate::models::gbdt::GBDTRegressor;
use crate::models::regressor_trait::Regressor;

/// Every model kind the trainer can persist and the server can load.
///
/// Serialized externally tagged, so a `model.json` artifact records which
/// implementation produced it.
#[derive(Serialize, Deserialize)]
pub enum TrainedModel {
    RandomForest(RandomForestRegressor),
    GBDT(GBDTRegressor),
}

impl Regressor for TrainedModel {
    fn fit(&mut self, x: &Array2<f32>, y: &[f32]) -> Result<(), ModelError> {
        match self {
            TrainedModel::RandomForest(m) => m.fit(x, y),
            TrainedModel::GBDT(m) => m.fit(x, y),
        }
    }

    fn predict(&self, x: &Array2<f32>) -> Result<Vec<f32>, ModelError> {
        match self {
            TrainedModel::RandomForest(m) => m.predict(x),
            TrainedModel::GBDT(m) => m.predict(x),
        }
    }

    fn name(&self) -> &str {
        match self {
            TrainedModel::RandomForest(m) => m.name(),
            TrainedModel::GBDT(m) => m.name(),
        }
    }
}

/// Build an unfitted model from a `ModelConfig`.
pub fn build_model(params: ModelConfig) -> TrainedModel {
    match &params.model_type {
        ModelType::RandomForest(forest) => {
            TrainedModel::RandomForest(RandomForestRegressor::new(forest.clone()))
        }
        ModelType::GBDT { .. } => TrainedModel::GBDT(GBDTRegressor::new(params)),
    }
}
