use gbdt::config::Config;
use gbdt::decision_tree::{Data, DataVec};
use gbdt::gradient_boost::GBDT;
use serde::{Deserialize, Serialize};

use crate::config::{ModelConfig, ModelType};
use crate::error::ModelError;
use crate::math::Array2;
use crate::models::regressor_trait::Regressor;

/// Gradient Boosting Decision Tree (GBDT) regressor
#[derive(Serialize, Deserialize)]
pub struct GBDTRegressor {
    model: Option<GBDT>,
    params: ModelConfig,
    n_features: usize,
}

impl GBDTRegressor {
    pub fn new(params: ModelConfig) -> Self {
        GBDTRegressor {
            model: None,
            params,
            n_features: 0,
        }
    }

    fn to_data(x: &Array2<f32>, y: Option<&[f32]>) -> DataVec {
        let mut data = DataVec::new();
        for row in 0..x.nrows() {
            let label = y.map_or(0.0, |y| y[row]);
            data.push(Data::new_training_data(
                x.row_slice(row).to_vec(),
                1.0,
                label,
                None,
            ));
        }
        data
    }
}

impl Regressor for GBDTRegressor {
    fn fit(&mut self, x: &Array2<f32>, y: &[f32]) -> Result<(), ModelError> {
        let feature_size = x.ncols();
        if x.nrows() == 0 || feature_size == 0 {
            return Err(ModelError::EmptyTrainingSet);
        }

        match &self.params.model_type {
            ModelType::GBDT {
                max_depth,
                num_boost_round,
                debug,
                training_optimization_level,
                loss_type,
            } => {
                let mut config = Config::new();

                config.set_feature_size(feature_size);
                config.set_shrinkage(self.params.learning_rate);
                config.set_max_depth(*max_depth);
                config.set_iterations(*num_boost_round as usize);
                config.set_debug(*debug);
                config.set_training_optimization_level(*training_optimization_level);
                config.set_loss(loss_type);

                let mut gbdt = GBDT::new(&config);
                let mut train_x = Self::to_data(x, Some(y));
                gbdt.fit(&mut train_x);

                self.model = Some(gbdt);
                self.n_features = feature_size;
                Ok(())
            }
            other => panic!("Error: Expected ModelType::GBDT params, got {:?}", other),
        }
    }

    fn predict(&self, x: &Array2<f32>) -> Result<Vec<f32>, ModelError> {
        let model = self.model.as_ref().ok_or(ModelError::NotFitted)?;
        if x.ncols() != self.n_features {
            return Err(ModelError::FeatureCountMismatch {
                expected: self.n_features,
                got: x.ncols(),
            });
        }
        let test_x = Self::to_data(x, None);
        Ok(model.predict(&test_x))
    }

    fn name(&self) -> &str {
        "GBDTRegressor"
    }
}
