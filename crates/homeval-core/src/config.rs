use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Central configuration for regression models in the crate.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct ModelConfig {
    /// Shrinkage for boosted models; ignored by the random forest.
    pub learning_rate: f32,

    #[serde(flatten)]
    pub model_type: ModelType,
}

/// Hyper-parameters of the in-crate random forest.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ForestParams {
    pub n_estimators: usize,
    /// `None` grows trees until leaves are pure or too small to split.
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Features considered per split; `None` means all of them.
    pub max_features: Option<usize>,
    pub bootstrap: bool,
    pub random_state: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        ForestParams {
            n_estimators: 100,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            bootstrap: true,
            random_state: 42,
        }
    }
}

impl ForestParams {
    /// Wide, deep forest used only to rank features.
    pub fn for_ranking() -> Self {
        ForestParams {
            n_estimators: 500,
            max_depth: Some(50),
            ..ForestParams::default()
        }
    }
}

/// Supported model types and their hyper-parameters.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub enum ModelType {
    RandomForest(ForestParams),
    GBDT {
        max_depth: u32,
        num_boost_round: u32,
        debug: bool,
        training_optimization_level: u8,
        loss_type: String,
    },
}

impl Default for ModelType {
    fn default() -> Self {
        ModelType::RandomForest(ForestParams::default())
    }
}

impl ModelType {
    pub fn name(&self) -> &'static str {
        match self {
            ModelType::RandomForest(_) => "RandomForestRegressor",
            ModelType::GBDT { .. } => "GBDTRegressor",
        }
    }

    /// Number of trees / boosting rounds, logged as a run parameter.
    pub fn n_estimators(&self) -> usize {
        match self {
            ModelType::RandomForest(params) => params.n_estimators,
            ModelType::GBDT {
                num_boost_round, ..
            } => *num_boost_round as usize,
        }
    }
}

impl FromStr for ModelType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "random_forest" | "randomforest" | "rf" => {
                Ok(ModelType::RandomForest(ForestParams::default()))
            }
            "gbdt" => Ok(ModelType::GBDT {
                max_depth: 6,
                num_boost_round: 100,
                debug: false,
                training_optimization_level: 2,
                loss_type: "SquaredError".to_string(),
            }),
            _ => Err(format!(
                "Unknown model type: {}. Expected one of: random_forest, gbdt",
                s
            )),
        }
    }
}

impl ModelConfig {
    pub fn new(learning_rate: f32, model_type: ModelType) -> Self {
        Self {
            learning_rate,
            model_type,
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.1,
            model_type: ModelType::default(),
        }
    }
}
