use anyhow::Result;
use clap::ArgMatches;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::str::FromStr;

use homeval_core::config::{ForestParams, ModelConfig, ModelType};
use homeval_core::data_handling::{DEFAULT_RANDOM_STATE, DEFAULT_TEST_SIZE};
use homeval_core::feature_selection::TOP_K;
use homeval_core::manifest::MANIFEST_FILE;

use crate::util::{load_config, validate_csv_file};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct TrainConfig {
    pub train_data: String,
    pub target_column: String,
    pub drop_columns: Vec<String>,
    pub test_size: f64,
    pub random_state: u64,
    pub top_k: usize,
    pub manifest_path: String,
    pub tracking_root: String,
    pub experiment_name: String,
    /// Forest used only to rank features.
    pub ranking_forest: ForestParams,
    /// Final model fitted on the selected features.
    pub model: ModelConfig,
    /// Merged over the built-in Portuguese display names.
    pub display_names: HashMap<String, String>,
}

impl Default for TrainConfig {
    fn default() -> Self {
        TrainConfig {
            train_data: String::from("data/train.csv"),
            target_column: String::from("SalePrice"),
            drop_columns: vec![String::from("Id")],
            test_size: DEFAULT_TEST_SIZE,
            random_state: DEFAULT_RANDOM_STATE,
            top_k: TOP_K,
            manifest_path: String::from(MANIFEST_FILE),
            tracking_root: String::from("mlruns"),
            experiment_name: String::from("House Price Prediction"),
            ranking_forest: ForestParams::for_ranking(),
            model: ModelConfig::default(),
            display_names: HashMap::new(),
        }
    }
}

impl TrainConfig {
    pub fn from_arguments(config_path: Option<&PathBuf>, matches: &ArgMatches) -> Result<Self> {
        let mut config: TrainConfig = load_config(config_path.map(|p| p.as_path()))?;

        // Apply CLI overrides
        if let Some(train_data) = matches.get_one::<String>("train_data") {
            config.train_data = train_data.clone();
        }
        validate_csv_file(&config.train_data)?;

        if let Some(manifest) = matches.get_one::<String>("manifest") {
            config.manifest_path = manifest.clone();
        }

        if let Some(root) = matches.get_one::<String>("tracking_root") {
            config.tracking_root = root.clone();
        }

        if let Some(experiment) = matches.get_one::<String>("experiment") {
            config.experiment_name = experiment.clone();
        }

        if let Some(model_type) = matches.get_one::<String>("model_type") {
            config.model.model_type =
                ModelType::from_str(model_type).map_err(anyhow::Error::msg)?;
        }

        if let Some(&top_k) = matches.get_one::<usize>("top_k") {
            config.top_k = top_k;
        }

        if let Some(&test_size) = matches.get_one::<f64>("test_size") {
            config.test_size = test_size;
        }

        if let Some(&seed) = matches.get_one::<u64>("seed") {
            config.random_state = seed;
        }

        if config.top_k == 0 {
            anyhow::bail!("top_k must be at least 1");
        }

        Ok(config)
    }
}
