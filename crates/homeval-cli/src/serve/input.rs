use anyhow::Result;
use clap::ArgMatches;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use homeval_core::artifacts::{ArtifactPattern, MODEL_FILE, SCALER_FRAGMENT};
use homeval_core::serving::ServingOptions;

use crate::util::{load_config, paths_from_strings};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ServeConfig {
    pub host: String,
    pub port: u16,
    /// Probed in order; the first existing file wins.
    pub manifest_candidates: Vec<String>,
    /// Searched recursively for the newest model artifact.
    pub artifact_roots: Vec<String>,
    pub model_file: String,
    /// Any `*.json` whose name contains this fragment is a scaler.
    pub scaler_fragment: String,
}

impl Default for ServeConfig {
    fn default() -> Self {
        ServeConfig {
            host: String::from("0.0.0.0"),
            port: 8000,
            manifest_candidates: vec![
                String::from("../top_features.json"),
                String::from("top_features.json"),
            ],
            artifact_roots: vec![String::from("../mlruns"), String::from("mlruns")],
            model_file: String::from(MODEL_FILE),
            scaler_fragment: String::from(SCALER_FRAGMENT),
        }
    }
}

impl ServeConfig {
    pub fn from_arguments(config_path: Option<&PathBuf>, matches: &ArgMatches) -> Result<Self> {
        let mut config: ServeConfig = load_config(config_path.map(|p| p.as_path()))?;

        if let Some(host) = matches.get_one::<String>("host") {
            config.host = host.clone();
        }

        if let Some(&port) = matches.get_one::<u16>("port") {
            config.port = port;
        }

        if let Some(manifest) = matches.get_one::<String>("manifest") {
            config.manifest_candidates = vec![manifest.clone()];
        }

        if let Some(roots) = matches.get_many::<String>("artifact_root") {
            config.artifact_roots = roots.cloned().collect();
        }

        Ok(config)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn serving_options(&self) -> ServingOptions {
        ServingOptions {
            manifest_candidates: paths_from_strings(&self.manifest_candidates),
            artifact_roots: paths_from_strings(&self.artifact_roots),
            model_pattern: ArtifactPattern::FileName(self.model_file.clone()),
            scaler_pattern: ArtifactPattern::Contains {
                fragment: self.scaler_fragment.clone(),
                extension: String::from("json"),
            },
        }
    }
}
