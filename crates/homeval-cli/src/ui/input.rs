use anyhow::Result;
use clap::ArgMatches;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::util::load_config;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct UiConfig {
    pub host: String,
    pub port: u16,
    /// Base URL of the prediction API; `/predict` is appended.
    pub api_url: String,
    pub manifest_candidates: Vec<String>,
}

impl Default for UiConfig {
    fn default() -> Self {
        UiConfig {
            host: String::from("0.0.0.0"),
            port: 8501,
            api_url: String::from("http://localhost:8000"),
            manifest_candidates: vec![
                String::from("../top_features.json"),
                String::from("top_features.json"),
            ],
        }
    }
}

impl UiConfig {
    pub fn from_arguments(config_path: Option<&PathBuf>, matches: &ArgMatches) -> Result<Self> {
        let mut config: UiConfig = load_config(config_path.map(|p| p.as_path()))?;

        if let Some(host) = matches.get_one::<String>("host") {
            config.host = host.clone();
        }

        if let Some(&port) = matches.get_one::<u16>("port") {
            config.port = port;
        }

        if let Some(api_url) = matches.get_one::<String>("api_url") {
            config.api_url = api_url.clone();
        }

        if let Some(manifest) = matches.get_one::<String>("manifest") {
            config.manifest_candidates = vec![manifest.clone()];
        }

        Ok(config)
    }

    pub fn predict_url(&self) -> String {
        format!("{}/predict", self.api_url.trim_end_matches('/'))
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
