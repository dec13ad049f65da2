use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};

pub fn validate_csv_file(path: &str) -> Result<()> {
    let pb = PathBuf::from(path);

    let ext = pb
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_lowercase());
    if ext.as_deref() != Some("csv") {
        anyhow::bail!("File must have a .csv extension: {}", path);
    }

    if !pb.exists() {
        anyhow::bail!("File does not exist: {}", path);
    }

    Ok(())
}

/// Read a JSON config file, or fall back to `T::default()` when no path is
/// given. A file that exists but does not parse is an error.
pub fn load_config<T: DeserializeOwned + Default>(config_path: Option<&Path>) -> Result<T> {
    match config_path {
        Some(path) => {
            let config_json = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;
            serde_json::from_str(&config_json)
                .with_context(|| format!("Failed to parse config file: {:?}", path))
        }
        None => {
            log::info!("No config file provided; using defaults.");
            Ok(T::default())
        }
    }
}

pub fn paths_from_strings(paths: &[String]) -> Vec<PathBuf> {
    paths.iter().map(PathBuf::from).collect()
}
