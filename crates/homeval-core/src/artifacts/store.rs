use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::ArtifactError;

/// Directory layout of one training run inside the tracking root:
///
/// ```text
/// <root>/<experiment>/<run_id>/
///     meta.json
///     metrics/<key>
///     params/<key>
///     artifacts/model/model.json
///     artifacts/model/scaler.json
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunLayout {
    root: PathBuf,
    experiment: String,
    run_id: String,
}

/// Lowercase, with anything but ASCII alphanumerics turned into `-`.
pub fn experiment_dir_name(experiment: &str) -> String {
    let slug: String = experiment
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect();
    if slug.is_empty() {
        "default".to_string()
    } else {
        slug
    }
}

impl RunLayout {
    pub fn new<P: Into<PathBuf>>(root: P, experiment: &str, run_id: &str) -> Self {
        RunLayout {
            root: root.into(),
            experiment: experiment_dir_name(experiment),
            run_id: run_id.to_string(),
        }
    }

    /// New layout with a random 32-hex-digit run id.
    pub fn with_new_run<P: Into<PathBuf>>(root: P, experiment: &str) -> Self {
        let run_id = uuid::Uuid::new_v4().simple().to_string();
        Self::new(root, experiment, &run_id)
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn experiment_dir(&self) -> PathBuf {
        self.root.join(&self.experiment)
    }

    pub fn run_dir(&self) -> PathBuf {
        self.experiment_dir().join(&self.run_id)
    }

    pub fn model_dir(&self) -> PathBuf {
        self.run_dir().join("artifacts").join("model")
    }

    pub fn model_path(&self) -> PathBuf {
        self.model_dir().join(super::MODEL_FILE)
    }

    pub fn scaler_path(&self) -> PathBuf {
        self.model_dir().join(super::SCALER_FILE)
    }

    pub fn metrics_dir(&self) -> PathBuf {
        self.run_dir().join("metrics")
    }

    pub fn params_dir(&self) -> PathBuf {
        self.run_dir().join("params")
    }
}

/// Serialize `value` to `path`, creating parent directories.
pub fn save_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), ArtifactError> {
    let io_err = |source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    let mut writer = BufWriter::new(File::create(path).map_err(io_err)?);
    serde_json::to_writer(&mut writer, value).map_err(|e| io_err(e.into()))?;
    writer.flush().map_err(io_err)
}

pub fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T, ArtifactError> {
    let file = File::open(path).map_err(|source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_reader(BufReader::new(file)).map_err(|source| ArtifactError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
