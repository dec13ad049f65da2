//! Experiment tracking backed by a plain directory tree.
//!
//! Runs are stored under [`RunLayout`]: a `meta.json` per run, one file per
//! metric holding `<timestamp_ms> <value> <step>` lines and one file per
//! parameter holding its value. Failing to track never fails training; the
//! trainer logs tracker errors and moves on.
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::artifacts::RunLayout;
use crate::error::TrackingError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RunStatus {
    Running,
    Finished,
    Failed,
}

/// Contents of `meta.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMeta {
    pub run_id: String,
    pub experiment: String,
    pub status: RunStatus,
    pub start_time: i64,
    pub end_time: Option<i64>,
}

pub trait ExperimentTracker {
    fn start_run(&mut self, layout: &RunLayout) -> Result<(), TrackingError>;
    fn log_metric(&mut self, key: &str, value: f64) -> Result<(), TrackingError>;
    fn log_param(&mut self, key: &str, value: &str) -> Result<(), TrackingError>;
    fn end_run(&mut self, status: RunStatus) -> Result<(), TrackingError>;
}

/// Keys become file names, so anything that could escape the run directory
/// is refused.
pub fn validate_key(key: &str) -> Result<(), TrackingError> {
    let ok = !key.is_empty()
        && key != "."
        && key != ".."
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | ' '));
    if ok {
        Ok(())
    } else {
        Err(TrackingError::InvalidKey(key.to_string()))
    }
}

struct ActiveRun {
    layout: RunLayout,
    meta: RunMeta,
}

/// File-store tracker. One run may be active at a time.
#[derive(Default)]
pub struct FileTracker {
    experiment: String,
    active: Option<ActiveRun>,
}

impl FileTracker {
    pub fn new(experiment: &str) -> Self {
        FileTracker {
            experiment: experiment.to_string(),
            active: None,
        }
    }

    pub fn active_run_dir(&self) -> Option<PathBuf> {
        self.active.as_ref().map(|run| run.layout.run_dir())
    }

    fn active_mut(&mut self) -> Result<&mut ActiveRun, TrackingError> {
        self.active.as_mut().ok_or(TrackingError::NoActiveRun)
    }
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> TrackingError + '_ {
    move |source| TrackingError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn write_meta(layout: &RunLayout, meta: &RunMeta) -> Result<(), TrackingError> {
    let path = layout.run_dir().join("meta.json");
    let bytes = serde_json::to_vec_pretty(meta).map_err(|e| TrackingError::Io {
        path: path.clone(),
        source: e.into(),
    })?;
    fs::write(&path, bytes).map_err(io_err(&path))
}

/// Read back a run's `meta.json`.
pub fn read_meta(run_dir: &Path) -> Result<RunMeta, TrackingError> {
    let path = run_dir.join("meta.json");
    let content = fs::read_to_string(&path).map_err(io_err(&path))?;
    serde_json::from_str(&content).map_err(|e| TrackingError::Io {
        path: path.clone(),
        source: e.into(),
    })
}

impl ExperimentTracker for FileTracker {
    fn start_run(&mut self, layout: &RunLayout) -> Result<(), TrackingError> {
        if let Some(previous) = self.active.take() {
            log::warn!(
                "Starting a new run while run {} is still active; closing it as failed",
                previous.meta.run_id
            );
            let mut meta = previous.meta;
            meta.status = RunStatus::Failed;
            meta.end_time = Some(Utc::now().timestamp_millis());
            write_meta(&previous.layout, &meta)?;
        }

        for dir in [layout.metrics_dir(), layout.params_dir()] {
            fs::create_dir_all(&dir).map_err(io_err(&dir))?;
        }
        let meta = RunMeta {
            run_id: layout.run_id().to_string(),
            experiment: self.experiment.clone(),
            status: RunStatus::Running,
            start_time: Utc::now().timestamp_millis(),
            end_time: None,
        };
        write_meta(layout, &meta)?;
        log::debug!("Tracking run {} in {}", meta.run_id, layout.run_dir().display());
        self.active = Some(ActiveRun {
            layout: layout.clone(),
            meta,
        });
        Ok(())
    }

    fn log_metric(&mut self, key: &str, value: f64) -> Result<(), TrackingError> {
        validate_key(key)?;
        let run = self.active_mut()?;
        let path = run.layout.metrics_dir().join(key);
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(io_err(&path))?;
        // single-shot metrics are always logged at step 0
        writeln!(file, "{} {} 0", Utc::now().timestamp_millis(), value).map_err(io_err(&path))
    }

    fn log_param(&mut self, key: &str, value: &str) -> Result<(), TrackingError> {
        validate_key(key)?;
        let run = self.active_mut()?;
        let path = run.layout.params_dir().join(key);
        fs::write(&path, value).map_err(io_err(&path))
    }

    fn end_run(&mut self, status: RunStatus) -> Result<(), TrackingError> {
        let mut run = self.active.take().ok_or(TrackingError::NoActiveRun)?;
        run.meta.status = status;
        run.meta.end_time = Some(Utc::now().timestamp_millis());
        write_meta(&run.layout, &run.meta)
    }
}

/// Tracker that records nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTracker;

impl ExperimentTracker for NoopTracker {
    fn start_run(&mut self, _layout: &RunLayout) -> Result<(), TrackingError> {
        Ok(())
    }

    fn log_metric(&mut self, _key: &str, _value: f64) -> Result<(), TrackingError> {
        Ok(())
    }

    fn log_param(&mut self, _key: &str, _value: &str) -> Result<(), TrackingError> {
        Ok(())
    }

    fn end_run(&mut self, _status: RunStatus) -> Result<(), TrackingError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_writes_mlflow_style_files() {
        let dir = tempfile::tempdir().unwrap();
        let layout = RunLayout::new(dir.path(), "House Prices", "run1");
        let mut tracker = FileTracker::new("House Prices");

        tracker.start_run(&layout).unwrap();
        assert_eq!(tracker.active_run_dir(), Some(layout.run_dir()));
        tracker.log_param("model_type", "RandomForestRegressor").unwrap();
        tracker.log_metric("r2", 0.85).unwrap();
        tracker.log_metric("mse", 12.5).unwrap();
        tracker.end_run(RunStatus::Finished).unwrap();
        assert_eq!(tracker.active_run_dir(), None);

        let param = fs::read_to_string(layout.params_dir().join("model_type")).unwrap();
        assert_eq!(param, "RandomForestRegressor");

        let metric = fs::read_to_string(layout.metrics_dir().join("r2")).unwrap();
        let fields: Vec<&str> = metric.trim().split(' ').collect();
        assert_eq!(fields.len(), 3);
        assert_eq!(fields[1], "0.85");

        let meta = read_meta(&layout.run_dir()).unwrap();
        assert_eq!(meta.status, RunStatus::Finished);
        assert!(meta.end_time.is_some());
    }

    #[test]
    fn logging_without_run_is_an_error() {
        let mut tracker = FileTracker::new("exp");
        assert!(matches!(
            tracker.log_metric("r2", 1.0),
            Err(TrackingError::NoActiveRun)
        ));
    }

    #[test]
    fn keys_cannot_escape_run_directory() {
        assert!(validate_key("mape").is_ok());
        assert!(validate_key("top features").is_ok());
        assert!(validate_key("../evil").is_err());
        assert!(validate_key("").is_err());
        assert!(validate_key("..").is_err());
    }
}
