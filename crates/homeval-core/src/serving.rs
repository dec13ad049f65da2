//! The serving contract: an immutable context built once at startup and
//! shared by every request.
//!
//! Startup never fails. A missing manifest or model is recorded on the
//! context and surfaces as a 500 on `predict` and as `model_loaded: false`
//! or an empty feature list on `health`.
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::artifacts::{load_json, resolve_scaler, ArtifactPattern, ArtifactRegistry};
use crate::error::{ModelError, ServeError};
use crate::manifest::{self, ResolvedManifest};
use crate::math::Array2;
use crate::models::{Regressor, TrainedModel};
use crate::preprocessing::Scaler;

pub type SharedModel = Box<dyn Regressor + Send + Sync>;

/// Where the context looks for its inputs.
#[derive(Debug, Clone)]
pub struct ServingOptions {
    pub manifest_candidates: Vec<PathBuf>,
    pub artifact_roots: Vec<PathBuf>,
    pub model_pattern: ArtifactPattern,
    pub scaler_pattern: ArtifactPattern,
}

impl Default for ServingOptions {
    fn default() -> Self {
        ServingOptions {
            manifest_candidates: manifest::default_candidates(),
            artifact_roots: vec![PathBuf::from("../mlruns"), PathBuf::from("mlruns")],
            model_pattern: ArtifactPattern::model(),
            scaler_pattern: ArtifactPattern::scaler(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub model_loaded: bool,
    pub top_features: Vec<String>,
    pub n_features: usize,
    pub scaler_loaded: bool,
}

pub struct ServiceContext {
    manifest: Result<ResolvedManifest, ServeError>,
    model: Result<SharedModel, ServeError>,
    model_path: Option<PathBuf>,
    scaler: Option<Scaler>,
}

impl ServiceContext {
    /// Resolve manifest, model and scaler. Problems are logged and kept on
    /// the context; they never abort startup.
    pub fn load(options: &ServingOptions, registry: &dyn ArtifactRegistry) -> Self {
        let manifest = match manifest::resolve_manifest(&options.manifest_candidates) {
            Ok(resolved) => {
                log::info!(
                    "Loaded feature manifest {} ({} features, version {})",
                    resolved.path.display(),
                    resolved.manifest.len(),
                    resolved.version().unwrap_or_else(|| "unknown".to_string())
                );
                Ok(resolved)
            }
            Err(e) => {
                log::error!("{}", e);
                Err(ServeError::Configuration(e.to_string()))
            }
        };

        let mut model_path = None;
        let mut scaler = None;
        let model = match registry.resolve_latest(&options.artifact_roots, &options.model_pattern)
        {
            Ok(Some(candidate)) => match load_json::<TrainedModel>(&candidate.path) {
                Ok(model) => {
                    log::info!("Loaded {} from {}", model.name(), candidate.path.display());
                    scaler = load_scaler(registry, &candidate.path, options);
                    model_path = Some(candidate.path);
                    Ok(Box::new(model) as SharedModel)
                }
                Err(e) => {
                    log::error!("Failed to load model: {}", e);
                    Err(ServeError::ModelUnavailable(e.to_string()))
                }
            },
            Ok(None) => {
                let roots: Vec<String> = options
                    .artifact_roots
                    .iter()
                    .map(|r| r.display().to_string())
                    .collect();
                let msg = format!("no model artifact found under {}", roots.join(", "));
                log::error!("{}", msg);
                Err(ServeError::ModelUnavailable(msg))
            }
            Err(e) => {
                log::error!("Artifact discovery failed: {}", e);
                Err(ServeError::ModelUnavailable(e.to_string()))
            }
        };

        ServiceContext {
            manifest,
            model,
            model_path,
            scaler,
        }
    }

    /// Assemble a context from already-loaded parts.
    pub fn from_parts(
        manifest: Option<ResolvedManifest>,
        model: Option<SharedModel>,
        scaler: Option<Scaler>,
    ) -> Self {
        ServiceContext {
            manifest: manifest.ok_or_else(|| {
                ServeError::Configuration("no feature manifest provided".to_string())
            }),
            model: model
                .ok_or_else(|| ServeError::ModelUnavailable("no model provided".to_string())),
            model_path: None,
            scaler,
        }
    }

    pub fn manifest(&self) -> Option<&ResolvedManifest> {
        self.manifest.as_ref().ok()
    }

    pub fn model_path(&self) -> Option<&PathBuf> {
        self.model_path.as_ref()
    }

    pub fn model_loaded(&self) -> bool {
        self.model.is_ok()
    }

    pub fn scaler_loaded(&self) -> bool {
        self.scaler.is_some()
    }

    /// Predict for a single input vector ordered as the manifest lists its
    /// features.
    pub fn predict(&self, features: &[f64]) -> Result<f64, ServeError> {
        let model = self.model.as_ref().map_err(Clone::clone)?;
        let manifest = self.manifest.as_ref().map_err(Clone::clone)?;

        let expected = manifest.manifest.len();
        if features.len() != expected {
            return Err(ServeError::Validation {
                expected,
                got: features.len(),
            });
        }

        let row = match &self.scaler {
            Some(scaler) => scaler.transform_row(features)?,
            None => features.iter().map(|&v| v as f32).collect(),
        };

        let x = Array2::from_shape_vec((1, row.len()), row)
            .map_err(|_| ModelError::FeatureCountMismatch { expected, got: features.len() })?;
        let predictions = model.predict(&x)?;
        let value = predictions
            .first()
            .copied()
            .ok_or(ModelError::NonFinitePrediction)?;
        if !value.is_finite() {
            return Err(ModelError::NonFinitePrediction.into());
        }
        Ok(value as f64)
    }

    pub fn health(&self) -> HealthReport {
        let top_features = self
            .manifest()
            .map(|m| m.manifest.identifiers().to_vec())
            .unwrap_or_default();
        HealthReport {
            status: "healthy",
            model_loaded: self.model_loaded(),
            n_features: top_features.len(),
            top_features,
            scaler_loaded: self.scaler_loaded(),
        }
    }
}

fn load_scaler(
    registry: &dyn ArtifactRegistry,
    model_path: &Path,
    options: &ServingOptions,
) -> Option<Scaler> {
    match resolve_scaler(
        registry,
        model_path,
        &options.artifact_roots,
        &options.scaler_pattern,
    ) {
        Ok(Some(candidate)) => match load_json::<Scaler>(&candidate.path) {
            Ok(scaler) => match scaler.check() {
                Ok(()) => {
                    log::info!("Loaded scaler from {}", candidate.path.display());
                    Some(scaler)
                }
                Err(e) => {
                    log::warn!("Ignoring scaler {}: {}", candidate.path.display(), e);
                    None
                }
            },
            Err(e) => {
                log::warn!("Ignoring unreadable scaler: {}", e);
                None
            }
        },
        Ok(None) => {
            log::warn!("No scaler found; raw inputs are passed to the model");
            None
        }
        Err(e) => {
            log::warn!("Scaler discovery failed: {}", e);
            None
        }
    }
}
