use std::error::Error;
use std::fmt;
use std::io;
use std::path::PathBuf;

/// Invalid input to the importance ranking.
#[derive(Debug, Clone, PartialEq)]
pub enum RankingError {
    LengthMismatch { identifiers: usize, scores: usize },
    DuplicateIdentifier(String),
    InvalidScore { identifier: String, score: f64 },
}

impl fmt::Display for RankingError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RankingError::LengthMismatch { identifiers, scores } => write!(
                f,
                "{} feature identifiers but {} importance scores",
                identifiers, scores
            ),
            RankingError::DuplicateIdentifier(id) => {
                write!(f, "feature identifier '{}' appears more than once", id)
            }
            RankingError::InvalidScore { identifier, score } => write!(
                f,
                "importance score for '{}' must be finite and non-negative, got {}",
                identifier, score
            ),
        }
    }
}

impl Error for RankingError {}

/// Failure reading, writing or locating the feature manifest.
#[derive(Debug)]
pub enum ManifestError {
    NotFound { searched: Vec<PathBuf> },
    Io { path: PathBuf, source: io::Error },
    Parse { path: PathBuf, source: serde_json::Error },
}

impl fmt::Display for ManifestError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ManifestError::NotFound { searched } => {
                let paths: Vec<String> = searched.iter().map(|p| p.display().to_string()).collect();
                write!(f, "feature manifest not found (searched: {})", paths.join(", "))
            }
            ManifestError::Io { path, source } => {
                write!(f, "failed to access manifest {}: {}", path.display(), source)
            }
            ManifestError::Parse { path, source } => {
                write!(f, "failed to parse manifest {}: {}", path.display(), source)
            }
        }
    }
}

impl Error for ManifestError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ManifestError::NotFound { .. } => None,
            ManifestError::Io { source, .. } => Some(source),
            ManifestError::Parse { source, .. } => Some(source),
        }
    }
}

/// Failure applying a fitted scaler to an input row.
#[derive(Debug, Clone, PartialEq)]
pub enum ScalerError {
    DimensionMismatch { expected: usize, got: usize },
    NonFinite { column: usize },
    Inconsistent { mean: usize, std: usize },
}

impl fmt::Display for ScalerError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ScalerError::DimensionMismatch { expected, got } => write!(
                f,
                "scaler was fitted on {} features, input has {}",
                expected, got
            ),
            ScalerError::NonFinite { column } => {
                write!(f, "non-finite value in column {} after scaling", column)
            }
            ScalerError::Inconsistent { mean, std } => write!(
                f,
                "scaler has {} means but {} standard deviations",
                mean, std
            ),
        }
    }
}

impl Error for ScalerError {}

/// Failure inside a regression model.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelError {
    NotFitted,
    FeatureCountMismatch { expected: usize, got: usize },
    EmptyTrainingSet,
    NonFinitePrediction,
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ModelError::NotFitted => write!(f, "model has not been fitted"),
            ModelError::FeatureCountMismatch { expected, got } => write!(
                f,
                "model expects {} features, input has {}",
                expected, got
            ),
            ModelError::EmptyTrainingSet => write!(f, "cannot fit a model on zero samples"),
            ModelError::NonFinitePrediction => write!(f, "model produced a non-finite prediction"),
        }
    }
}

impl Error for ModelError {}

/// Failure listing or loading persisted artifacts.
#[derive(Debug)]
pub enum ArtifactError {
    Io { path: PathBuf, source: io::Error },
    Parse { path: PathBuf, source: serde_json::Error },
}

impl fmt::Display for ArtifactError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ArtifactError::Io { path, source } => {
                write!(f, "artifact I/O error at {}: {}", path.display(), source)
            }
            ArtifactError::Parse { path, source } => {
                write!(f, "failed to decode artifact {}: {}", path.display(), source)
            }
        }
    }
}

impl Error for ArtifactError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ArtifactError::Io { source, .. } => Some(source),
            ArtifactError::Parse { source, .. } => Some(source),
        }
    }
}

/// Failure recording a run in the experiment tracker.
#[derive(Debug)]
pub enum TrackingError {
    NoActiveRun,
    InvalidKey(String),
    Io { path: PathBuf, source: io::Error },
}

impl fmt::Display for TrackingError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TrackingError::NoActiveRun => write!(f, "no active tracking run"),
            TrackingError::InvalidKey(key) => write!(f, "invalid tracking key '{}'", key),
            TrackingError::Io { path, source } => {
                write!(f, "tracking store error at {}: {}", path.display(), source)
            }
        }
    }
}

impl Error for TrackingError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            TrackingError::NoActiveRun | TrackingError::InvalidKey(_) => None,
            TrackingError::Io { source, .. } => Some(source),
        }
    }
}

/// Request- and startup-scoped failures of the serving contract.
#[derive(Debug, Clone, PartialEq)]
pub enum ServeError {
    /// Feature manifest missing or unreadable.
    Configuration(String),
    /// No model artifact could be loaded.
    ModelUnavailable(String),
    /// Input vector does not match the manifest.
    Validation { expected: usize, got: usize },
    /// Request body could not be decoded.
    MalformedRequest(String),
    Transform(ScalerError),
    Model(ModelError),
}

impl ServeError {
    /// True when the caller, not the service, is at fault.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ServeError::Validation { .. } | ServeError::MalformedRequest(_)
        )
    }
}

impl fmt::Display for ServeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ServeError::Configuration(msg) => {
                write!(f, "Feature configuration not loaded: {}", msg)
            }
            ServeError::ModelUnavailable(msg) => write!(f, "Model not loaded: {}", msg),
            ServeError::Validation { expected, got } => {
                write!(f, "Expected {} features, got {}", expected, got)
            }
            ServeError::MalformedRequest(msg) => write!(f, "Malformed request: {}", msg),
            ServeError::Transform(e) => write!(f, "Scaler transform error: {}", e),
            ServeError::Model(e) => write!(f, "Prediction failed: {}", e),
        }
    }
}

impl Error for ServeError {}

impl From<ScalerError> for ServeError {
    fn from(e: ScalerError) -> Self {
        ServeError::Transform(e)
    }
}

impl From<ModelError> for ServeError {
    fn from(e: ModelError) -> Self {
        ServeError::Model(e)
    }
}
