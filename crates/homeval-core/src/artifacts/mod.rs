//! Persisted model / scaler artifacts and their discovery.
//!
//! Training writes artifacts under a run directory; serving finds them again
//! through an `ArtifactRegistry`, choosing the most recently modified
//! candidate. Nothing links a model to the manifest it was trained against
//! other than that both are the newest of their kind.
pub mod registry;
pub mod store;

pub use registry::{
    newest, resolve_scaler, ArtifactCandidate, ArtifactPattern, ArtifactRegistry,
    FsArtifactRegistry, InMemoryRegistry,
};
pub use store::{load_json, save_json, RunLayout};

/// Fixed filename of a persisted model.
pub const MODEL_FILE: &str = "model.json";
/// Filename of the scaler written next to the model.
pub const SCALER_FILE: &str = "scaler.json";
/// Any `*scaler*.json` file is accepted as a scaler.
pub const SCALER_FRAGMENT: &str = "scaler";
