use std::path::{Path, PathBuf};
use std::time::SystemTime;

use walkdir::WalkDir;

use crate::error::ArtifactError;

/// Which files count as a given kind of artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactPattern {
    /// Exact file name, e.g. `model.json`.
    FileName(String),
    /// File name containing `fragment` with the given extension.
    Contains { fragment: String, extension: String },
}

impl ArtifactPattern {
    pub fn model() -> Self {
        ArtifactPattern::FileName(super::MODEL_FILE.to_string())
    }

    pub fn scaler() -> Self {
        ArtifactPattern::Contains {
            fragment: super::SCALER_FRAGMENT.to_string(),
            extension: "json".to_string(),
        }
    }

    pub fn matches(&self, path: &Path) -> bool {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            return false;
        };
        match self {
            ArtifactPattern::FileName(expected) => name == expected,
            ArtifactPattern::Contains {
                fragment,
                extension,
            } => {
                name.contains(fragment.as_str())
                    && path.extension().and_then(|e| e.to_str()) == Some(extension.as_str())
            }
        }
    }
}

/// A discovered artifact file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactCandidate {
    pub path: PathBuf,
    pub modified: SystemTime,
}

/// Newest-wins selection. Equal timestamps fall back to the greater path so
/// the choice does not depend on listing order.
pub fn newest(candidates: Vec<ArtifactCandidate>) -> Option<ArtifactCandidate> {
    candidates.into_iter().max_by(|a, b| {
        a.modified
            .cmp(&b.modified)
            .then_with(|| a.path.cmp(&b.path))
    })
}

/// Source of artifact candidates.
pub trait ArtifactRegistry {
    /// Every artifact under any of `roots` matching `pattern`. Missing roots
    /// contribute nothing.
    fn list_candidates(
        &self,
        roots: &[PathBuf],
        pattern: &ArtifactPattern,
    ) -> Result<Vec<ArtifactCandidate>, ArtifactError>;

    /// The most recently modified candidate, if any.
    fn resolve_latest(
        &self,
        roots: &[PathBuf],
        pattern: &ArtifactPattern,
    ) -> Result<Option<ArtifactCandidate>, ArtifactError> {
        Ok(newest(self.list_candidates(roots, pattern)?))
    }
}

/// Recursive filesystem scan.
#[derive(Debug, Clone, Default)]
pub struct FsArtifactRegistry;

impl ArtifactRegistry for FsArtifactRegistry {
    fn list_candidates(
        &self,
        roots: &[PathBuf],
        pattern: &ArtifactPattern,
    ) -> Result<Vec<ArtifactCandidate>, ArtifactError> {
        let mut found = Vec::new();
        for root in roots.iter().filter(|r| r.is_dir()) {
            for entry in WalkDir::new(root) {
                let entry = match entry {
                    Ok(e) => e,
                    Err(e) => {
                        log::debug!("Skipping unreadable entry under {}: {}", root.display(), e);
                        continue;
                    }
                };
                if !entry.file_type().is_file() || !pattern.matches(entry.path()) {
                    continue;
                }
                let modified = entry
                    .metadata()
                    .map_err(|e| ArtifactError::Io {
                        path: entry.path().to_path_buf(),
                        source: e.into(),
                    })?
                    .modified()
                    .map_err(|source| ArtifactError::Io {
                        path: entry.path().to_path_buf(),
                        source,
                    })?;
                found.push(ArtifactCandidate {
                    path: entry.into_path(),
                    modified,
                });
            }
        }
        Ok(found)
    }
}

/// Fixed candidate list, for tests and for swapping out the filesystem.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRegistry {
    candidates: Vec<ArtifactCandidate>,
}

impl InMemoryRegistry {
    pub fn push<P: Into<PathBuf>>(&mut self, path: P, modified: SystemTime) {
        self.candidates.push(ArtifactCandidate {
            path: path.into(),
            modified,
        });
    }
}

impl ArtifactRegistry for InMemoryRegistry {
    fn list_candidates(
        &self,
        roots: &[PathBuf],
        pattern: &ArtifactPattern,
    ) -> Result<Vec<ArtifactCandidate>, ArtifactError> {
        Ok(self
            .candidates
            .iter()
            .filter(|c| roots.iter().any(|r| c.path.starts_with(r)) && pattern.matches(&c.path))
            .cloned()
            .collect())
    }
}

/// Find the scaler for a chosen model: first anywhere below the model's
/// directory, then anywhere below `roots`. Newest wins in each step.
pub fn resolve_scaler(
    registry: &dyn ArtifactRegistry,
    model_path: &Path,
    roots: &[PathBuf],
    pattern: &ArtifactPattern,
) -> Result<Option<ArtifactCandidate>, ArtifactError> {
    if let Some(dir) = model_path.parent() {
        if let Some(found) = registry.resolve_latest(&[dir.to_path_buf()], pattern)? {
            return Ok(Some(found));
        }
    }
    registry.resolve_latest(roots, pattern)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn at(secs: u64) -> SystemTime {
        SystemTime::UNIX_EPOCH + Duration::from_secs(secs)
    }

    #[test]
    fn newest_model_wins() {
        let mut registry = InMemoryRegistry::default();
        registry.push("mlruns/exp/a/artifacts/model/model.json", at(10));
        registry.push("mlruns/exp/b/artifacts/model/model.json", at(30));
        registry.push("mlruns/exp/c/artifacts/model/model.json", at(20));
        registry.push("mlruns/exp/b/artifacts/model/notes.json", at(99));

        let latest = registry
            .resolve_latest(&[PathBuf::from("mlruns")], &ArtifactPattern::model())
            .unwrap()
            .unwrap();
        assert_eq!(latest.path, PathBuf::from("mlruns/exp/b/artifacts/model/model.json"));
    }

    #[test]
    fn no_candidates_resolves_to_none() {
        let registry = InMemoryRegistry::default();
        assert!(registry
            .resolve_latest(&[PathBuf::from("mlruns")], &ArtifactPattern::model())
            .unwrap()
            .is_none());
    }

    #[test]
    fn scaler_prefers_model_directory_over_newer_elsewhere() {
        let mut registry = InMemoryRegistry::default();
        registry.push("mlruns/exp/a/artifacts/model/model.json", at(10));
        registry.push("mlruns/exp/a/artifacts/model/scaler.json", at(10));
        registry.push("mlruns/exp/z/artifacts/model/scaler.json", at(50));

        let scaler = resolve_scaler(
            &registry,
            Path::new("mlruns/exp/a/artifacts/model/model.json"),
            &[PathBuf::from("mlruns")],
            &ArtifactPattern::scaler(),
        )
        .unwrap()
        .unwrap();
        assert_eq!(scaler.path, PathBuf::from("mlruns/exp/a/artifacts/model/scaler.json"));
    }

    #[test]
    fn scaler_falls_back_to_roots() {
        let mut registry = InMemoryRegistry::default();
        registry.push("mlruns/exp/z/std_scaler.json", at(50));

        let scaler = resolve_scaler(
            &registry,
            Path::new("mlruns/exp/a/artifacts/model/model.json"),
            &[PathBuf::from("mlruns")],
            &ArtifactPattern::scaler(),
        )
        .unwrap()
        .unwrap();
        assert_eq!(scaler.path, PathBuf::from("mlruns/exp/z/std_scaler.json"));
    }

    #[test]
    fn pattern_matching() {
        assert!(ArtifactPattern::model().matches(Path::new("x/model.json")));
        assert!(!ArtifactPattern::model().matches(Path::new("x/model.json.bak")));
        assert!(ArtifactPattern::scaler().matches(Path::new("x/feature_scaler.json")));
        assert!(!ArtifactPattern::scaler().matches(Path::new("x/scaler.pkl")));
    }
}
