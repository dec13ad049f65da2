//! The feature manifest: the positional contract between training and serving.
//!
//! A manifest is a small JSON document with exactly two fields:
//!
//! ```json
//! {"top_features": ["OverallQual", "GrLivArea"], "feature_names": {"OverallQual": "Qualidade Geral (1-10)"}}
//! ```
//!
//! `top_features` fixes what position `i` of an inference vector means.
//! `feature_names` only carries identifiers that have a display name; readers
//! fall back to the identifier for the rest. The file carries no version
//! field, its modification time is the version.
//!
//! Writes overwrite the file in place. A crash mid-write can leave a
//! truncated manifest behind; nothing here guards against that.
use std::collections::{BTreeMap, HashMap};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::error::ManifestError;

/// Well-known manifest filename, written in the trainer's working directory.
pub const MANIFEST_FILE: &str = "top_features.json";

/// Locations probed by readers, in order.
pub fn default_candidates() -> Vec<PathBuf> {
    vec![
        Path::new("..").join(MANIFEST_FILE),
        PathBuf::from(MANIFEST_FILE),
    ]
}

/// One input position of the inference vector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureRecord {
    pub identifier: String,
    pub display_name: Option<String>,
}

impl FeatureRecord {
    /// Display name, or the identifier when none was recorded.
    pub fn label(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.identifier)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FeatureManifest {
    #[serde(default)]
    pub top_features: Vec<String>,
    #[serde(default)]
    pub feature_names: BTreeMap<String, String>,
}

impl FeatureManifest {
    /// Build a manifest from ranked identifiers, keeping display names only
    /// for identifiers present in `translations`.
    pub fn from_ranked(ranked: Vec<String>, translations: &HashMap<String, String>) -> Self {
        let feature_names = ranked
            .iter()
            .filter_map(|id| translations.get(id).map(|name| (id.clone(), name.clone())))
            .collect();
        FeatureManifest {
            top_features: ranked,
            feature_names,
        }
    }

    pub fn len(&self) -> usize {
        self.top_features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.top_features.is_empty()
    }

    pub fn identifiers(&self) -> &[String] {
        &self.top_features
    }

    pub fn display_name<'a>(&'a self, identifier: &'a str) -> &'a str {
        self.feature_names
            .get(identifier)
            .map(String::as_str)
            .unwrap_or(identifier)
    }

    /// Ordered records with display names resolved.
    pub fn records(&self) -> Vec<FeatureRecord> {
        self.top_features
            .iter()
            .map(|id| FeatureRecord {
                identifier: id.clone(),
                display_name: self.feature_names.get(id).cloned(),
            })
            .collect()
    }

    /// Overwrite `path` with this manifest.
    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<(), ManifestError> {
        let path = path.as_ref();
        let io_err = |source| ManifestError::Io {
            path: path.to_path_buf(),
            source,
        };
        let file = File::create(path).map_err(io_err)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self).map_err(|e| io_err(e.into()))?;
        writer.write_all(b"\n").map_err(io_err)?;
        writer.flush().map_err(io_err)
    }

    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self, ManifestError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ManifestError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ManifestError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// A manifest together with where it came from.
#[derive(Debug, Clone)]
pub struct ResolvedManifest {
    pub path: PathBuf,
    pub manifest: FeatureManifest,
    /// Implicit version: file modification time.
    pub modified: Option<SystemTime>,
}

impl ResolvedManifest {
    pub fn version(&self) -> Option<String> {
        self.modified
            .map(|t| DateTime::<Local>::from(t).format("%Y-%m-%d %H:%M:%S").to_string())
    }
}

/// Load the first candidate that exists. A candidate that exists but cannot
/// be read or parsed is an error, not a reason to try the next one.
pub fn resolve_manifest(candidates: &[PathBuf]) -> Result<ResolvedManifest, ManifestError> {
    let path = candidates
        .iter()
        .find(|p| p.is_file())
        .ok_or_else(|| ManifestError::NotFound {
            searched: candidates.to_vec(),
        })?;

    let manifest = FeatureManifest::read(path)?;
    let modified = fs::metadata(path).and_then(|m| m.modified()).ok();
    Ok(ResolvedManifest {
        path: path.clone(),
        manifest,
        modified,
    })
}

/// Brazilian-Portuguese labels for the usual housing columns.
pub fn default_display_names() -> HashMap<String, String> {
    [
        ("OverallQual", "Qualidade Geral (1-10)"),
        ("GrLivArea", "Área de Convivência (m²)"),
        ("TotalBsmtSF", "Área Total do Porão (m²)"),
        ("BsmtFinSF1", "Área do Porão Acabada (m²)"),
        ("2ndFlrSF", "Área do 2º Piso (m²)"),
        ("1stFlrSF", "Área do 1º Piso (m²)"),
        ("LotArea", "Tamanho do Terreno (m²)"),
        ("GarageCars", "Capacidade da Garagem (Vagas)"),
        ("GarageArea", "Área da Garagem (m²)"),
        ("YearBuilt", "Ano de Construção"),
        ("FullBath", "Banheiros Completos"),
        ("TotRmsAbvGrd", "Total de Cômodos (acima do solo)"),
        ("YearRemodAdd", "Ano de Remodelação"),
        ("Fireplaces", "Lareiras"),
        ("LotFrontage", "Frente do Terreno (m)"),
        ("WoodDeckSF", "Área de Deck de Madeira (m²)"),
        ("OpenPorchSF", "Área de Varanda Aberta (m²)"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn untranslated_identifiers_are_omitted_on_write() {
        let mut names = HashMap::new();
        names.insert("F1".to_string(), "Feature One".to_string());
        let manifest = FeatureManifest::from_ranked(vec!["F1".into(), "F2".into()], &names);

        assert_eq!(manifest.feature_names.len(), 1);
        assert_eq!(manifest.display_name("F1"), "Feature One");
        assert_eq!(manifest.display_name("F2"), "F2");

        let json = serde_json::to_value(&manifest).unwrap();
        let obj = json.as_object().unwrap();
        assert_eq!(obj.len(), 2);
        assert!(obj["feature_names"].get("F2").is_none());
    }

    #[test]
    fn records_follow_manifest_order() {
        let manifest: FeatureManifest = serde_json::from_str(
            r#"{"top_features": ["b", "a"], "feature_names": {"a": "Alpha"}}"#,
        )
        .unwrap();
        let records = manifest.records();
        assert_eq!(records[0].identifier, "b");
        assert_eq!(records[0].label(), "b");
        assert_eq!(records[1].label(), "Alpha");
    }

    #[test]
    fn missing_fields_default_to_empty() {
        let manifest: FeatureManifest = serde_json::from_str("{}").unwrap();
        assert!(manifest.is_empty());
    }
}
