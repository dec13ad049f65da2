//! Housing dataset loading and the train/test preparation pipeline.
//!
//! `HousingTable` holds the numeric, mean-imputed feature columns of a CSV
//! export together with the sale-price target. `prepare` turns it into
//! scaled train/test matrices for an optional subset of columns, in the
//! order requested; that order is the positional contract every model
//! trained on the output inherits.
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::math::Array2;
use crate::preprocessing::{fit_scaler, transform_all, Scaler};

pub const DEFAULT_TEST_SIZE: f64 = 0.2;
pub const DEFAULT_RANDOM_STATE: u64 = 42;

/// Options accepted by a data preparation source. `None` means default.
#[derive(Debug, Clone, Default)]
pub struct PrepareOptions {
    /// Restrict (and order) the feature columns.
    pub selected_features: Option<Vec<String>>,
    pub test_size: Option<f64>,
    pub random_state: Option<u64>,
}

impl PrepareOptions {
    pub fn with_features(features: &[String]) -> Self {
        Self {
            selected_features: Some(features.to_vec()),
            ..Default::default()
        }
    }
}

/// Scaled train/test split with the ordered feature names it was built from.
#[derive(Debug, Clone)]
pub struct PreparedData {
    pub x_train: Array2<f32>,
    pub x_test: Array2<f32>,
    pub y_train: Vec<f32>,
    pub y_test: Vec<f32>,
    pub feature_names: Vec<String>,
    /// Scaler fitted on `x_train` before scaling.
    pub scaler: Scaler,
}

/// Anything that can hand the trainer a prepared dataset.
pub trait DataPreparation {
    fn load_and_prepare(&self, options: &PrepareOptions) -> Result<PreparedData>;
}

/// Numeric feature table with the regression target.
#[derive(Debug, Clone)]
pub struct HousingTable {
    pub feature_names: Vec<String>,
    pub x: Array2<f32>,
    pub y: Vec<f32>,
}

fn is_missing(field: &str) -> bool {
    let trimmed = field.trim();
    trimmed.is_empty()
        || trimmed.eq_ignore_ascii_case("na")
        || trimmed.eq_ignore_ascii_case("nan")
}

impl HousingTable {
    /// Read a CSV export, keep numeric columns, drop `drop_columns`, and
    /// mean-impute missing values.
    ///
    /// A column is numeric when every non-missing value parses as a number
    /// and at least one value is present. Rows without a target are skipped.
    pub fn from_csv<P: AsRef<Path>>(
        path: P,
        target_column: &str,
        drop_columns: &[String],
    ) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_path(&path)
            .with_context(|| format!("Failed to open dataset: {}", path.as_ref().display()))?;

        let headers = reader
            .headers()
            .context("Failed to read dataset header row")?
            .clone();

        let target_idx = headers
            .iter()
            .position(|h| h == target_column)
            .ok_or_else(|| anyhow!("Target column '{}' not found in dataset", target_column))?;

        let candidate_cols: Vec<usize> = (0..headers.len())
            .filter(|&i| i != target_idx && !drop_columns.iter().any(|d| d == &headers[i]))
            .collect();

        let mut raw: Vec<Vec<Option<f64>>> = vec![Vec::new(); candidate_cols.len()];
        let mut numeric = vec![true; candidate_cols.len()];
        let mut y = Vec::new();
        let mut skipped = 0usize;

        for (line, result) in reader.records().enumerate() {
            let record = result.with_context(|| format!("Failed to read record {}", line + 1))?;
            let target_field = record.get(target_idx).unwrap_or("");
            if is_missing(target_field) {
                skipped += 1;
                continue;
            }
            let target: f32 = target_field.trim().parse().with_context(|| {
                format!(
                    "Invalid target value '{}' in record {}",
                    target_field,
                    line + 1
                )
            })?;
            y.push(target);

            for (slot, &col) in candidate_cols.iter().enumerate() {
                let field = record.get(col).unwrap_or("");
                let value = if is_missing(field) {
                    None
                } else {
                    match field.trim().parse::<f64>() {
                        Ok(v) => Some(v),
                        Err(_) => {
                            numeric[slot] = false;
                            None
                        }
                    }
                };
                raw[slot].push(value);
            }
        }

        if skipped > 0 {
            log::warn!("Skipped {} rows without a '{}' value", skipped, target_column);
        }
        if y.is_empty() {
            bail!("Dataset {} contains no labelled rows", path.as_ref().display());
        }

        let mut feature_names = Vec::new();
        let mut columns: Vec<Vec<f32>> = Vec::new();
        for (slot, &col) in candidate_cols.iter().enumerate() {
            let present: Vec<f64> = raw[slot].iter().flatten().copied().collect();
            if !numeric[slot] || present.is_empty() {
                continue;
            }
            let mean = present.iter().sum::<f64>() / present.len() as f64;
            columns.push(raw[slot].iter().map(|v| v.unwrap_or(mean) as f32).collect());
            feature_names.push(headers[col].to_string());
        }

        let nrows = y.len();
        let ncols = columns.len();
        let mut data = Vec::with_capacity(nrows * ncols);
        for r in 0..nrows {
            data.extend(columns.iter().map(|c| c[r]));
        }
        let x = Array2::from_shape_vec((nrows, ncols), data)?;

        log::debug!(
            "Loaded {} rows with {} numeric features from {}",
            nrows,
            ncols,
            path.as_ref().display()
        );

        Ok(HousingTable {
            feature_names,
            x,
            y,
        })
    }

    /// Restrict columns, split, and standardize.
    pub fn prepare(&self, options: &PrepareOptions) -> Result<PreparedData> {
        let test_size = options.test_size.unwrap_or(DEFAULT_TEST_SIZE);
        let random_state = options.random_state.unwrap_or(DEFAULT_RANDOM_STATE);

        let (x, feature_names) = match &options.selected_features {
            Some(selected) => {
                let indices = selected
                    .iter()
                    .map(|name| {
                        self.feature_names
                            .iter()
                            .position(|f| f == name)
                            .ok_or_else(|| anyhow!("Selected feature '{}' is not a numeric column", name))
                    })
                    .collect::<Result<Vec<usize>>>()?;
                (self.x.select_columns(&indices), selected.clone())
            }
            None => (self.x.clone(), self.feature_names.clone()),
        };

        if feature_names.is_empty() {
            bail!("No numeric feature columns to train on");
        }

        let (train_idx, test_idx) = train_test_indices(self.y.len(), test_size, random_state)?;

        let x_train_raw = x.select_rows(&train_idx);
        let x_test_raw = x.select_rows(&test_idx);
        let scaler = fit_scaler(&x_train_raw);

        Ok(PreparedData {
            x_train: transform_all(&x_train_raw, &scaler),
            x_test: transform_all(&x_test_raw, &scaler),
            y_train: train_idx.iter().map(|&i| self.y[i]).collect(),
            y_test: test_idx.iter().map(|&i| self.y[i]).collect(),
            feature_names,
            scaler,
        })
    }
}

/// Shuffle `0..n_samples` with a seeded RNG and cut it into (train, test).
///
/// The test split gets `ceil(test_size * n_samples)` rows, taken from the
/// front of the permutation.
pub fn train_test_indices(
    n_samples: usize,
    test_size: f64,
    random_state: u64,
) -> Result<(Vec<usize>, Vec<usize>)> {
    if !(test_size > 0.0 && test_size < 1.0) {
        bail!("test_size must be in (0, 1), got {}", test_size);
    }
    let n_test = (test_size * n_samples as f64).ceil() as usize;
    if n_test == 0 || n_test >= n_samples {
        bail!(
            "test_size {} leaves an empty split for {} samples",
            test_size,
            n_samples
        );
    }

    let mut indices: Vec<usize> = (0..n_samples).collect();
    let mut rng = StdRng::seed_from_u64(random_state);
    indices.shuffle(&mut rng);

    let train = indices.split_off(n_test);
    Ok((train, indices))
}

/// CSV-backed data preparation source.
#[derive(Debug, Clone)]
pub struct CsvHousingSource {
    pub path: PathBuf,
    pub target_column: String,
    pub drop_columns: Vec<String>,
}

impl CsvHousingSource {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            target_column: "SalePrice".to_string(),
            drop_columns: vec!["Id".to_string()],
        }
    }
}

impl DataPreparation for CsvHousingSource {
    fn load_and_prepare(&self, options: &PrepareOptions) -> Result<PreparedData> {
        let table = HousingTable::from_csv(&self.path, &self.target_column, &self.drop_columns)?;
        table.prepare(options)
    }
}
