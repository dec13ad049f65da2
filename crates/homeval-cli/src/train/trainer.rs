use anyhow::{Context, Result};
use std::path::PathBuf;

use homeval_core::artifacts::{save_json, RunLayout};
use homeval_core::data_handling::{CsvHousingSource, DataPreparation, PrepareOptions};
use homeval_core::error::TrackingError;
use homeval_core::feature_selection::SelectKBest;
use homeval_core::manifest::{default_display_names, FeatureManifest};
use homeval_core::models::forest::RandomForestRegressor;
use homeval_core::models::{build_model, Regressor};
use homeval_core::stats::RegressionMetrics;
use homeval_core::tracking::{ExperimentTracker, FileTracker, RunStatus};

use super::input::TrainConfig;

/// What a finished training run produced.
#[derive(Debug, Clone)]
pub struct TrainingSummary {
    pub run_id: String,
    pub top_features: Vec<String>,
    pub metrics: RegressionMetrics,
    pub manifest_path: PathBuf,
    pub model_path: PathBuf,
    pub scaler_path: PathBuf,
}

pub fn run_training(config: &TrainConfig) -> Result<TrainingSummary> {
    let source = CsvHousingSource {
        path: PathBuf::from(&config.train_data),
        target_column: config.target_column.clone(),
        drop_columns: config.drop_columns.clone(),
    };
    let mut tracker = FileTracker::new(&config.experiment_name);
    run_pipeline(config, &source, &mut tracker)
}

/// Rank features, write the manifest, refit on the selected columns and
/// persist the model. Tracker failures are logged and never abort the run.
pub fn run_pipeline(
    config: &TrainConfig,
    source: &dyn DataPreparation,
    tracker: &mut dyn ExperimentTracker,
) -> Result<TrainingSummary> {
    let options = PrepareOptions {
        selected_features: None,
        test_size: Some(config.test_size),
        random_state: Some(config.random_state),
    };
    let data = source
        .load_and_prepare(&options)
        .context("Failed to prepare training data")?;
    log::info!(
        "Loaded {} training / {} test rows with {} numeric features",
        data.x_train.nrows(),
        data.x_test.nrows(),
        data.feature_names.len()
    );

    // Rank
    log::info!(
        "Fitting ranking forest ({} trees)",
        config.ranking_forest.n_estimators
    );
    let mut ranker = RandomForestRegressor::new(config.ranking_forest.clone());
    ranker
        .fit(&data.x_train, &data.y_train)
        .context("Failed to fit ranking forest")?;

    let ranked = SelectKBest::new(config.top_k)
        .fit_forest(&ranker, &data.feature_names)
        .context("Failed to rank features")?;
    for (position, feature) in ranked.iter().enumerate() {
        log::info!(
            "  #{:<2} {:<20} {:.4}",
            position + 1,
            feature.identifier,
            feature.score
        );
    }
    let top_features: Vec<String> = ranked.into_iter().map(|f| f.identifier).collect();

    // Manifest
    let mut names = default_display_names();
    names.extend(config.display_names.clone());
    let manifest = FeatureManifest::from_ranked(top_features.clone(), &names);
    let manifest_path = PathBuf::from(&config.manifest_path);
    manifest
        .write(&manifest_path)
        .context("Failed to write feature manifest")?;
    log::info!(
        "Wrote {} features to {}",
        manifest.len(),
        manifest_path.display()
    );

    // Refit on the manifest's columns, in manifest order
    let reduced = source
        .load_and_prepare(&PrepareOptions {
            selected_features: Some(top_features.clone()),
            ..options
        })
        .context("Failed to prepare data for the selected features")?;

    let mut model = build_model(config.model.clone());
    model
        .fit(&reduced.x_train, &reduced.y_train)
        .with_context(|| format!("Failed to fit {}", model.name()))?;
    let predictions = model
        .predict(&reduced.x_test)
        .context("Failed to predict on the test split")?;
    let metrics = RegressionMetrics::compute(&reduced.y_test, &predictions);
    log::info!(
        "{}: mse={:.2} r2={:.4} mae={:.2} mape={:.4}",
        model.name(),
        metrics.mse,
        metrics.r2,
        metrics.mae,
        metrics.mape
    );

    // Persist
    let layout = RunLayout::with_new_run(&config.tracking_root, &config.experiment_name);
    save_json(&layout.model_path(), &model).context("Failed to save model artifact")?;
    save_json(&layout.scaler_path(), &reduced.scaler).context("Failed to save scaler")?;
    log::info!("Model saved to: {}", layout.model_path().display());

    let params = [
        ("model_type", model.name().to_string()),
        (
            "n_estimators",
            config.model.model_type.n_estimators().to_string(),
        ),
        ("n_features", top_features.len().to_string()),
        ("top_features", top_features.join(",")),
    ];
    if let Err(e) = log_run(tracker, &layout, &params, &metrics) {
        log::warn!("TrackingLoggingError: could not record run {}: {}", layout.run_id(), e);
        if let Err(e) = tracker.end_run(RunStatus::Failed) {
            log::debug!("Could not close run {} as failed: {}", layout.run_id(), e);
        }
    }

    Ok(TrainingSummary {
        run_id: layout.run_id().to_string(),
        top_features,
        metrics,
        manifest_path,
        model_path: layout.model_path(),
        scaler_path: layout.scaler_path(),
    })
}

fn log_run(
    tracker: &mut dyn ExperimentTracker,
    layout: &RunLayout,
    params: &[(&str, String)],
    metrics: &RegressionMetrics,
) -> Result<(), TrackingError> {
    tracker.start_run(layout)?;
    for (key, value) in params {
        tracker.log_param(key, value)?;
    }
    for (key, value) in metrics.as_pairs() {
        tracker.log_metric(key, value)?;
    }
    tracker.end_run(RunStatus::Finished)
}
