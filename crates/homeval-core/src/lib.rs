//! homeval-core: training and serving building blocks for house-price
//! regression.
//!
//! The crate covers CSV data preparation, a standard scaler, tree-ensemble
//! regressors (an in-crate random forest and a GBDT wrapper), importance
//! ranking, the feature manifest that fixes the inference vector layout,
//! regression metrics, artifact discovery, a file-store experiment tracker
//! and the prediction contract used by the HTTP service.
pub mod artifacts;
pub mod config;
pub mod data_handling;
pub mod error;
pub mod feature_selection;
pub mod manifest;
pub mod math;
pub mod models;
pub mod preprocessing;
pub mod serving;
pub mod stats;
pub mod tracking;
