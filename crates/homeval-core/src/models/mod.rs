pub mod factory;
pub mod forest;
pub mod gbdt;
pub mod regressor_trait;

pub use factory::{build_model, TrainedModel};
pub use regressor_trait::Regressor;
