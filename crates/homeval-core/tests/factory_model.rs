use homeval_core::artifacts::{load_json, save_json};
use homeval_core::config::{ForestParams, ModelConfig, ModelType};
use homeval_core::math::Array2;
use homeval_core::models::{build_model, Regressor, TrainedModel};

fn linear_data() -> (Array2<f32>, Vec<f32>) {
    let mut values = Vec::new();
    let mut y = Vec::new();
    for i in 0..40 {
        let a = i as f32;
        let b = (i % 5) as f32;
        values.push(a);
        values.push(b);
        y.push(3.0 * a + b);
    }
    (
        Array2::from_shape_vec((40, 2), values).expect("failed to create feature matrix"),
        y,
    )
}

#[test]
fn test_factory_builds_and_predicts() {
    let (x, y) = linear_data();

    let params = ModelConfig {
        learning_rate: 0.1,
        model_type: ModelType::RandomForest(ForestParams {
            n_estimators: 20,
            ..ForestParams::default()
        }),
    };

    let mut model = build_model(params);
    model.fit(&x, &y).unwrap();
    let preds = model.predict(&x).unwrap();
    assert_eq!(preds.len(), x.nrows());
    assert_eq!(model.name(), "RandomForestRegressor");
}

#[test]
fn test_gbdt_through_factory() {
    let (x, y) = linear_data();

    let params = ModelConfig {
        learning_rate: 0.1,
        model_type: ModelType::GBDT {
            max_depth: 3,
            num_boost_round: 10,
            debug: false,
            training_optimization_level: 2,
            loss_type: "SquaredError".to_string(),
        },
    };

    let mut model = build_model(params);
    model.fit(&x, &y).unwrap();
    let preds = model.predict(&x).unwrap();
    assert_eq!(preds.len(), x.nrows());
    assert!(preds.iter().all(|p| p.is_finite()));
}

#[test]
fn test_persisted_model_predicts_identically() {
    let (x, y) = linear_data();
    let mut model = build_model(ModelConfig::new(
        0.1,
        ModelType::RandomForest(ForestParams {
            n_estimators: 10,
            ..ForestParams::default()
        }),
    ));
    model.fit(&x, &y).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model.json");
    save_json(&path, &model).unwrap();
    let restored: TrainedModel = load_json(&path).unwrap();

    assert_eq!(model.predict(&x).unwrap(), restored.predict(&x).unwrap());
}
