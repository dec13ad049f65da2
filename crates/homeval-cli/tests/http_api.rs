//! Prediction API and UI over real sockets.

use std::fs;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use tokio::net::TcpListener;

use homeval_cli::serve::serve;
use homeval_cli::ui::input::UiConfig;
use homeval_cli::ui::{serve_ui, UiState};
use homeval_core::error::ModelError;
use homeval_core::manifest::{resolve_manifest, ResolvedManifest};
use homeval_core::math::Array2;
use homeval_core::models::Regressor;
use homeval_core::serving::ServiceContext;

struct SumModel;

impl Regressor for SumModel {
    fn fit(&mut self, _x: &Array2<f32>, _y: &[f32]) -> Result<(), ModelError> {
        Ok(())
    }

    fn predict(&self, x: &Array2<f32>) -> Result<Vec<f32>, ModelError> {
        Ok(x.rows().map(|r| r.iter().sum()).collect())
    }
}

struct FailingModel;

impl Regressor for FailingModel {
    fn fit(&mut self, _x: &Array2<f32>, _y: &[f32]) -> Result<(), ModelError> {
        Ok(())
    }

    fn predict(&self, _x: &Array2<f32>) -> Result<Vec<f32>, ModelError> {
        Err(ModelError::NotFitted)
    }
}

fn write_manifest(dir: &std::path::Path) -> PathBuf {
    let path = dir.join("top_features.json");
    fs::write(
        &path,
        r#"{"top_features":["F1","F2"],"feature_names":{"F1":"Feature One"}}"#,
    )
    .unwrap();
    path
}

fn resolved(dir: &std::path::Path) -> ResolvedManifest {
    resolve_manifest(&[write_manifest(dir)]).unwrap()
}

async fn spawn_api(ctx: ServiceContext) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(serve(listener, Arc::new(ctx)));
    addr
}

#[tokio::test]
async fn predict_sums_valid_vector() {
    let dir = tempfile::tempdir().unwrap();
    let addr = spawn_api(ServiceContext::from_parts(
        Some(resolved(dir.path())),
        Some(Box::new(SumModel)),
        None,
    ))
    .await;

    let response = Client::new()
        .post(format!("http://{}/predict", addr))
        .json(&json!({"features": [2.0, 3.0]}))
        .send()
        .await
        .expect("predict request");
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({"prediction": 5.0}));
}

#[tokio::test]
async fn wrong_length_is_a_client_error() {
    let dir = tempfile::tempdir().unwrap();
    let addr = spawn_api(ServiceContext::from_parts(
        Some(resolved(dir.path())),
        Some(Box::new(SumModel)),
        None,
    ))
    .await;
    let client = Client::new();

    let response = client
        .post(format!("http://{}/predict", addr))
        .json(&json!({"features": [2.0]}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["detail"], "Expected 2 features, got 1");

    let response = client
        .post(format!("http://{}/predict", addr))
        .header("content-type", "application/json")
        .body("{\"features\": [1, ")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert!(body["detail"].is_string());
}

#[tokio::test]
async fn server_side_failures_are_500() {
    let dir = tempfile::tempdir().unwrap();
    let client = Client::new();

    let no_model = spawn_api(ServiceContext::from_parts(Some(resolved(dir.path())), None, None)).await;
    let response = client
        .post(format!("http://{}/predict", no_model))
        .json(&json!({"features": [1.0, 2.0]}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json().await.unwrap();
    assert!(body["detail"].as_str().unwrap().starts_with("Model not loaded"));

    let broken = spawn_api(ServiceContext::from_parts(
        Some(resolved(dir.path())),
        Some(Box::new(FailingModel)),
        None,
    ))
    .await;
    let response = client
        .post(format!("http://{}/predict", broken))
        .json(&json!({"features": [1.0, 2.0]}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    // the process keeps serving after a failure
    let health = client
        .get(format!("http://{}/health", broken))
        .send()
        .await
        .unwrap();
    assert_eq!(health.status(), StatusCode::OK);
}

#[tokio::test]
async fn health_without_model_is_still_ok() {
    let addr = spawn_api(ServiceContext::from_parts(None, None, None)).await;

    let response = Client::new()
        .get(format!("http://{}/health", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(
        body,
        json!({
            "status": "healthy",
            "model_loaded": false,
            "top_features": [],
            "n_features": 0,
            "scaler_loaded": false
        })
    );
}

#[tokio::test]
async fn root_lists_endpoints() {
    let addr = spawn_api(ServiceContext::from_parts(None, None, None)).await;
    let body: Value = Client::new()
        .get(format!("http://{}/", addr))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["endpoints"]["predict"], "/predict (POST)");
}

#[tokio::test]
async fn ui_form_round_trips_through_api() {
    let dir = tempfile::tempdir().unwrap();
    let manifest_path = write_manifest(dir.path());
    let api = spawn_api(ServiceContext::from_parts(
        Some(resolve_manifest(&[manifest_path.clone()]).unwrap()),
        Some(Box::new(SumModel)),
        None,
    ))
    .await;

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let ui = listener.local_addr().unwrap();
    let config = UiConfig {
        api_url: format!("http://{}", api),
        manifest_candidates: vec![manifest_path.to_string_lossy().into_owned()],
        ..UiConfig::default()
    };
    tokio::spawn(serve_ui(listener, UiState::new(config)));
    let client = Client::new();

    let page = client
        .get(format!("http://{}/", ui))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(page.contains("Feature One"));
    assert!(page.contains("F2"));

    let page = client
        .post(format!("http://{}/predict", ui))
        .form(&[("feature_0", "1200.5"), ("feature_1", "300")])
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(page.contains("R$ 1,500.50"), "{}", page);
    assert!(page.contains("Resumo dos Atributos"));
}

#[tokio::test]
async fn ui_reports_missing_manifest_and_unreachable_api() {
    let dir = tempfile::tempdir().unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let ui = listener.local_addr().unwrap();
    let config = UiConfig {
        api_url: "http://127.0.0.1:9".to_string(),
        manifest_candidates: vec![dir.path().join("missing.json").to_string_lossy().into_owned()],
        ..UiConfig::default()
    };
    tokio::spawn(serve_ui(listener, UiState::new(config)));

    let page = Client::new()
        .get(format!("http://{}/", ui))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(page.contains("Configuração de features não encontrada"));

    let manifest_path = write_manifest(dir.path());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let ui = listener.local_addr().unwrap();
    let config = UiConfig {
        api_url: "http://127.0.0.1:9".to_string(),
        manifest_candidates: vec![manifest_path.to_string_lossy().into_owned()],
        ..UiConfig::default()
    };
    tokio::spawn(serve_ui(listener, UiState::new(config)));

    let page = Client::new()
        .post(format!("http://{}/predict", ui))
        .form(&[("feature_0", "1"), ("feature_1", "2")])
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(page.contains("Erro de conexão com a API"));
}
