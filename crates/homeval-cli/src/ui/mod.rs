//! Browser form in front of the prediction API.
//!
//! The manifest is re-read on every page view, so a retrain shows up in the
//! form without restarting the UI. The API itself only picks up new
//! artifacts on restart.
pub mod input;
pub mod pages;

use anyhow::{Context, Result};
use axum::{
    extract::State,
    response::Html,
    routing::get,
    Form, Router,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::net::TcpListener;

use homeval_core::manifest::{resolve_manifest, FeatureRecord};

use crate::serve::routes::{ErrorResponse, PredictRequest, PredictResponse};
use crate::util::paths_from_strings;
use input::UiConfig;

#[derive(Clone)]
pub struct UiState {
    config: Arc<UiConfig>,
    client: reqwest::Client,
}

impl UiState {
    pub fn new(config: UiConfig) -> Self {
        UiState {
            config: Arc::new(config),
            client: reqwest::Client::new(),
        }
    }

    fn records(&self) -> Option<Vec<FeatureRecord>> {
        match resolve_manifest(&paths_from_strings(&self.config.manifest_candidates)) {
            Ok(resolved) if !resolved.manifest.is_empty() => Some(resolved.manifest.records()),
            Ok(resolved) => {
                log::warn!("Manifest {} lists no features", resolved.path.display());
                None
            }
            Err(e) => {
                log::warn!("{}", e);
                None
            }
        }
    }
}

pub fn router(state: UiState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/predict", get(index).post(submit))
        .with_state(state)
}

pub async fn run_ui(config: UiConfig) -> Result<()> {
    let addr = config.bind_address();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    log::info!(
        "homeval UI listening on {} (API: {})",
        listener.local_addr()?,
        config.predict_url()
    );
    serve_ui(listener, UiState::new(config)).await
}

pub async fn serve_ui(listener: TcpListener, state: UiState) -> Result<()> {
    axum::serve(listener, router(state))
        .await
        .context("UI server error")
}

async fn index(State(state): State<UiState>) -> Html<String> {
    let page = match state.records() {
        Some(records) => pages::form_page(&records, None, None),
        None => pages::missing_manifest_page(),
    };
    Html(page.into_string())
}

async fn submit(
    State(state): State<UiState>,
    Form(fields): Form<HashMap<String, String>>,
) -> Html<String> {
    let Some(records) = state.records() else {
        return Html(pages::missing_manifest_page().into_string());
    };

    let values = match parse_fields(&fields, records.len()) {
        Ok(values) => values,
        Err(message) => {
            let notice = pages::error_notice(&message);
            return Html(pages::form_page(&records, None, Some(notice)).into_string());
        }
    };

    let notice = match request_prediction(&state.client, &state.config.predict_url(), &values).await
    {
        Ok(prediction) => pages::result_notice(&records, &values, prediction),
        Err(message) => pages::error_notice(&message),
    };
    Html(pages::form_page(&records, Some(&values), Some(notice)).into_string())
}

/// Collect `feature_0..feature_{n-1}` in position order.
pub fn parse_fields(fields: &HashMap<String, String>, n_features: usize) -> Result<Vec<f64>, String> {
    (0..n_features)
        .map(|i| {
            let name = pages::field_name(i);
            let raw = fields
                .get(&name)
                .ok_or_else(|| format!("Erro: campo {} ausente", name))?;
            raw.trim()
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| format!("Erro: valor inválido '{}' em {}", raw, name))
        })
        .collect()
}

/// POST the vector to the API. Every failure becomes a user-facing message.
pub async fn request_prediction(
    client: &reqwest::Client,
    url: &str,
    features: &[f64],
) -> Result<f64, String> {
    let response = client
        .post(url)
        .json(&PredictRequest {
            features: features.to_vec(),
        })
        .send()
        .await
        .map_err(|e| format!("Erro de conexão com a API: {}", e))?;

    let status = response.status();
    if status.is_success() {
        let body: PredictResponse = response
            .json()
            .await
            .map_err(|e| format!("Erro: resposta inválida da API: {}", e))?;
        Ok(body.prediction)
    } else {
        let detail = response
            .json::<ErrorResponse>()
            .await
            .map(|e| format!(" ({})", e.detail))
            .unwrap_or_default();
        Err(format!("Erro no servidor: {}{}", status.as_u16(), detail))
    }
}
