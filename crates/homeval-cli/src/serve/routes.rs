//! HTTP surface of the prediction service.
use axum::{
    extract::{rejection::JsonRejection, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

use homeval_core::error::ServeError;
use homeval_core::serving::{HealthReport, ServiceContext};

#[derive(Debug, Deserialize, Serialize)]
pub struct PredictRequest {
    pub features: Vec<f64>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct PredictResponse {
    pub prediction: f64,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ErrorResponse {
    pub detail: String,
}

/// `ServeError` rendered as a `{"detail": ..}` response.
pub struct ApiError(pub ServeError);

impl From<ServeError> for ApiError {
    fn from(e: ServeError) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = if self.0.is_client_error() {
            log::debug!("Rejected request: {}", self.0);
            StatusCode::BAD_REQUEST
        } else {
            log::error!("Prediction failed: {}", self.0);
            StatusCode::INTERNAL_SERVER_ERROR
        };
        let body = ErrorResponse {
            detail: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

pub fn router(ctx: Arc<ServiceContext>) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/predict", post(predict))
        .layer(middleware::from_fn(log_requests))
        .with_state(ctx)
}

async fn root() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "message": "House Price Prediction API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "health": "/health",
            "predict": "/predict (POST)"
        }
    }))
}

async fn health(State(ctx): State<Arc<ServiceContext>>) -> Json<HealthReport> {
    Json(ctx.health())
}

async fn predict(
    State(ctx): State<Arc<ServiceContext>>,
    payload: Result<Json<PredictRequest>, JsonRejection>,
) -> Result<Json<PredictResponse>, ApiError> {
    let Json(request) =
        payload.map_err(|rejection| ServeError::MalformedRequest(rejection.body_text()))?;
    let prediction = ctx.predict(&request.features)?;
    Ok(Json(PredictResponse { prediction }))
}

async fn log_requests(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let started = Instant::now();
    let response = next.run(req).await;
    log::info!(
        "{} {} -> {} ({:.1} ms)",
        method,
        path,
        response.status().as_u16(),
        started.elapsed().as_secs_f64() * 1000.0
    );
    response
}
