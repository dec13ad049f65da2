pub mod input;
pub mod routes;

use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::net::TcpListener;

use homeval_core::artifacts::FsArtifactRegistry;
use homeval_core::serving::ServiceContext;

use input::ServeConfig;

/// Load the service context and serve until the process is stopped.
pub async fn run_server(config: &ServeConfig) -> Result<()> {
    let ctx = Arc::new(ServiceContext::load(
        &config.serving_options(),
        &FsArtifactRegistry,
    ));
    if !ctx.model_loaded() || ctx.manifest().is_none() {
        log::warn!("Starting in degraded mode; /predict will fail until artifacts are present");
    }

    let addr = config.bind_address();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    log::info!("homeval API listening on {}", listener.local_addr()?);

    serve(listener, ctx).await
}

/// Serve the prediction API on an already-bound listener.
pub async fn serve(listener: TcpListener, ctx: Arc<ServiceContext>) -> Result<()> {
    axum::serve(listener, routes::router(ctx))
        .await
        .context("HTTP server error")
}
