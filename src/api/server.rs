/// Router, shared state and the listener loop.
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use axum::routing::{get, post};
use tracing::info;

use crate::api::handlers::{ask, root};
use crate::context::RagContext;
use crate::generator::AnswerGenerator;

/// State shared by all handlers. Cloned per request.
#[derive(Clone)]
pub struct AppState {
    pub rag: RagContext,
    pub generator: Arc<dyn AnswerGenerator>,
    pub top_k: usize,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/ask", post(ask))
        .with_state(state)
}

/// Bind `bind` and serve until Ctrl-C.
///
/// The index must already be built; nothing is indexed from here.
pub async fn serve(state: AppState, bind: &str) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("failed to bind {bind}"))?;
    info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server encountered an error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
