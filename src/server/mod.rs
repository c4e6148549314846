//! HTTP API over [`StyleCopier`].
//!
//! Returns a composable `Router` with every route under `/api/`:
//!
//! | Method | Path | Body |
//! |--------|------|------|
//! | GET  | `/api/health` | |
//! | POST | `/api/extract-text` | multipart, field `file` |
//! | POST | `/api/analyze-style` | `{reference_articles}` |
//! | POST | `/api/edit-content` | `{draft_content, style_guide}` |
//! | POST | `/api/generate-edit` | `{reference_articles, draft_content}` |
//! | GET  | `/api/models` | |
//!
//! Layers (outermost first): request tracing, permissive CORS, body limit.

pub mod error;
pub mod handlers;
pub mod types;

use crate::error::StyleCopyError;
use crate::workflow::StyleCopier;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Allowance on top of the upload ceiling for multipart framing.
const MULTIPART_OVERHEAD_BYTES: u64 = 64 * 1024;

/// Build the API router.
pub fn router(copier: Arc<StyleCopier>) -> Router {
    let body_limit = copier
        .config()
        .max_upload_bytes
        .saturating_add(MULTIPART_OVERHEAD_BYTES);
    let body_limit = usize::try_from(body_limit).unwrap_or(usize::MAX);

    let api = Router::new()
        .route("/health", get(handlers::health))
        .route("/extract-text", post(handlers::extract_text))
        .route("/analyze-style", post(handlers::analyze_style))
        .route("/edit-content", post(handlers::edit_content))
        .route("/generate-edit", post(handlers::generate_edit))
        .route("/models", get(handlers::models));

    Router::new()
        .nest("/api", api)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(copier)
}

/// Serve the API on `addr` until Ctrl-C.
pub async fn serve(addr: SocketAddr, copier: Arc<StyleCopier>) -> Result<(), StyleCopyError> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let local = listener.local_addr()?;
    tracing::info!(addr = %local, model = %copier.config().model, "API server listening");

    axum::serve(listener, router(copier))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("API server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
