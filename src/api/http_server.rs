// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::{
    extract::{DefaultBodyLimit, State},
    http::Uri,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, sync::Arc};
use tokio::signal;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use super::{embed_batch_handler, embed_handler, similarity_handler, ApiError};
use crate::dedup::DuplicatePolicy;
use crate::embeddings::EmbeddingProvider;
use crate::version;

/// Shared state for all handlers
#[derive(Clone, Debug)]
pub struct AppState {
    pub provider: Arc<EmbeddingProvider>,
    pub policy: DuplicatePolicy,
}

impl AppState {
    pub fn new(provider: Arc<EmbeddingProvider>, policy: DuplicatePolicy) -> Self {
        Self { provider, policy }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HealthResponse {
    /// "ok" once the model is loaded, "loading" before
    pub status: String,
    pub version: String,
    pub model: String,
    pub dimension: usize,
    pub model_loaded: bool,
}

pub fn create_app(state: AppState) -> Router {
    // Sized so any batch within the provider limits fits
    let body_limit = state.provider.limits().max_body_bytes();

    Router::new()
        .route("/health", get(health_handler))
        .route("/embed", post(embed_handler))
        .route("/embed/batch", post(embed_batch_handler))
        .route("/similarity", post(similarity_handler))
        .fallback(not_found_handler)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serves `state` on `addr` until Ctrl-C / SIGTERM.
pub async fn start_server(state: AppState, addr: SocketAddr) -> anyhow::Result<()> {
    let app = create_app(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("API server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("API server stopped");
    Ok(())
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let loaded = state.provider.is_loaded();
    Json(HealthResponse {
        status: if loaded { "ok" } else { "loading" }.to_string(),
        version: version::VERSION.to_string(),
        model: state.provider.model_name().to_string(),
        dimension: state.provider.dimension(),
        model_loaded: loaded,
    })
}

async fn not_found_handler(uri: Uri) -> ApiError {
    ApiError::NotFound(format!("No route for {}", uri.path()))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}
