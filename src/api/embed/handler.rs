// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! POST /embed and POST /embed/batch handlers

use crate::api::embed::{EmbedBatchRequest, EmbedBatchResponse, EmbedRequest, EmbedResponse};
use crate::api::http_server::AppState;
use crate::api::{ApiError, ApiJson};
use axum::{extract::State, Json};
use std::time::Instant;
use tracing::info;

/// POST /embed handler
///
/// Validates the text, then embeds it with the shared provider.
///
/// # Request Body
/// ```json
/// { "text": "Breaking news: Scientists discover new planet" }
/// ```
///
/// # Response Body
/// ```json
/// { "embedding": [0.01, -0.02, ...], "dimension": 1024 }
/// ```
pub async fn embed_handler(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<EmbedRequest>,
) -> Result<Json<EmbedResponse>, ApiError> {
    request.validate(&state.provider.limits())?;

    let start = Instant::now();
    let embedding = state.provider.embed_one(&request.text).await?;

    info!(
        chars = request.text.chars().count(),
        dimension = embedding.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Embedded text"
    );
    Ok(Json(EmbedResponse::from(embedding)))
}

/// POST /embed/batch handler
///
/// Embeds all texts as one all-or-nothing batch. Output order matches input order.
///
/// # Request Body
/// ```json
/// { "texts": ["first", "second", "third"] }
/// ```
///
/// # Response Body
/// ```json
/// { "embeddings": [[...], [...], [...]], "dimension": 1024, "count": 3 }
/// ```
pub async fn embed_batch_handler(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<EmbedBatchRequest>,
) -> Result<Json<EmbedBatchResponse>, ApiError> {
    request.validate(&state.provider.limits())?;

    let start = Instant::now();
    let embeddings = state.provider.embed_many(&request.texts).await?;

    info!(
        count = embeddings.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Embedded batch"
    );
    Ok(Json(EmbedBatchResponse::new(
        embeddings,
        state.provider.dimension(),
    )))
}
