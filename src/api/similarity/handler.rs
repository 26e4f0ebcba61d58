// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! POST /similarity handler

use crate::api::http_server::AppState;
use crate::api::similarity::{SimilarityRequest, SimilarityResponse};
use crate::api::{ApiError, ApiJson};
use crate::vector::cosine_similarity;
use axum::{extract::State, Json};
use tracing::info;

/// POST /similarity handler
///
/// Validates both vectors against the provider's dimension, computes cosine
/// similarity and applies the duplicate policy. Never touches the model.
///
/// # Request Body
/// ```json
/// { "vector1": [...], "vector2": [...], "threshold": 0.85 }
/// ```
///
/// # Response Body
/// ```json
/// { "similarity": 0.97, "is_duplicate": true, "threshold": 0.85 }
/// ```
pub async fn similarity_handler(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<SimilarityRequest>,
) -> Result<Json<SimilarityResponse>, ApiError> {
    request.validate(state.provider.dimension())?;
    let threshold = state.policy.resolve_threshold(request.threshold)?;

    let similarity = cosine_similarity(&request.vector1, &request.vector2)?;
    let verdict = state.policy.evaluate(similarity, threshold);

    info!(
        similarity = verdict.similarity,
        threshold = verdict.threshold,
        is_duplicate = verdict.is_duplicate,
        "Compared vectors"
    );
    Ok(Json(verdict.into()))
}
