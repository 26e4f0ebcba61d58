// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use crate::dedup::PolicyError;
use crate::embeddings::EmbeddingError;
use crate::vector::SimilarityError;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tracing::{error, warn};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorResponse {
    pub error_type: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<HashMap<String, serde_json::Value>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ApiError {
    NotFound(String),
    InvalidRequest(String),
    UnsupportedMediaType(String),
    PayloadTooLarge(String),
    ValidationError { field: String, message: String },
    ZeroVector { field: String },
    ProviderUnavailable(String),
    ProviderError(String),
}

impl ApiError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        ApiError::ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Machine-readable error kind
    pub fn error_type(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) => "not_found",
            ApiError::InvalidRequest(_) => "invalid_request",
            ApiError::UnsupportedMediaType(_) => "unsupported_media_type",
            ApiError::PayloadTooLarge(_) => "payload_too_large",
            ApiError::ValidationError { .. } => "validation_error",
            ApiError::ZeroVector { .. } => "zero_vector",
            ApiError::ProviderUnavailable(_) => "provider_unavailable",
            ApiError::ProviderError(_) => "provider_error",
        }
    }

    pub fn to_response(&self) -> ErrorResponse {
        let (message, details) = match self {
            ApiError::NotFound(msg)
            | ApiError::InvalidRequest(msg)
            | ApiError::UnsupportedMediaType(msg)
            | ApiError::PayloadTooLarge(msg)
            | ApiError::ProviderUnavailable(msg)
            | ApiError::ProviderError(msg) => (msg.clone(), None),
            ApiError::ValidationError { field, message } => {
                (message.clone(), Some(field_details(field)))
            }
            ApiError::ZeroVector { field } => (
                format!(
                    "{} has zero magnitude; cosine similarity is undefined",
                    field
                ),
                Some(field_details(field)),
            ),
        };

        ErrorResponse {
            error_type: self.error_type().to_string(),
            message,
            details,
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::NotFound(_) => 404,
            ApiError::InvalidRequest(_) => 400,
            ApiError::UnsupportedMediaType(_) => 415,
            ApiError::PayloadTooLarge(_) => 413,
            ApiError::ValidationError { .. } | ApiError::ZeroVector { .. } => 422,
            ApiError::ProviderUnavailable(_) => 503,
            ApiError::ProviderError(_) => 500,
        }
    }

    pub fn is_client_error(&self) -> bool {
        self.status_code() < 500
    }
}

fn field_details(field: &str) -> HashMap<String, serde_json::Value> {
    let mut details = HashMap::new();
    details.insert(
        "field".to_string(),
        serde_json::Value::String(field.to_string()),
    );
    details
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::InvalidRequest(msg) => write!(f, "Invalid request: {}", msg),
            ApiError::UnsupportedMediaType(msg) => write!(f, "Unsupported media type: {}", msg),
            ApiError::PayloadTooLarge(msg) => write!(f, "Payload too large: {}", msg),
            ApiError::ValidationError { field, message } => {
                write!(f, "Validation error for {}: {}", field, message)
            }
            ApiError::ZeroVector { field } => write!(f, "Zero vector: {}", field),
            ApiError::ProviderUnavailable(msg) => write!(f, "Provider unavailable: {}", msg),
            ApiError::ProviderError(msg) => write!(f, "Provider error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.is_client_error() {
            warn!(error_type = self.error_type(), "Request rejected: {}", self);
        } else {
            error!(error_type = self.error_type(), "Request failed: {}", self);
        }

        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.to_response())).into_response()
    }
}

impl From<EmbeddingError> for ApiError {
    fn from(err: EmbeddingError) -> Self {
        match err {
            EmbeddingError::Validation { field, message } => {
                ApiError::ValidationError { field, message }
            }
            // Internal detail stays in the logs; callers get a stable message
            EmbeddingError::ProviderUnavailable(detail) => {
                error!("Embedding provider unavailable: {}", detail);
                ApiError::ProviderUnavailable("embedding model is not available".to_string())
            }
            EmbeddingError::ProviderError(detail) => {
                error!("Embedding provider error: {}", detail);
                ApiError::ProviderError("embedding model failed to process the request".to_string())
            }
        }
    }
}

impl From<SimilarityError> for ApiError {
    fn from(err: SimilarityError) -> Self {
        match err {
            SimilarityError::DimensionMismatch { .. } => ApiError::validation("vector2", err.to_string()),
            SimilarityError::ZeroVector => ApiError::ZeroVector {
                field: "vector".to_string(),
            },
            SimilarityError::WrongDimension { .. }
            | SimilarityError::EmptyVector
            | SimilarityError::NonFinite { .. } => ApiError::validation("vector", err.to_string()),
        }
    }
}

impl From<PolicyError> for ApiError {
    fn from(err: PolicyError) -> Self {
        ApiError::validation("threshold", err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::JsonDataError(e) => ApiError::validation("body", e.body_text()),
            JsonRejection::MissingJsonContentType(e) => {
                ApiError::UnsupportedMediaType(e.body_text())
            }
            other if other.status() == StatusCode::PAYLOAD_TOO_LARGE => {
                ApiError::PayloadTooLarge(other.body_text())
            }
            other => ApiError::InvalidRequest(other.body_text()),
        }
    }
}
