// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Embedding Provider
//!
//! Owns the one process-wide encoder and exposes it only through
//! `embed_one` / `embed_many`.
//!
//! - Initialization runs at most once at a time behind a `tokio::sync::OnceCell`;
//!   concurrent first callers wait for the same load and never see a
//!   half-built encoder.
//! - The load runs in its own task, so a caller that goes away mid-load
//!   does not abandon it; later callers join the same load.
//! - A failed load leaves the cell empty, so the next request retries.
//! - Size limits are checked before initialization or inference.
//! - Inference runs on the blocking pool; batches are all-or-nothing.

use crate::embeddings::encoder::{Encoder, EncoderError, EncoderLoader};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::{debug, error, info};

pub const DEFAULT_MAX_TEXT_LENGTH: usize = 8192;
pub const DEFAULT_MAX_BATCH_SIZE: usize = 96;

/// Smallest request body limit; leaves room for /similarity vectors
pub const MIN_BODY_LIMIT_BYTES: usize = 2 * 1024 * 1024;

/// JSON bytes per character when a client escapes everything: a character
/// outside the BMP becomes a `\uXXXX\uXXXX` surrogate pair.
const MAX_ESCAPED_CHAR_BYTES: usize = 12;

/// Envelope, quotes and separators around the texts
const BODY_OVERHEAD_BYTES: usize = 64 * 1024;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EmbeddingError {
    /// Input rejected before any model work
    #[error("Validation error for {field}: {message}")]
    Validation { field: String, message: String },

    /// The encoder could not be initialized; a later call may retry
    #[error("Embedding provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// The encoder failed during inference or returned malformed output
    #[error("Embedding provider error: {0}")]
    ProviderError(String),
}

impl EmbeddingError {
    fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        EmbeddingError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Request-size bounds enforced before the encoder is touched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderLimits {
    /// Maximum characters per text
    pub max_text_length: usize,
    /// Maximum texts per batch
    pub max_batch_size: usize,
}

impl Default for ProviderLimits {
    fn default() -> Self {
        Self {
            max_text_length: DEFAULT_MAX_TEXT_LENGTH,
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
        }
    }
}

impl ProviderLimits {
    /// Rejects empty, whitespace-only and oversized text. Length is in characters.
    pub fn check_text(&self, field: &str, text: &str) -> Result<(), EmbeddingError> {
        if text.trim().is_empty() {
            return Err(EmbeddingError::validation(
                field,
                "text cannot be empty or contain only whitespace",
            ));
        }

        let length = text.chars().count();
        if length > self.max_text_length {
            return Err(EmbeddingError::validation(
                field,
                format!(
                    "text cannot exceed {} characters (got {} characters)",
                    self.max_text_length, length
                ),
            ));
        }
        Ok(())
    }

    /// Largest request body a batch within these limits can produce.
    pub fn max_body_bytes(&self) -> usize {
        self.max_batch_size
            .saturating_mul(self.max_text_length)
            .saturating_mul(MAX_ESCAPED_CHAR_BYTES)
            .saturating_add(BODY_OVERHEAD_BYTES)
            .max(MIN_BODY_LIMIT_BYTES)
    }

    /// Checks the batch size first, then every text.
    pub fn check_batch(&self, texts: &[String]) -> Result<(), EmbeddingError> {
        if texts.is_empty() {
            return Err(EmbeddingError::validation(
                "texts",
                "texts array must contain at least 1 item",
            ));
        }
        if texts.len() > self.max_batch_size {
            return Err(EmbeddingError::validation(
                "texts",
                format!(
                    "texts array cannot contain more than {} items (got {})",
                    self.max_batch_size,
                    texts.len()
                ),
            ));
        }
        for (index, text) in texts.iter().enumerate() {
            self.check_text(&format!("texts[{}]", index), text)?;
        }
        Ok(())
    }
}

pub struct EmbeddingProvider {
    loader: Arc<dyn EncoderLoader>,
    encoder: Arc<OnceCell<Arc<dyn Encoder>>>,
    model_name: String,
    dimension: usize,
    limits: ProviderLimits,
}

impl std::fmt::Debug for EmbeddingProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddingProvider")
            .field("model_name", &self.model_name)
            .field("dimension", &self.dimension)
            .field("limits", &self.limits)
            .field("loaded", &self.is_loaded())
            .finish_non_exhaustive()
    }
}

impl EmbeddingProvider {
    /// Creates a provider. Nothing is loaded until [`warm_up`](Self::warm_up)
    /// or the first embedding call.
    pub fn new(
        loader: Arc<dyn EncoderLoader>,
        model_name: impl Into<String>,
        dimension: usize,
        limits: ProviderLimits,
    ) -> Self {
        Self {
            loader,
            encoder: Arc::new(OnceCell::new()),
            model_name: model_name.into(),
            dimension,
            limits,
        }
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// Dimensionality D of every vector this provider returns
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn limits(&self) -> ProviderLimits {
        self.limits
    }

    pub fn is_loaded(&self) -> bool {
        self.encoder.initialized()
    }

    /// Loads the encoder now instead of on first use.
    pub async fn warm_up(&self) -> Result<(), EmbeddingError> {
        self.encoder().await.map(|_| ())
    }

    /// Embeds a single text.
    ///
    /// # Errors
    /// - `Validation` for empty, whitespace-only or oversized text
    /// - `ProviderUnavailable` if the encoder cannot be loaded
    /// - `ProviderError` if inference fails or returns the wrong dimension
    pub async fn embed_one(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.limits.check_text("text", text)?;

        let encoder = self.encoder().await?;
        let owned = text.to_owned();
        let embedding = tokio::task::spawn_blocking(move || encoder.encode(&owned))
            .await
            .map_err(|e| EmbeddingError::ProviderError(format!("encoding task failed: {}", e)))?
            .map_err(inference_error)?;

        self.check_dimension(&embedding, None)?;
        Ok(embedding)
    }

    /// Embeds `texts` in order; `result[i]` corresponds to `texts[i]`.
    ///
    /// # Errors
    /// Same as [`embed_one`](Self::embed_one), plus `Validation` for an empty
    /// or oversized batch. No partial results are returned.
    pub async fn embed_many(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        self.limits.check_batch(texts)?;

        let encoder = self.encoder().await?;
        let owned = texts.to_vec();
        let start = Instant::now();
        let embeddings = tokio::task::spawn_blocking(move || encoder.encode_batch(&owned))
            .await
            .map_err(|e| EmbeddingError::ProviderError(format!("encoding task failed: {}", e)))?
            .map_err(inference_error)?;

        if embeddings.len() != texts.len() {
            error!(
                expected = texts.len(),
                actual = embeddings.len(),
                "Encoder returned wrong number of embeddings"
            );
            return Err(EmbeddingError::ProviderError(format!(
                "encoder returned {} embeddings for {} texts",
                embeddings.len(),
                texts.len()
            )));
        }
        for (index, embedding) in embeddings.iter().enumerate() {
            self.check_dimension(embedding, Some(index))?;
        }

        debug!(
            count = texts.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Embedded batch"
        );
        Ok(embeddings)
    }

    /// Returns the loaded encoder, loading it if needed.
    async fn encoder(&self) -> Result<Arc<dyn Encoder>, EmbeddingError> {
        if let Some(encoder) = self.encoder.get() {
            return Ok(encoder.clone());
        }

        let cell = self.encoder.clone();
        let loader = self.loader.clone();
        let model_name = self.model_name.clone();
        let dimension = self.dimension;

        // Detached: the init permit stays with this task if the caller is dropped
        tokio::spawn(async move {
            cell.get_or_try_init(|| load_encoder(loader, model_name, dimension))
                .await
                .cloned()
        })
        .await
        .map_err(|e| {
            EmbeddingError::ProviderUnavailable(format!("model loading task failed: {}", e))
        })?
    }

    fn check_dimension(&self, embedding: &[f32], index: Option<usize>) -> Result<(), EmbeddingError> {
        if embedding.len() == self.dimension {
            return Ok(());
        }
        let position = index.map(|i| format!(" at index {}", i)).unwrap_or_default();
        Err(EmbeddingError::ProviderError(format!(
            "unexpected embedding dimension{}: {} (expected {})",
            position,
            embedding.len(),
            self.dimension
        )))
    }
}

async fn load_encoder(
    loader: Arc<dyn EncoderLoader>,
    model_name: String,
    dimension: usize,
) -> Result<Arc<dyn Encoder>, EmbeddingError> {
    info!(model = %model_name, "Loading embedding model");
    let start = Instant::now();

    let encoder = loader.load().await.map_err(|e| {
        error!(model = %model_name, "Failed to load embedding model: {}", e);
        EmbeddingError::ProviderUnavailable(e.to_string())
    })?;

    if encoder.dimension() != dimension {
        error!(
            expected = dimension,
            actual = encoder.dimension(),
            "Embedding model dimension mismatch"
        );
        return Err(EmbeddingError::ProviderUnavailable(format!(
            "model {} produces {}-dimensional vectors, expected {}",
            model_name,
            encoder.dimension(),
            dimension
        )));
    }

    info!(
        model = %model_name,
        dimension,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Embedding model ready"
    );
    Ok(encoder)
}

fn inference_error(e: EncoderError) -> EmbeddingError {
    error!("Embedding inference failed: {}", e);
    EmbeddingError::ProviderError(e.to_string())
}
