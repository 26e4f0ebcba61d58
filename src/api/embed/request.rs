// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Request bodies for POST /embed and POST /embed/batch

use crate::api::ApiError;
use crate::embeddings::ProviderLimits;
use serde::{Deserialize, Serialize};

/// Request body for POST /embed
///
/// # Example
/// ```json
/// { "text": "Breaking news: Scientists discover new planet" }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbedRequest {
    /// Text to vectorize
    pub text: String,
}

impl EmbedRequest {
    /// Validates the embed request
    ///
    /// # Validation Rules
    /// 1. **text**: must not be empty or whitespace-only
    /// 2. **text length**: at most `limits.max_text_length` characters
    pub fn validate(&self, limits: &ProviderLimits) -> Result<(), ApiError> {
        limits.check_text("text", &self.text)?;
        Ok(())
    }
}

/// Request body for POST /embed/batch
///
/// # Example
/// ```json
/// { "texts": ["First article", "Second article"] }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbedBatchRequest {
    /// Texts to vectorize, in order
    pub texts: Vec<String>,
}

impl EmbedBatchRequest {
    /// Validates the batch request
    ///
    /// # Validation Rules
    /// 1. **texts**: 1 to `limits.max_batch_size` items
    /// 2. **texts[i]**: same rules as [`EmbedRequest::validate`]
    pub fn validate(&self, limits: &ProviderLimits) -> Result<(), ApiError> {
        limits.check_batch(&self.texts)?;
        Ok(())
    }
}
