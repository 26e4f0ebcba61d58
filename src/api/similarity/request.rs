// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Request body for POST /similarity

use crate::api::ApiError;
use crate::vector::{ensure_finite, l2_norm, validate_dimension, SimilarityError};
use serde::{Deserialize, Serialize};

/// Request body for POST /similarity
///
/// # Example
/// ```json
/// { "vector1": [0.1, ...], "vector2": [0.2, ...], "threshold": 0.9 }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimilarityRequest {
    pub vector1: Vec<f32>,
    pub vector2: Vec<f32>,

    /// Per-call override of the configured duplicate threshold
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f32>,
}

impl SimilarityRequest {
    /// Validates both vectors
    ///
    /// # Validation Rules
    /// 1. **vector1 / vector2**: equal length
    /// 2. both have exactly `dimension` elements
    /// 3. all values finite
    /// 4. neither has zero magnitude (reported as `zero_vector`)
    ///
    /// The threshold override is checked by the duplicate policy.
    pub fn validate(&self, dimension: usize) -> Result<(), ApiError> {
        if self.vector1.len() != self.vector2.len() {
            let err = SimilarityError::DimensionMismatch {
                left: self.vector1.len(),
                right: self.vector2.len(),
            };
            return Err(ApiError::validation("vector2", err.to_string()));
        }

        for (field, vector) in [("vector1", &self.vector1), ("vector2", &self.vector2)] {
            validate_dimension(vector, dimension)
                .and_then(|_| ensure_finite(vector))
                .map_err(|e| ApiError::validation(field, e.to_string()))?;

            if l2_norm(vector) == 0.0 {
                return Err(ApiError::ZeroVector {
                    field: field.to_string(),
                });
            }
        }
        Ok(())
    }
}
