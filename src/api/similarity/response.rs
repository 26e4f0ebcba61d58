// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Response body for POST /similarity

use crate::dedup::DuplicateVerdict;
use serde::{Deserialize, Serialize};

/// Response body for POST /similarity
///
/// # Example
/// ```json
/// { "similarity": 0.93, "is_duplicate": true, "threshold": 0.85 }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimilarityResponse {
    /// Cosine similarity in [-1.0, 1.0]
    pub similarity: f32,
    /// `similarity >= threshold`
    pub is_duplicate: bool,
    /// Threshold the decision was made with
    pub threshold: f32,
}

impl From<DuplicateVerdict> for SimilarityResponse {
    fn from(verdict: DuplicateVerdict) -> Self {
        SimilarityResponse {
            similarity: verdict.similarity,
            is_duplicate: verdict.is_duplicate,
            threshold: verdict.threshold,
        }
    }
}
