// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Response bodies for POST /embed and POST /embed/batch
//!
//! Field names are part of the public contract with the ingestion pipeline.

use serde::{Deserialize, Serialize};

/// Response body for POST /embed
///
/// # Example
/// ```json
/// { "embedding": [0.013, -0.021, ...], "dimension": 1024 }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmbedResponse {
    /// Vector representation of the text
    pub embedding: Vec<f32>,
    /// Length of `embedding`
    pub dimension: usize,
}

impl From<Vec<f32>> for EmbedResponse {
    fn from(embedding: Vec<f32>) -> Self {
        EmbedResponse {
            dimension: embedding.len(),
            embedding,
        }
    }
}

/// Response body for POST /embed/batch
///
/// # Example
/// ```json
/// { "embeddings": [[...], [...]], "dimension": 1024, "count": 2 }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmbedBatchResponse {
    /// One vector per input text, in input order
    pub embeddings: Vec<Vec<f32>>,
    pub dimension: usize,
    /// Number of embeddings, equal to the number of input texts
    pub count: usize,
}

impl EmbedBatchResponse {
    pub fn new(embeddings: Vec<Vec<f32>>, dimension: usize) -> Self {
        EmbedBatchResponse {
            count: embeddings.len(),
            embeddings,
            dimension,
        }
    }
}
