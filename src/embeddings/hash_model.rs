// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Deterministic development encoder
//!
//! Produces normalized pseudo-random vectors seeded from a hash of the text.
//! Identical texts map to identical vectors; nothing else is meaningful.
//! Used to run the service and its tests without model files.

use crate::embeddings::encoder::{Encoder, EncoderError, EncoderLoader};
use crate::vector::normalize_in_place;
use async_trait::async_trait;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct HashEmbeddingModel {
    dimension: usize,
}

impl HashEmbeddingModel {
    pub fn new(dimension: usize) -> Result<Self, EncoderError> {
        if dimension == 0 {
            return Err(EncoderError::Load(
                "Embedding dimension must be greater than 0".to_string(),
            ));
        }
        Ok(Self { dimension })
    }

    fn generate(&self, text: &str) -> Vec<f32> {
        let mut hasher = DefaultHasher::new();
        text.hash(&mut hasher);
        let mut seed = hasher.finish();

        let mut embedding = Vec::with_capacity(self.dimension);
        for i in 0..self.dimension {
            // Linear congruential step, mixed with the index
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407)
                ^ (i as u64);
            // Top 53 bits to a float in [-1, 1)
            let value = ((seed >> 11) as f64 / (1u64 << 53) as f64) * 2.0 - 1.0;
            embedding.push(value as f32);
        }

        normalize_in_place(&mut embedding);
        embedding
    }
}

impl Encoder for HashEmbeddingModel {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn encode(&self, text: &str) -> Result<Vec<f32>, EncoderError> {
        Ok(self.generate(text))
    }

    fn encode_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EncoderError> {
        Ok(texts.iter().map(|text| self.generate(text)).collect())
    }
}

#[derive(Debug, Clone)]
pub struct HashModelLoader {
    dimension: usize,
}

impl HashModelLoader {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }
}

#[async_trait]
impl EncoderLoader for HashModelLoader {
    async fn load(&self) -> Result<Arc<dyn Encoder>, EncoderError> {
        Ok(Arc::new(HashEmbeddingModel::new(self.dimension)?))
    }
}
