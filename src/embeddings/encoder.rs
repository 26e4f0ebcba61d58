// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Encoder abstraction
//!
//! The provider only sees the encoder through these two traits:
//! [`EncoderLoader`] builds the expensive resource once, and [`Encoder`] runs
//! read-only inference on it. Inference is synchronous and compute-bound;
//! callers are expected to run it on the blocking pool.

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EncoderError {
    /// The model could not be loaded (missing files, download failure, runtime init)
    #[error("Failed to load encoder: {0}")]
    Load(String),

    /// The model rejected the input or inference failed
    #[error("Inference failed: {0}")]
    Inference(String),
}

/// A loaded text encoder with fixed output dimensionality
#[cfg_attr(test, mockall::automock)]
pub trait Encoder: Send + Sync {
    /// Length of every vector this encoder returns
    fn dimension(&self) -> usize;

    /// Encodes a single text
    fn encode(&self, text: &str) -> Result<Vec<f32>, EncoderError>;

    /// Encodes `texts` in order. The result is index-aligned with the input.
    fn encode_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EncoderError>;
}

/// Builds an [`Encoder`]. Called at most once per successful initialization.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EncoderLoader: Send + Sync {
    async fn load(&self) -> Result<Arc<dyn Encoder>, EncoderError>;
}
