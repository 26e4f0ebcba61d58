// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Text embeddings
//!
//! [`EmbeddingProvider`] is the only entry point the HTTP layer uses. Encoder
//! backends plug in behind the [`Encoder`] / [`EncoderLoader`] traits:
//! [`OnnxEmbeddingModel`] for real inference and [`HashEmbeddingModel`] for
//! model-free development and testing.

pub mod encoder;
pub mod hash_model;
pub mod onnx_model;
pub mod provider;

pub use encoder::{Encoder, EncoderError, EncoderLoader};
pub use hash_model::{HashEmbeddingModel, HashModelLoader};
pub use onnx_model::{OnnxEmbeddingModel, OnnxModelLoader, OnnxModelSettings, Pooling};
pub use provider::{
    EmbeddingError, EmbeddingProvider, ProviderLimits, DEFAULT_MAX_BATCH_SIZE,
    DEFAULT_MAX_TEXT_LENGTH, MIN_BODY_LIMIT_BYTES,
};
