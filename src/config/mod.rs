// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Service configuration
//!
//! Every setting is a CLI flag with an environment-variable twin, so the
//! service can be configured from a `.env` file, the environment, or the
//! command line.

use crate::dedup::{DuplicatePolicy, DEFAULT_DUPLICATE_THRESHOLD};
use crate::embeddings::{
    EmbeddingProvider, EncoderLoader, HashModelLoader, OnnxModelLoader, OnnxModelSettings,
    Pooling, ProviderLimits, DEFAULT_MAX_BATCH_SIZE, DEFAULT_MAX_TEXT_LENGTH,
};
use anyhow::{bail, Result};
use clap::{Parser, ValueEnum};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

/// Which encoder implementation backs the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EncoderBackend {
    /// ONNX Runtime with a HuggingFace tokenizer
    Onnx,
    /// Deterministic hash-based vectors, for development without model files
    Hash,
}

/// Text Duplicate Finder service configuration
#[derive(Parser, Debug, Clone)]
#[command(name = "text-duplicate-finder")]
#[command(version)]
#[command(about = "HTTP service for text vectorization and duplicate news detection", long_about = None)]
pub struct ServiceConfig {
    /// Address to bind the HTTP server to
    #[arg(long, env = "API_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port for the HTTP server
    #[arg(long, env = "API_PORT", default_value_t = 8000)]
    pub port: u16,

    /// Encoder backend
    #[arg(long, env = "EMBEDDING_BACKEND", value_enum, default_value_t = EncoderBackend::Onnx)]
    pub backend: EncoderBackend,

    /// Model name reported in logs and /health
    #[arg(long, env = "EMBEDDING_MODEL", default_value = "bge-large-en-v1.5")]
    pub model_name: String,

    /// HuggingFace Hub repository used when local files are missing
    #[arg(long, env = "EMBEDDING_MODEL_REPO", default_value = "BAAI/bge-large-en-v1.5")]
    pub model_repo: String,

    /// Path to model.onnx
    #[arg(long, env = "EMBEDDING_MODEL_PATH")]
    pub model_path: Option<PathBuf>,

    /// Path to tokenizer.json
    #[arg(long, env = "EMBEDDING_TOKENIZER_PATH")]
    pub tokenizer_path: Option<PathBuf>,

    /// Embedding dimensionality produced by the model
    #[arg(long, env = "EMBEDDING_DIMENSION", default_value_t = 1024)]
    pub dimension: usize,

    /// Tokens per text; longer inputs are truncated by the tokenizer
    #[arg(long, env = "MAX_SEQUENCE_LENGTH", default_value_t = 512)]
    pub max_sequence_length: usize,

    /// Sentence pooling strategy
    #[arg(long, env = "EMBEDDING_POOLING", value_enum, default_value_t = Pooling::Cls)]
    pub pooling: Pooling,

    /// Maximum characters per text
    #[arg(long, env = "MAX_TEXT_LENGTH", default_value_t = DEFAULT_MAX_TEXT_LENGTH)]
    pub max_text_length: usize,

    /// Maximum texts per /embed/batch request
    #[arg(long, env = "MAX_BATCH_SIZE", default_value_t = DEFAULT_MAX_BATCH_SIZE)]
    pub max_batch_size: usize,

    /// Texts per inference run inside a batch
    #[arg(long, env = "ENCODE_BATCH_SIZE", default_value_t = 32)]
    pub encode_batch_size: usize,

    /// ONNX Runtime intra-op threads
    #[arg(long, env = "ONNX_INTRA_THREADS", default_value_t = 4)]
    pub intra_threads: usize,

    /// Default cosine similarity at or above which texts are duplicates
    #[arg(long, env = "DUPLICATE_THRESHOLD", default_value_t = DEFAULT_DUPLICATE_THRESHOLD)]
    pub duplicate_threshold: f32,

    /// Load the model at startup instead of on the first request
    #[arg(long, env = "EAGER_LOAD", default_value_t = true, action = clap::ArgAction::Set)]
    pub eager_load: bool,
}

impl ServiceConfig {
    /// Rejects settings the service cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.dimension == 0 {
            bail!("dimension must be greater than 0");
        }
        if self.max_text_length == 0 {
            bail!("max_text_length must be greater than 0");
        }
        if self.max_batch_size == 0 {
            bail!("max_batch_size must be greater than 0");
        }
        if self.encode_batch_size == 0 {
            bail!("encode_batch_size must be greater than 0");
        }
        if self.max_sequence_length == 0 {
            bail!("max_sequence_length must be greater than 0");
        }
        if self.intra_threads == 0 {
            bail!("intra_threads must be greater than 0");
        }
        DuplicatePolicy::new(self.duplicate_threshold)?;
        self.socket_addr()?;
        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr> {
        let addr = format!("{}:{}", self.host, self.port);
        addr.parse()
            .map_err(|e| anyhow::anyhow!("invalid listen address {}: {}", addr, e))
    }

    pub fn limits(&self) -> ProviderLimits {
        ProviderLimits {
            max_text_length: self.max_text_length,
            max_batch_size: self.max_batch_size,
        }
    }

    pub fn duplicate_policy(&self) -> Result<DuplicatePolicy> {
        Ok(DuplicatePolicy::new(self.duplicate_threshold)?)
    }

    pub fn onnx_settings(&self) -> OnnxModelSettings {
        OnnxModelSettings {
            model_name: self.model_name.clone(),
            model_repo: self.model_repo.clone(),
            model_path: self.model_path.clone(),
            tokenizer_path: self.tokenizer_path.clone(),
            dimension: self.dimension,
            max_sequence_length: self.max_sequence_length,
            pooling: self.pooling,
            encode_batch_size: self.encode_batch_size,
            intra_threads: self.intra_threads,
        }
    }

    pub fn encoder_loader(&self) -> Arc<dyn EncoderLoader> {
        match self.backend {
            EncoderBackend::Onnx => Arc::new(OnnxModelLoader::new(self.onnx_settings())),
            EncoderBackend::Hash => Arc::new(HashModelLoader::new(self.dimension)),
        }
    }

    /// Builds the provider; the model itself is not loaded yet.
    pub fn build_provider(&self) -> EmbeddingProvider {
        EmbeddingProvider::new(
            self.encoder_loader(),
            self.model_name.clone(),
            self.dimension,
            self.limits(),
        )
    }
}
