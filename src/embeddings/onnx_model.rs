// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! ONNX Embedding Model Wrapper
//!
//! This module provides a wrapper around ONNX Runtime for running
//! sentence transformer encoders such as BAAI/bge-large-en-v1.5.
//!
//! Features:
//! - ONNX model loading from disk, or from the HuggingFace Hub cache
//! - GPU acceleration via CUDA (with automatic CPU fallback)
//! - BERT tokenization with truncation to the model's sequence limit
//! - Batched inference in fixed-size chunks
//! - CLS or attention-masked mean pooling
//! - L2-normalized output vectors

use crate::embeddings::encoder::{Encoder, EncoderError, EncoderLoader};
use crate::vector::normalize_in_place;
use anyhow::{Context, Result};
use async_trait::async_trait;
use ndarray::{Array2, ArrayView2, Axis, Ix2};
use ort::execution_providers::{CPUExecutionProvider, CUDAExecutionProvider};
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Value;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tokenizers::{Tokenizer, TruncationParams};
use tracing::{debug, info, warn};

/// How token-level hidden states are reduced to one sentence vector
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Pooling {
    /// Hidden state of the first ([CLS]) token. Used by the bge family.
    Cls,
    /// Mean over non-padding tokens. Used by MiniLM-style models.
    Mean,
}

/// Everything needed to locate and run an ONNX encoder
#[derive(Debug, Clone)]
pub struct OnnxModelSettings {
    /// Model name used in logs and the health endpoint
    pub model_name: String,
    /// HuggingFace Hub repository to fetch missing files from
    pub model_repo: String,
    /// Local model.onnx; fetched from `model_repo` when unset or missing
    pub model_path: Option<PathBuf>,
    /// Local tokenizer.json; fetched from `model_repo` when unset or missing
    pub tokenizer_path: Option<PathBuf>,
    /// Expected hidden size (1024 for bge-large)
    pub dimension: usize,
    /// Tokens per text; longer inputs are truncated
    pub max_sequence_length: usize,
    pub pooling: Pooling,
    /// Texts per inference run
    pub encode_batch_size: usize,
    pub intra_threads: usize,
}

/// ONNX-based sentence embedding model
///
/// The session is behind a `Mutex` because ONNX Runtime's `run` takes
/// `&mut self`; concurrent callers queue on it.
pub struct OnnxEmbeddingModel {
    session: Mutex<Session>,
    tokenizer: Tokenizer,
    model_name: String,
    dimension: usize,
    pooling: Pooling,
    encode_batch_size: usize,
}

impl std::fmt::Debug for OnnxEmbeddingModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxEmbeddingModel")
            .field("model_name", &self.model_name)
            .field("dimension", &self.dimension)
            .field("pooling", &self.pooling)
            .field("encode_batch_size", &self.encode_batch_size)
            .finish_non_exhaustive()
    }
}

impl OnnxEmbeddingModel {
    /// Loads the tokenizer and ONNX session and runs one validation inference.
    ///
    /// Blocking: file IO, optional download and graph optimization.
    ///
    /// # Errors
    /// Returns error if:
    /// - Model or tokenizer files cannot be found or downloaded
    /// - ONNX Runtime initialization fails
    /// - The model's hidden size differs from `settings.dimension`
    pub fn load(settings: &OnnxModelSettings) -> Result<Self> {
        if settings.encode_batch_size == 0 {
            anyhow::bail!("encode_batch_size must be greater than 0");
        }

        let (model_path, tokenizer_path) = resolve_model_files(settings)?;

        info!(
            model = %settings.model_name,
            path = %model_path.display(),
            "Initializing ONNX embedding model"
        );
        let session = build_session(&model_path, settings.intra_threads)?;

        let mut tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow::anyhow!("Failed to load tokenizer: {}", e))?;
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: settings.max_sequence_length,
                ..Default::default()
            }))
            .map_err(|e| anyhow::anyhow!("Failed to configure truncation: {}", e))?;
        // Padding is done per chunk in `run_chunk`
        tokenizer.with_padding(None);

        let model = Self {
            session: Mutex::new(session),
            tokenizer,
            model_name: settings.model_name.clone(),
            dimension: settings.dimension,
            pooling: settings.pooling,
            encode_batch_size: settings.encode_batch_size,
        };

        // Validation inference: checks the hidden size against the configured dimension
        let hidden = model.hidden_size("validation test")?;
        if hidden != model.dimension {
            anyhow::bail!(
                "Model outputs {} dimensions (expected {})",
                hidden,
                model.dimension
            );
        }

        info!(
            model = %model.model_name,
            dimension = model.dimension,
            "ONNX embedding model loaded successfully"
        );
        Ok(model)
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    fn hidden_size(&self, text: &str) -> Result<usize> {
        let vectors = self.run_chunk(&[text])?;
        vectors
            .first()
            .map(Vec::len)
            .context("Validation inference returned no output")
    }

    /// Tokenizes, pads and runs one inference over `texts`, then pools and normalizes.
    fn run_chunk(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let encodings = texts
            .iter()
            .map(|text| {
                self.tokenizer
                    .encode(*text, true)
                    .map_err(|e| anyhow::anyhow!("Tokenization failed: {}", e))
            })
            .collect::<Result<Vec<_>>>()?;

        let batch = encodings.len();
        let max_len = encodings
            .iter()
            .map(|enc| enc.get_ids().len())
            .max()
            .unwrap_or(0);
        if max_len == 0 {
            anyhow::bail!("Tokenizer produced no tokens");
        }

        let mut input_ids = Vec::with_capacity(batch * max_len);
        let mut attention_mask = Vec::with_capacity(batch * max_len);

        for encoding in &encodings {
            let ids = encoding.get_ids();
            let mask = encoding.get_attention_mask();
            let padding = max_len - ids.len();

            input_ids.extend(ids.iter().map(|&id| id as i64));
            input_ids.extend(std::iter::repeat(0i64).take(padding));
            attention_mask.extend(mask.iter().map(|&m| m as i64));
            attention_mask.extend(std::iter::repeat(0i64).take(padding));
        }

        let input_ids_array = Array2::from_shape_vec((batch, max_len), input_ids)
            .context("Failed to create input_ids array")?;
        let attention_mask_array = Array2::from_shape_vec((batch, max_len), attention_mask)
            .context("Failed to create attention_mask array")?;
        let token_type_ids_array = Array2::<i64>::zeros((batch, max_len));

        let mut session = self
            .session
            .lock()
            .map_err(|_| anyhow::anyhow!("ONNX session lock poisoned"))?;
        let outputs = session.run(ort::inputs![
            "input_ids" => Value::from_array(input_ids_array)?,
            "attention_mask" => Value::from_array(attention_mask_array.clone())?,
            "token_type_ids" => Value::from_array(token_type_ids_array)?
        ])?;

        // Index [0]: output names differ between exports
        let hidden_states = outputs[0]
            .try_extract_array::<f32>()
            .context("Failed to extract output tensor")?;
        let shape = hidden_states.shape().to_vec();
        if shape.len() != 3 || shape[0] != batch {
            anyhow::bail!(
                "Model outputs unexpected shape: {:?} (expected [{}, seq_len, hidden])",
                shape,
                batch
            );
        }

        let mut embeddings = Vec::with_capacity(batch);
        for item in 0..batch {
            let token_states = hidden_states
                .index_axis(Axis(0), item)
                .into_dimensionality::<Ix2>()
                .context("Failed to view token states")?;
            let mask = attention_mask_array.row(item);
            let mut pooled = pool(token_states, mask.as_slice().unwrap_or(&[]), self.pooling);
            normalize_in_place(&mut pooled);
            embeddings.push(pooled);
        }

        Ok(embeddings)
    }
}

impl Encoder for OnnxEmbeddingModel {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn encode(&self, text: &str) -> Result<Vec<f32>, EncoderError> {
        let mut vectors = self
            .run_chunk(&[text])
            .map_err(|e| EncoderError::Inference(format!("{:#}", e)))?;
        vectors
            .pop()
            .ok_or_else(|| EncoderError::Inference("model returned no embedding".to_string()))
    }

    fn encode_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EncoderError> {
        let start = Instant::now();
        let mut embeddings = Vec::with_capacity(texts.len());

        for chunk in texts.chunks(self.encode_batch_size) {
            let chunk: Vec<&str> = chunk.iter().map(String::as_str).collect();
            let vectors = self
                .run_chunk(&chunk)
                .map_err(|e| EncoderError::Inference(format!("{:#}", e)))?;
            embeddings.extend(vectors);
        }

        debug!(
            count = texts.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Encoded batch"
        );
        Ok(embeddings)
    }
}

/// Reduces `[seq_len, hidden]` token states to one `hidden`-length vector.
fn pool(token_states: ArrayView2<f32>, mask: &[i64], pooling: Pooling) -> Vec<f32> {
    let (seq_len, hidden_dim) = token_states.dim();

    match pooling {
        Pooling::Cls => token_states.row(0).to_vec(),
        Pooling::Mean => {
            let mut pooled = vec![0.0f32; hidden_dim];
            let mut sum_mask = 0.0f32;

            for i in 0..seq_len {
                let mask_value = mask.get(i).copied().unwrap_or(0) as f32;
                if mask_value == 0.0 {
                    continue;
                }
                sum_mask += mask_value;
                for (j, value) in pooled.iter_mut().enumerate() {
                    *value += token_states[[i, j]] * mask_value;
                }
            }

            for value in &mut pooled {
                *value /= sum_mask.max(1e-9);
            }
            pooled
        }
    }
}

fn build_session(model_path: &Path, intra_threads: usize) -> Result<Session> {
    // Try CUDA first, fall back to CPU if unavailable
    let cuda_result = Session::builder()
        .context("Failed to create session builder")?
        .with_execution_providers([CUDAExecutionProvider::default().build()])
        .context("Failed to set CUDA execution provider")?
        .with_optimization_level(GraphOptimizationLevel::Level3)
        .context("Failed to set optimization level")?
        .with_intra_threads(intra_threads)
        .context("Failed to set intra threads")?
        .commit_from_file(model_path);

    match cuda_result {
        Ok(session) => {
            info!("CUDA execution provider initialized");
            Ok(session)
        }
        Err(e) => {
            warn!("CUDA execution provider failed: {}", e);
            warn!("Falling back to CPU execution provider");
            Session::builder()
                .context("Failed to create session builder")?
                .with_execution_providers([CPUExecutionProvider::default().build()])
                .context("Failed to set CPU execution provider")?
                .with_optimization_level(GraphOptimizationLevel::Level3)
                .context("Failed to set optimization level")?
                .with_intra_threads(intra_threads)
                .context("Failed to set intra threads")?
                .commit_from_file(model_path)
                .with_context(|| {
                    format!("Failed to load ONNX model from {}", model_path.display())
                })
        }
    }
}

/// Uses the configured local files when they exist, otherwise the Hub cache.
fn resolve_model_files(settings: &OnnxModelSettings) -> Result<(PathBuf, PathBuf)> {
    let local_model = settings.model_path.clone().filter(|p| p.exists());
    let local_tokenizer = settings.tokenizer_path.clone().filter(|p| p.exists());

    if let (Some(model), Some(tokenizer)) = (&local_model, &local_tokenizer) {
        return Ok((model.clone(), tokenizer.clone()));
    }

    if let Some(path) = settings.model_path.as_ref().filter(|p| !p.exists()) {
        warn!("Configured model file not found: {}", path.display());
    }
    if let Some(path) = settings.tokenizer_path.as_ref().filter(|p| !p.exists()) {
        warn!("Configured tokenizer file not found: {}", path.display());
    }

    info!(repo = %settings.model_repo, "Fetching model files from HuggingFace Hub");
    let api = hf_hub::api::sync::Api::new().context("Failed to create HuggingFace Hub client")?;
    let repo = api.model(settings.model_repo.clone());

    let model = match local_model {
        Some(path) => path,
        None => repo
            .get("onnx/model.onnx")
            .with_context(|| format!("Failed to fetch onnx/model.onnx from {}", settings.model_repo))?,
    };
    let tokenizer = match local_tokenizer {
        Some(path) => path,
        None => repo
            .get("tokenizer.json")
            .with_context(|| format!("Failed to fetch tokenizer.json from {}", settings.model_repo))?,
    };

    Ok((model, tokenizer))
}

/// Loads an [`OnnxEmbeddingModel`] on the blocking pool
#[derive(Debug, Clone)]
pub struct OnnxModelLoader {
    settings: OnnxModelSettings,
}

impl OnnxModelLoader {
    pub fn new(settings: OnnxModelSettings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl EncoderLoader for OnnxModelLoader {
    async fn load(&self) -> Result<Arc<dyn Encoder>, EncoderError> {
        let settings = self.settings.clone();
        let model = tokio::task::spawn_blocking(move || OnnxEmbeddingModel::load(&settings))
            .await
            .map_err(|e| EncoderError::Load(format!("model loading task failed: {}", e)))?
            .map_err(|e| EncoderError::Load(format!("{:#}", e)))?;
        Ok(Arc::new(model))
    }
}
