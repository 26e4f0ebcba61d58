// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Shared helpers for integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use text_duplicate_finder::api::{create_app, AppState};
use text_duplicate_finder::dedup::DuplicatePolicy;
use text_duplicate_finder::embeddings::{
    Encoder, EncoderError, EncoderLoader, EmbeddingProvider, HashModelLoader, ProviderLimits,
};
use tower::ServiceExt; // for `oneshot`

/// Dimension of BAAI/bge-large-en-v1.5
pub const DIM: usize = 1024;

pub fn provider_with(loader: Arc<dyn EncoderLoader>, limits: ProviderLimits) -> Arc<EmbeddingProvider> {
    Arc::new(EmbeddingProvider::new(loader, "test-model", DIM, limits))
}

/// State backed by the deterministic hash encoder
pub fn hash_state() -> AppState {
    state_with(Arc::new(HashModelLoader::new(DIM)))
}

pub fn state_with(loader: Arc<dyn EncoderLoader>) -> AppState {
    AppState::new(
        provider_with(loader, ProviderLimits::default()),
        DuplicatePolicy::default(),
    )
}

pub fn hash_app() -> Router {
    create_app(hash_state())
}

/// Loader that always fails, like a missing model file
pub struct UnavailableLoader;

#[async_trait]
impl EncoderLoader for UnavailableLoader {
    async fn load(&self) -> Result<Arc<dyn Encoder>, EncoderError> {
        Err(EncoderError::Load(
            "ONNX model file not found: /models/model.onnx".to_string(),
        ))
    }
}

/// Loader that fails the first `failures` attempts, then loads the hash encoder
pub struct FlakyLoader {
    pub attempts: AtomicUsize,
    pub failures: usize,
}

impl FlakyLoader {
    pub fn new(failures: usize) -> Self {
        Self {
            attempts: AtomicUsize::new(0),
            failures,
        }
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EncoderLoader for FlakyLoader {
    async fn load(&self) -> Result<Arc<dyn Encoder>, EncoderError> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
        if attempt < self.failures {
            return Err(EncoderError::Load("CUDA out of memory".to_string()));
        }
        HashModelLoader::new(DIM).load().await
    }
}

/// Encoder that loads fine but fails every inference
pub struct BrokenEncoder;

impl Encoder for BrokenEncoder {
    fn dimension(&self) -> usize {
        DIM
    }

    fn encode(&self, _text: &str) -> Result<Vec<f32>, EncoderError> {
        Err(EncoderError::Inference("tensor allocation failed".to_string()))
    }

    fn encode_batch(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>, EncoderError> {
        Err(EncoderError::Inference("tensor allocation failed".to_string()))
    }
}

pub struct BrokenLoader;

#[async_trait]
impl EncoderLoader for BrokenLoader {
    async fn load(&self) -> Result<Arc<dyn Encoder>, EncoderError> {
        Ok(Arc::new(BrokenEncoder))
    }
}

/// Sends a request and returns status plus parsed JSON body
pub async fn send(app: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

pub async fn post_json(
    app: Router,
    uri: &str,
    body: serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn get(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

/// Parses a JSON array of numbers into f32
pub fn as_vector(value: &serde_json::Value) -> Vec<f32> {
    value
        .as_array()
        .expect("expected JSON array")
        .iter()
        .map(|v| v.as_f64().expect("expected number") as f32)
        .collect()
}
