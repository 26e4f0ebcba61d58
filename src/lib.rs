// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod api;
pub mod config;
pub mod dedup;
pub mod embeddings;
pub mod vector;
pub mod version;

pub use api::{create_app, start_server, ApiError, AppState};
pub use config::{EncoderBackend, ServiceConfig};
pub use dedup::{DuplicatePolicy, DuplicateVerdict};
pub use embeddings::{EmbeddingError, EmbeddingProvider, ProviderLimits};
pub use vector::{cosine_similarity, SimilarityError};
