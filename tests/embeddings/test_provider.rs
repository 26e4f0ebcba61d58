// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! EmbeddingProvider tests against the hash encoder
//!
//! Covers ordering, idempotence, size limits and concurrent first use.

use crate::common::{provider_with, FlakyLoader, DIM};
use std::sync::Arc;
use text_duplicate_finder::embeddings::{EmbeddingError, HashModelLoader, ProviderLimits};
use text_duplicate_finder::vector::{cosine_similarity, l2_norm};

fn hash_provider(limits: ProviderLimits) -> Arc<text_duplicate_finder::embeddings::EmbeddingProvider> {
    provider_with(Arc::new(HashModelLoader::new(DIM)), limits)
}

fn texts(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn test_embed_one_is_idempotent() {
    let provider = hash_provider(ProviderLimits::default());

    let first = provider.embed_one("Central bank raises rates").await.unwrap();
    let second = provider.embed_one("Central bank raises rates").await.unwrap();

    assert_eq!(first.len(), DIM);
    assert_eq!(first, second);
    assert!((l2_norm(&first) - 1.0).abs() < 1e-4);
}

#[tokio::test]
async fn test_embed_many_preserves_order() {
    let provider = hash_provider(ProviderLimits::default());
    let input = texts(&["alpha", "beta", "gamma", "delta"]);

    let batch = provider.embed_many(&input).await.unwrap();
    assert_eq!(batch.len(), input.len());

    for (text, embedding) in input.iter().zip(&batch) {
        let single = provider.embed_one(text).await.unwrap();
        assert_eq!(&single, embedding);
    }
}

#[tokio::test]
async fn test_identical_texts_have_similarity_one() {
    let provider = hash_provider(ProviderLimits::default());
    let batch = provider
        .embed_many(&texts(&["Flood warning issued", "Flood warning issued"]))
        .await
        .unwrap();

    let score = cosine_similarity(&batch[0], &batch[1]).unwrap();
    assert!((score - 1.0).abs() < 1e-5);
}

#[tokio::test]
async fn test_custom_limits() {
    let provider = hash_provider(ProviderLimits {
        max_text_length: 10,
        max_batch_size: 2,
    });

    assert!(provider.embed_one("0123456789").await.is_ok());

    let err = provider.embed_one("0123456789x").await.unwrap_err();
    assert!(matches!(err, EmbeddingError::Validation { ref field, .. } if field == "text"));

    let err = provider
        .embed_many(&texts(&["a", "b", "c"]))
        .await
        .unwrap_err();
    assert!(matches!(err, EmbeddingError::Validation { ref field, .. } if field == "texts"));
}

#[tokio::test]
async fn test_length_counts_characters() {
    let provider = hash_provider(ProviderLimits {
        max_text_length: 4,
        max_batch_size: 4,
    });

    // 4 characters, 8 bytes
    assert!(provider.embed_one("ñañá").await.is_ok());
}

#[tokio::test]
async fn test_concurrent_first_calls_load_once() {
    let loader = Arc::new(FlakyLoader::new(0));
    let provider = provider_with(loader.clone(), ProviderLimits::default());

    let mut handles = Vec::new();
    for i in 0..8 {
        let provider = provider.clone();
        handles.push(tokio::spawn(async move {
            provider.embed_one(&format!("story {}", i)).await
        }));
    }
    for handle in handles {
        assert_eq!(handle.await.unwrap().unwrap().len(), DIM);
    }

    assert_eq!(loader.attempts(), 1);
    assert!(provider.is_loaded());
}

#[tokio::test]
async fn test_failed_load_is_retried() {
    let loader = Arc::new(FlakyLoader::new(2));
    let provider = provider_with(loader.clone(), ProviderLimits::default());

    for _ in 0..2 {
        let err = provider.embed_one("x").await.unwrap_err();
        assert!(matches!(err, EmbeddingError::ProviderUnavailable(_)));
        assert!(!provider.is_loaded());
    }

    assert!(provider.embed_one("x").await.is_ok());
    assert_eq!(loader.attempts(), 3);
}

#[tokio::test]
async fn test_dimension_mismatch_at_load() {
    let provider = provider_with(Arc::new(HashModelLoader::new(384)), ProviderLimits::default());

    let err = provider.warm_up().await.unwrap_err();
    assert!(matches!(err, EmbeddingError::ProviderUnavailable(_)));
    assert!(!provider.is_loaded());
}
