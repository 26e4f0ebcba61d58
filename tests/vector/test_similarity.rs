// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Cosine similarity properties over random vectors

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use text_duplicate_finder::dedup::DuplicatePolicy;
use text_duplicate_finder::vector::{cosine_similarity, normalize_in_place, SimilarityError};

const DIM: usize = 1024;

fn random_vector(rng: &mut StdRng) -> Vec<f32> {
    (0..DIM).map(|_| rng.gen_range(-1.0f32..1.0)).collect()
}

#[test]
fn test_symmetric_and_bounded() {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..50 {
        let a = random_vector(&mut rng);
        let b = random_vector(&mut rng);

        let ab = cosine_similarity(&a, &b).unwrap();
        let ba = cosine_similarity(&b, &a).unwrap();
        assert!((ab - ba).abs() < 1e-6);
        assert!((-1.0..=1.0).contains(&ab));
    }
}

#[test]
fn test_self_similarity_is_one() {
    let mut rng = StdRng::seed_from_u64(11);
    for _ in 0..20 {
        let a = random_vector(&mut rng);
        let score = cosine_similarity(&a, &a).unwrap();
        assert!((score - 1.0).abs() < 1e-6);
    }
}

#[test]
fn test_scale_invariant() {
    let mut rng = StdRng::seed_from_u64(13);
    let a = random_vector(&mut rng);
    let b = random_vector(&mut rng);
    let scaled: Vec<f32> = b.iter().map(|x| x * 42.0).collect();

    let original = cosine_similarity(&a, &b).unwrap();
    let rescaled = cosine_similarity(&a, &scaled).unwrap();
    assert!((original - rescaled).abs() < 1e-5);
}

#[test]
fn test_normalization_preserves_similarity() {
    let mut rng = StdRng::seed_from_u64(17);
    let a = random_vector(&mut rng);
    let b = random_vector(&mut rng);

    let mut na = a.clone();
    let mut nb = b.clone();
    normalize_in_place(&mut na);
    normalize_in_place(&mut nb);

    let raw = cosine_similarity(&a, &b).unwrap();
    let normalized = cosine_similarity(&na, &nb).unwrap();
    assert!((raw - normalized).abs() < 1e-5);
}

#[test]
fn test_negation_flips_sign() {
    let mut rng = StdRng::seed_from_u64(19);
    let a = random_vector(&mut rng);
    let b = random_vector(&mut rng);
    let neg: Vec<f32> = b.iter().map(|x| -x).collect();

    let pos = cosine_similarity(&a, &b).unwrap();
    let flipped = cosine_similarity(&a, &neg).unwrap();
    assert!((pos + flipped).abs() < 1e-5);
}

#[test]
fn test_mismatch_and_zero_rejected() {
    let a = vec![1.0f32; DIM];
    assert!(matches!(
        cosine_similarity(&a, &a[..512]),
        Err(SimilarityError::DimensionMismatch { left: 1024, right: 512 })
    ));
    assert!(matches!(
        cosine_similarity(&a, &vec![0.0; DIM]),
        Err(SimilarityError::ZeroVector)
    ));
}

#[test]
fn test_random_pairs_rarely_duplicates() {
    let mut rng = StdRng::seed_from_u64(23);
    let policy = DuplicatePolicy::default();

    for _ in 0..20 {
        let a = random_vector(&mut rng);
        let b = random_vector(&mut rng);
        let score = cosine_similarity(&a, &b).unwrap();
        let verdict = policy.evaluate(score, policy.default_threshold());
        assert!(!verdict.is_duplicate, "score = {}", score);
    }
}
