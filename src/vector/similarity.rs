// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Cosine similarity and vector shape checks
//!
//! Pure functions over `&[f32]`. Accumulation is done in `f64` so that
//! 1024-dimensional inputs do not lose precision, and the final score is
//! clamped to `[-1.0, 1.0]` to absorb rounding at the extremes.

use thiserror::Error;

/// Errors produced by vector math
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimilarityError {
    /// The two vectors have different lengths and cannot be compared
    #[error("Dimension mismatch: vector1 has {left} elements, vector2 has {right}")]
    DimensionMismatch { left: usize, right: usize },

    /// A vector does not have the dimensionality the encoder produces
    #[error("Expected {expected}-dimensional vector, got {actual}")]
    WrongDimension { expected: usize, actual: usize },

    /// Empty input, cosine similarity is undefined
    #[error("Vectors must not be empty")]
    EmptyVector,

    /// NaN or infinite component
    #[error("Vector contains a non-finite value at index {index}")]
    NonFinite { index: usize },

    /// One of the vectors has zero magnitude
    #[error("Cosine similarity is undefined for a zero-magnitude vector")]
    ZeroVector,
}

/// Cosine similarity of two equal-length, non-zero vectors.
///
/// # Errors
/// - `DimensionMismatch` when `a.len() != b.len()`
/// - `EmptyVector` when both are empty
/// - `NonFinite` when either contains NaN or infinity
/// - `ZeroVector` when either has zero magnitude
///
/// # Example
/// ```
/// use text_duplicate_finder::vector::cosine_similarity;
///
/// let score = cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]).unwrap();
/// assert!((score - 1.0).abs() < 1e-6);
/// ```
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32, SimilarityError> {
    if a.len() != b.len() {
        return Err(SimilarityError::DimensionMismatch {
            left: a.len(),
            right: b.len(),
        });
    }
    if a.is_empty() {
        return Err(SimilarityError::EmptyVector);
    }
    ensure_finite(a)?;
    ensure_finite(b)?;

    let (dot_product, norm_a_sq, norm_b_sq) =
        a.iter()
            .zip(b.iter())
            .fold((0.0f64, 0.0f64, 0.0f64), |(dot, na, nb), (&x, &y)| {
                let (x, y) = (x as f64, y as f64);
                (dot + x * y, na + x * x, nb + y * y)
            });

    if norm_a_sq == 0.0 || norm_b_sq == 0.0 {
        return Err(SimilarityError::ZeroVector);
    }

    let similarity = dot_product / (norm_a_sq.sqrt() * norm_b_sq.sqrt());
    Ok(similarity.clamp(-1.0, 1.0) as f32)
}

/// Checks that `vector` has exactly `expected` elements.
pub fn validate_dimension(vector: &[f32], expected: usize) -> Result<(), SimilarityError> {
    if vector.len() != expected {
        return Err(SimilarityError::WrongDimension {
            expected,
            actual: vector.len(),
        });
    }
    Ok(())
}

/// Rejects NaN and infinite components.
pub fn ensure_finite(vector: &[f32]) -> Result<(), SimilarityError> {
    match vector.iter().position(|v| !v.is_finite()) {
        Some(index) => Err(SimilarityError::NonFinite { index }),
        None => Ok(()),
    }
}

/// Euclidean norm, accumulated in f64.
pub fn l2_norm(vector: &[f32]) -> f32 {
    vector
        .iter()
        .map(|&v| (v as f64) * (v as f64))
        .sum::<f64>()
        .sqrt() as f32
}

/// Scales `vector` to unit length in place. Zero vectors are left untouched.
pub fn normalize_in_place(vector: &mut [f32]) {
    let norm = l2_norm(vector);
    if norm > 0.0 {
        for value in vector.iter_mut() {
            *value /= norm;
        }
    }
}
