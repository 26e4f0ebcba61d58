// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod similarity;

pub use similarity::{
    cosine_similarity, ensure_finite, l2_norm, normalize_in_place, validate_dimension,
    SimilarityError,
};
