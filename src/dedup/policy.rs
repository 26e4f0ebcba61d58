// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Duplicate decision policy
//!
//! Turns a similarity score into a self-describing verdict. The threshold
//! comes from configuration and may be overridden per call, so the policy
//! can be tuned without touching vector math.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Threshold recommended for BAAI/bge-large-en-v1.5 embeddings
pub const DEFAULT_DUPLICATE_THRESHOLD: f32 = 0.85;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PolicyError {
    #[error("threshold must be a finite number in [-1.0, 1.0], got {0}")]
    InvalidThreshold(f32),
}

/// Outcome of a duplicate check
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DuplicateVerdict {
    pub similarity: f32,
    pub is_duplicate: bool,
    pub threshold: f32,
}

/// Threshold policy with a configured default
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DuplicatePolicy {
    default_threshold: f32,
}

impl Default for DuplicatePolicy {
    fn default() -> Self {
        Self {
            default_threshold: DEFAULT_DUPLICATE_THRESHOLD,
        }
    }
}

impl DuplicatePolicy {
    /// Creates a policy with the given default threshold
    ///
    /// # Errors
    /// `InvalidThreshold` if the value is not finite or outside `[-1.0, 1.0]`
    pub fn new(default_threshold: f32) -> Result<Self, PolicyError> {
        Ok(Self {
            default_threshold: check_threshold(default_threshold)?,
        })
    }

    pub fn default_threshold(&self) -> f32 {
        self.default_threshold
    }

    /// Picks the per-call override if present, otherwise the default.
    pub fn resolve_threshold(&self, requested: Option<f32>) -> Result<f32, PolicyError> {
        match requested {
            Some(threshold) => check_threshold(threshold),
            None => Ok(self.default_threshold),
        }
    }

    /// Applies `threshold` to `score`. Inclusive: `score == threshold` is a duplicate.
    pub fn evaluate(&self, score: f32, threshold: f32) -> DuplicateVerdict {
        DuplicateVerdict {
            similarity: score,
            is_duplicate: score >= threshold,
            threshold,
        }
    }

    /// Resolves the threshold and evaluates in one step.
    pub fn evaluate_with(
        &self,
        score: f32,
        requested: Option<f32>,
    ) -> Result<DuplicateVerdict, PolicyError> {
        let threshold = self.resolve_threshold(requested)?;
        Ok(self.evaluate(score, threshold))
    }
}

fn check_threshold(threshold: f32) -> Result<f32, PolicyError> {
    if threshold.is_finite() && (-1.0..=1.0).contains(&threshold) {
        Ok(threshold)
    } else {
        Err(PolicyError::InvalidThreshold(threshold))
    }
}
