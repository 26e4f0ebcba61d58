// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// Version information for the Text Duplicate Finder service

/// Semantic version number
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Supported features in this version
pub const FEATURES: &[&str] = &[
    "embed",
    "embed-batch",
    "cosine-similarity",
    "duplicate-threshold-override",
    "onnx-cuda-fallback",
    "hf-hub-download",
];

/// Get formatted version string for logging
pub fn get_version_string() -> String {
    format!("Text Duplicate Finder {}", VERSION)
}
