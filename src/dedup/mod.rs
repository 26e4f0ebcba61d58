// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod policy;

pub use policy::{DuplicatePolicy, DuplicateVerdict, PolicyError, DEFAULT_DUPLICATE_THRESHOLD};
