// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Embedding API Module
//!
//! POST /embed and POST /embed/batch: text in, fixed-length vectors out.

pub mod handler;
pub mod request;
pub mod response;

pub use handler::{embed_batch_handler, embed_handler};
pub use request::{EmbedBatchRequest, EmbedRequest};
pub use response::{EmbedBatchResponse, EmbedResponse};
