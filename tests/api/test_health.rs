// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

use crate::common::{get, hash_state, post_json};
use axum::http::StatusCode;
use serde_json::json;
use text_duplicate_finder::api::create_app;

#[tokio::test]
async fn test_health_reports_loading_then_ok() {
    let app = create_app(hash_state());

    let (status, body) = get(app.clone(), "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "loading");
    assert_eq!(body["model_loaded"], json!(false));
    assert_eq!(body["model"], "test-model");
    assert_eq!(body["dimension"], json!(1024));

    post_json(app.clone(), "/embed", json!({"text": "warm up"})).await;

    let (_, body) = get(app, "/health").await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["model_loaded"], json!(true));
}

#[tokio::test]
async fn test_health_after_warm_up() {
    let state = hash_state();
    state.provider.warm_up().await.unwrap();

    let (_, body) = get(create_app(state), "/health").await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}
