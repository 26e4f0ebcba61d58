// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::Result;
use clap::Parser;
use std::{env, sync::Arc};
use text_duplicate_finder::{api::AppState, start_server, version, ServiceConfig};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // .env is optional
    dotenv::dotenv().ok();

    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = ServiceConfig::parse();
    config.validate()?;

    info!(
        features = ?version::FEATURES,
        "Starting {}",
        version::get_version_string()
    );
    info!(
        backend = ?config.backend,
        model = %config.model_name,
        dimension = config.dimension,
        max_batch_size = config.max_batch_size,
        max_text_length = config.max_text_length,
        max_body_bytes = config.limits().max_body_bytes(),
        duplicate_threshold = config.duplicate_threshold,
        "Configuration loaded"
    );

    let provider = Arc::new(config.build_provider());

    if config.eager_load {
        // A failed load is retried by the first request
        match provider.warm_up().await {
            Ok(()) => info!("Embedding model initialized"),
            Err(e) => {
                error!("Failed to initialize embedding model: {}", e);
                warn!("/embed endpoints will return 503 until the model loads");
            }
        }
    } else {
        info!("Embedding model will load on first request");
    }

    let state = AppState::new(provider, config.duplicate_policy()?);
    start_server(state, config.socket_addr()?).await?;

    Ok(())
}
