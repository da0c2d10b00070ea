// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use std::sync::Arc;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use captcha_ocr_node::{start_server, EngineRegistry, ServiceConfig};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!(
        "starting {}",
        captcha_ocr_node::version::get_version_string()
    );

    let config = ServiceConfig::from_env();
    let registry = Arc::new(EngineRegistry::startup(&config));

    start_server(config.port, Arc::clone(&registry))
        .await
        .map_err(|e| anyhow::anyhow!("server error: {e}"))?;

    // The server has released its state; tear the engines down
    if let Ok(registry) = Arc::try_unwrap(registry) {
        registry.shutdown();
    }

    Ok(())
}
