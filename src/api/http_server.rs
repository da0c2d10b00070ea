// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! HTTP server assembly and lifecycle

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::api::batch_ocr::batch_ocr_handler;
use crate::api::extract::MAX_IMAGE_SIZE;
use crate::api::health::health_handler;
use crate::api::ocr::ocr_handler;
use crate::engines::EngineRegistry;

/// Shared router state: the registry owns the engines, the state just
/// shares a handle to it
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<EngineRegistry>,
}

/// Assemble the router
///
/// The transport body limit sits above the extraction adapter's cap
/// so the adapter produces the uniform oversize error.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/ocr", post(ocr_handler))
        .route("/batch-ocr", post(batch_ocr_handler))
        .layer(DefaultBodyLimit::max(MAX_IMAGE_SIZE + 2 * 1024 * 1024))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until a shutdown signal arrives
pub async fn start_server(
    port: u16,
    registry: Arc<EngineRegistry>,
) -> Result<(), Box<dyn std::error::Error>> {
    let app = build_router(AppState { registry });

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("API server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}
