// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Health endpoint handler

use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use crate::api::http_server::AppState;
use crate::version;

/// GET /health - service liveness plus per-engine status
///
/// Always 200; engine problems show up in the per-engine snapshots,
/// not in the response status.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": version::SERVICE_NAME,
        "version": version::VERSION_NUMBER,
        "engines": state.registry.status(),
    }))
}
