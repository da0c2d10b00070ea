// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! HTTP-boundary error taxonomy
//!
//! Every failure leaving the service is JSON with `success: false`
//! and a non-empty `error`; stack traces stay in the logs.

use std::fmt;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::api::extract::ExtractError;
use crate::engines::RegistryError;

#[derive(Debug, Clone)]
pub enum ApiError {
    /// Malformed, missing, or oversized input
    InvalidRequest(String),
    /// Engine name maps to no registered engine (caller error)
    UnknownEngine(String),
    /// Resolved engine cannot currently serve (server-side state)
    EngineUnavailable(String),
    /// Unexpected defect caught at the request boundary
    InternalError(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidRequest(_) | ApiError::UnknownEngine(_) => StatusCode::BAD_REQUEST,
            ApiError::EngineUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_type(&self) -> &'static str {
        match self {
            ApiError::InvalidRequest(_) => "invalid_request",
            ApiError::UnknownEngine(_) => "unknown_engine",
            ApiError::EngineUnavailable(_) => "engine_unavailable",
            ApiError::InternalError(_) => "internal_error",
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::InvalidRequest(msg) => write!(f, "{msg}"),
            ApiError::UnknownEngine(name) => write!(f, "unknown engine: {name}"),
            ApiError::EngineUnavailable(name) => write!(f, "engine {name} is not available"),
            ApiError::InternalError(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<ExtractError> for ApiError {
    fn from(e: ExtractError) -> Self {
        ApiError::InvalidRequest(e.to_string())
    }
}

impl From<RegistryError> for ApiError {
    fn from(e: RegistryError) -> Self {
        match e {
            RegistryError::UnknownEngine(name) => ApiError::UnknownEngine(name),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({
            "success": false,
            "error": self.to_string(),
            "error_type": self.error_type(),
        });
        (self.status_code(), Json(body)).into_response()
    }
}
