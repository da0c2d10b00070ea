// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! OCR endpoint handler

use axum::extract::{Query, Request, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::{debug, warn};

use super::request::OcrParams;
use crate::api::errors::ApiError;
use crate::api::extract::extract_image_request;
use crate::api::http_server::AppState;

/// POST /ocr - recognize one captcha image
///
/// Accepts the image as a multipart `image` field, a raw `image/*`
/// body, or a JSON body with `image_base64` (optionally data-URI
/// prefixed). Engine and prompt come from the query string or ride in
/// the body.
///
/// # Errors
/// - 400: malformed/missing/oversized image, unknown engine
/// - 503: resolved engine not available
/// - 500: recognition failed inside the backend
pub async fn ocr_handler(
    State(state): State<AppState>,
    Query(params): Query<OcrParams>,
    request: Request,
) -> Response {
    let extracted = match extract_image_request(request).await {
        Ok(extracted) => extracted,
        Err(e) => {
            warn!("image extraction failed: {e}");
            return ApiError::from(e).into_response();
        }
    };

    let engine_name = params.engine.or(extracted.engine);
    let prompt = params.prompt.or(extracted.prompt);

    let engine = match state.registry.get(engine_name.as_deref()) {
        Ok(engine) => engine,
        Err(e) => {
            warn!("engine resolution failed: {e}");
            return ApiError::from(e).into_response();
        }
    };

    if !engine.is_available() {
        warn!("engine {} requested but unavailable", engine.engine_name());
        return ApiError::EngineUnavailable(engine.engine_name().to_string()).into_response();
    }

    debug!(
        "dispatching {} bytes to {}",
        extracted.data.len(),
        engine.engine_name()
    );

    let result = engine.recognize(&extracted.data, prompt.as_deref());

    let status = if result.success {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (status, Json(result)).into_response()
}
