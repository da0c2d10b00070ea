// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Batch OCR endpoint handler

use axum::extract::{FromRequest, Query, Request, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use axum_extra::extract::Multipart;
use tracing::{info, warn};

use super::response::{BatchResponse, BatchResultItem};
use crate::api::errors::ApiError;
use crate::api::extract::MAX_IMAGE_SIZE;
use crate::api::http_server::AppState;
use crate::api::ocr::OcrParams;

/// POST /batch-ocr - recognize a list of uploaded files
///
/// Files arrive as repeated multipart `images` fields; the engine
/// selector comes from the query string. A file over the size cap
/// degrades to a failure entry for that file without aborting the
/// batch. The prompt is not forwarded in batch mode.
///
/// # Errors
/// - 400: not multipart, no files, unknown engine
/// - 503: resolved engine not available
pub async fn batch_ocr_handler(
    State(state): State<AppState>,
    Query(params): Query<OcrParams>,
    request: Request,
) -> Response {
    let engine = match state.registry.get(params.engine.as_deref()) {
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

    let mut multipart = match Multipart::from_request(request, &()).await {
        Ok(multipart) => multipart,
        Err(e) => {
            return ApiError::InvalidRequest(format!("malformed multipart body: {e}"))
                .into_response();
        }
    };

    let mut results: Vec<BatchResultItem> = Vec::new();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                return ApiError::InvalidRequest(format!("malformed multipart body: {e}"))
                    .into_response();
            }
        };

        if field.name() != Some("images") {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        let data = match field.bytes().await {
            Ok(data) => data,
            Err(e) => {
                return ApiError::InvalidRequest(format!("malformed multipart body: {e}"))
                    .into_response();
            }
        };

        if data.len() > MAX_IMAGE_SIZE {
            warn!("batch file {filename} over the size limit, skipping recognition");
            results.push(BatchResultItem::rejected(filename));
            continue;
        }

        let result = engine.recognize(&data, None);
        results.push(BatchResultItem::from_result(filename, &result));
    }

    if results.is_empty() {
        return ApiError::InvalidRequest("no image data found".to_string()).into_response();
    }

    info!("batch recognition complete: {} images", results.len());

    Json(BatchResponse {
        success: true,
        count: results.len(),
        results,
        error: None,
    })
    .into_response()
}
