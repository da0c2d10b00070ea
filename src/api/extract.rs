// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Image extraction adapter
//!
//! Normalizes the three supported request encodings into one byte
//! buffer, in fixed priority order: multipart file field, raw image
//! body, base64 string in a JSON body. A uniform size cap applies to
//! the decoded bytes on every path, before any engine sees the data.

use axum::extract::{FromRequest, Request};
use axum::http::header::CONTENT_TYPE;
use axum_extra::extract::Multipart;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

/// Maximum accepted image size (10MB)
pub const MAX_IMAGE_SIZE: usize = 10 * 1024 * 1024;

/// Typed extraction failures; all map to 400 at the boundary
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("image exceeds the 10MB size limit")]
    TooLarge,

    #[error("no image data found")]
    NoImageData,

    #[error("missing image_base64 field in JSON body")]
    MissingBase64,

    #[error("invalid base64 image data: {0}")]
    InvalidBase64(#[from] base64::DecodeError),

    #[error("invalid JSON body: {0}")]
    InvalidJson(String),

    #[error("malformed multipart body: {0}")]
    Multipart(String),
}

/// Image bytes plus any engine/prompt selectors riding in the body
#[derive(Debug, Default)]
pub struct ExtractedImage {
    pub data: Vec<u8>,
    pub engine: Option<String>,
    pub prompt: Option<String>,
}

/// JSON request body for the base64 path
#[derive(Debug, Deserialize)]
pub struct Base64Body {
    #[serde(default)]
    pub image_base64: Option<String>,
    #[serde(default)]
    pub engine: Option<String>,
    #[serde(default)]
    pub prompt: Option<String>,
}

/// Drop a `data:<mime>;base64,` scheme marker if one is present
///
/// The base64 alphabet never contains a comma, so splitting on the
/// first comma is safe for unprefixed input too.
pub fn strip_data_uri(value: &str) -> &str {
    match value.split_once(',') {
        Some((_, rest)) => rest,
        None => value,
    }
}

/// Decode a base64 image string, enforcing the size cap on the result
pub fn decode_base64_image(value: &str) -> Result<Vec<u8>, ExtractError> {
    let data = STANDARD.decode(strip_data_uri(value.trim()))?;
    ensure_size(data.len())?;
    Ok(data)
}

fn ensure_size(len: usize) -> Result<(), ExtractError> {
    if len > MAX_IMAGE_SIZE {
        return Err(ExtractError::TooLarge);
    }
    Ok(())
}

/// Extract the image (and any body-level selectors) from a request
///
/// Encoding is chosen by Content-Type: multipart, then raw `image/*`
/// body, then JSON base64. Anything else carries no image data.
pub async fn extract_image_request(request: Request) -> Result<ExtractedImage, ExtractError> {
    let content_type = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_ascii_lowercase();

    if content_type.starts_with("multipart/form-data") {
        return extract_from_multipart(request).await;
    }

    if content_type.starts_with("image/") {
        let data = read_body(request).await?;
        ensure_size(data.len())?;
        debug!("received raw image body: {} bytes", data.len());
        return Ok(ExtractedImage {
            data,
            ..Default::default()
        });
    }

    if content_type.starts_with("application/json") {
        let raw = read_body(request).await?;
        let body: Base64Body =
            serde_json::from_slice(&raw).map_err(|e| ExtractError::InvalidJson(e.to_string()))?;

        let encoded = body
            .image_base64
            .filter(|s| !s.is_empty())
            .ok_or(ExtractError::MissingBase64)?;
        let data = decode_base64_image(&encoded)?;
        debug!("received base64 image: {} bytes decoded", data.len());
        return Ok(ExtractedImage {
            data,
            engine: body.engine.filter(|s| !s.is_empty()),
            prompt: body.prompt.filter(|s| !s.is_empty()),
        });
    }

    Err(ExtractError::NoImageData)
}

async fn extract_from_multipart(request: Request) -> Result<ExtractedImage, ExtractError> {
    let mut multipart = Multipart::from_request(request, &())
        .await
        .map_err(|e| ExtractError::Multipart(e.to_string()))?;

    let mut image: Option<Vec<u8>> = None;
    let mut engine: Option<String> = None;
    let mut prompt: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ExtractError::Multipart(e.to_string()))?
    {
        match field.name() {
            Some("image") => {
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ExtractError::Multipart(e.to_string()))?;
                ensure_size(data.len())?;
                debug!("received uploaded file: {} bytes", data.len());
                image = Some(data.to_vec());
            }
            Some("engine") => {
                engine = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| ExtractError::Multipart(e.to_string()))?,
                );
            }
            Some("prompt") => {
                prompt = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| ExtractError::Multipart(e.to_string()))?,
                );
            }
            _ => {}
        }
    }

    let data = image.ok_or(ExtractError::NoImageData)?;
    Ok(ExtractedImage {
        data,
        engine: engine.filter(|s| !s.is_empty()),
        prompt: prompt.filter(|s| !s.is_empty()),
    })
}

async fn read_body(request: Request) -> Result<Vec<u8>, ExtractError> {
    // Body reads past the cap fail here; precise sizing happens in
    // ensure_size once the bytes are in hand
    let bytes = axum::body::to_bytes(request.into_body(), MAX_IMAGE_SIZE + 1)
        .await
        .map_err(|_| ExtractError::TooLarge)?;
    Ok(bytes.to_vec())
}
