// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! OCR request parameter types

use serde::Deserialize;

/// Query-string selectors for /ocr and /batch-ocr
///
/// Both may also arrive in the request body (JSON fields or multipart
/// text fields); the query string wins when both are present.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OcrParams {
    /// Engine name ("ddddocr" or "qwen"); unset means the default
    #[serde(default)]
    pub engine: Option<String>,

    /// Custom instruction, meaningful to the vision-language engine
    #[serde(default)]
    pub prompt: Option<String>,
}
