// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Batch OCR response types

use serde::{Deserialize, Serialize};

use crate::engines::OcrResult;

/// Per-file projection of a recognition result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResultItem {
    /// Original upload filename
    pub filename: String,
    /// Decoded text (empty on failure)
    pub text: String,
    /// Confidence score (0.0-1.0)
    pub confidence: f32,
    /// Whether recognition succeeded for this file
    pub success: bool,
}

impl BatchResultItem {
    /// Project an engine result onto a filename
    pub fn from_result(filename: String, result: &OcrResult) -> Self {
        Self {
            filename,
            text: result.text.clone(),
            confidence: result.confidence,
            success: result.success,
        }
    }

    /// Failure entry for a file rejected before recognition
    pub fn rejected(filename: String) -> Self {
        Self {
            filename,
            text: String::new(),
            confidence: 0.0,
            success: false,
        }
    }
}

/// Response from POST /batch-ocr
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResponse {
    pub success: bool,
    pub count: usize,
    pub results: Vec<BatchResultItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
