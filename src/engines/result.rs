// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Normalized recognition result types

use serde::{Deserialize, Serialize};

/// Outcome of one recognition attempt
///
/// Every engine returns this shape, successful or not. Failed results
/// always carry an empty `text` and zero `confidence`; successful
/// results never carry an `error`. The constructors enforce this.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrResult {
    /// Whether recognition produced usable text
    pub success: bool,
    /// Decoded captcha text (empty unless success)
    pub text: String,
    /// Confidence score (0.0-1.0)
    pub confidence: f32,
    /// Name of the engine that produced this result
    pub engine: String,
    /// Human-readable failure description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Unprocessed model output, when the backend produces one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_response: Option<String>,
}

impl OcrResult {
    /// Create a successful result
    pub fn ok(engine: &str, text: impl Into<String>, confidence: f32) -> Self {
        Self {
            success: true,
            text: text.into(),
            confidence: confidence.clamp(0.0, 1.0),
            engine: engine.to_string(),
            error: None,
            raw_response: None,
        }
    }

    /// Create a failed result
    pub fn failure(engine: &str, error: impl Into<String>) -> Self {
        Self {
            success: false,
            text: String::new(),
            confidence: 0.0,
            engine: engine.to_string(),
            error: Some(error.into()),
            raw_response: None,
        }
    }

    /// Attach the raw model output for diagnostics
    pub fn with_raw_response(mut self, raw: impl Into<String>) -> Self {
        self.raw_response = Some(raw.into());
        self
    }
}

/// Diagnostic snapshot for one engine, reported by /health
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineStatus {
    /// Engine name
    pub engine: String,
    /// Whether the engine can currently serve requests
    pub available: bool,
    /// Model identifier (vision-language engine only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Whether the model is resident in memory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_loaded: Option<bool>,
    /// Inference device ("cuda" or "cpu"), known once loaded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
    /// Whether a GPU execution provider is visible
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gpu_available: Option<bool>,
}

impl EngineStatus {
    /// Snapshot carrying only name and availability
    pub fn basic(engine: &str, available: bool) -> Self {
        Self {
            engine: engine.to_string(),
            available,
            model: None,
            model_loaded: None,
            device: None,
            gpu_available: None,
        }
    }
}
