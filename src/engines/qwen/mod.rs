// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Vision-language-model engine
//!
//! Wraps the Qwen2-VL ONNX pipeline in the engine capability
//! contract. The model loads lazily on the first `recognize()` call;
//! a failed load is cached until process restart.

pub mod model;
pub mod preprocessing;
pub mod prompt;

use std::sync::OnceLock;

use tracing::{error, info};

use crate::config::QwenConfig;
use crate::engines::{EngineStatus, OcrEngine, OcrResult};

use model::{assets_present, gpu_visible, QwenVlModel};
use prompt::{strip_thinking, DEFAULT_PROMPT};

/// Registry name of this engine
pub const ENGINE_NAME: &str = "qwen";

/// Lazily loaded vision-language captcha engine
///
/// The load happens exactly once: the first caller pays it, callers
/// arriving during the load block on the cell, and the outcome
/// (loaded model or error message) is cached for the process
/// lifetime.
pub struct QwenEngine {
    config: QwenConfig,
    loaded: OnceLock<Result<QwenVlModel, String>>,
}

impl std::fmt::Debug for QwenEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QwenEngine")
            .field("loaded", &self.model_loaded())
            .finish()
    }
}

impl QwenEngine {
    /// Construct the engine without loading anything
    pub fn new(config: QwenConfig) -> Self {
        Self {
            config,
            loaded: OnceLock::new(),
        }
    }

    /// Load the model on first use; later calls reuse the cached
    /// outcome, including a cached failure
    fn ensure_loaded(&self) -> Result<&QwenVlModel, String> {
        let outcome = self.loaded.get_or_init(|| {
            QwenVlModel::load(&self.config).map_err(|e| {
                error!("vision-language model load failed: {e:#}");
                format!("{e:#}")
            })
        });
        outcome.as_ref().map_err(|e| e.clone())
    }

    fn model_loaded(&self) -> bool {
        matches!(self.loaded.get(), Some(Ok(_)))
    }
}

impl OcrEngine for QwenEngine {
    fn recognize(&self, image_data: &[u8], prompt: Option<&str>) -> OcrResult {
        let model = match self.ensure_loaded() {
            Ok(model) => model,
            Err(e) => {
                return OcrResult::failure(
                    ENGINE_NAME,
                    format!("vision-language model not loaded: {e}"),
                );
            }
        };

        let image = match image::load_from_memory(image_data) {
            Ok(image) => image,
            Err(e) => {
                return OcrResult::failure(ENGINE_NAME, format!("failed to decode image: {e}"));
            }
        };

        let user_prompt = prompt.unwrap_or(DEFAULT_PROMPT);

        match model.generate(
            &image,
            user_prompt,
            self.config.enable_thinking,
            self.config.min_pixels,
            self.config.max_pixels,
        ) {
            Ok(raw) => {
                let text = strip_thinking(&raw);
                info!("qwen recognized: {text}");
                // Fixed heuristic: the model emits no calibrated probability
                let confidence = if text.is_empty() { 0.0 } else { 0.9 };
                OcrResult::ok(ENGINE_NAME, text, confidence).with_raw_response(raw)
            }
            Err(e) => {
                error!("qwen recognition failed: {e:#}");
                OcrResult::failure(ENGINE_NAME, format!("{e:#}"))
            }
        }
    }

    fn is_available(&self) -> bool {
        // Asset presence, not load state
        assets_present(&self.config.model_dir)
    }

    fn engine_name(&self) -> &'static str {
        ENGINE_NAME
    }

    fn status_info(&self) -> EngineStatus {
        let mut status = EngineStatus::basic(ENGINE_NAME, self.is_available());
        status.model = Some(self.config.model_dir.display().to_string());
        status.model_loaded = Some(self.model_loaded());
        status.device = self
            .loaded
            .get()
            .and_then(|outcome| outcome.as_ref().ok())
            .map(|model| model.device().to_string());
        status.gpu_available = Some(gpu_visible());
        status
    }
}
