// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Deterministic glyph-classification engine
//!
//! Wraps the offline classifier in the engine capability contract.
//! Initialization happens synchronously at construction; a failed
//! init leaves the engine registered but permanently unavailable.

pub mod loader;
pub mod model;
pub mod preprocessing;

use std::path::Path;

use tracing::{error, info, warn};

use crate::engines::{OcrEngine, OcrResult};

use model::GlyphClassifier;

/// Registry name of this engine
pub const ENGINE_NAME: &str = "ddddocr";

/// Lightweight deterministic captcha engine
pub struct DdddocrEngine {
    classifier: Option<GlyphClassifier>,
}

impl std::fmt::Debug for DdddocrEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DdddocrEngine")
            .field("available", &self.classifier.is_some())
            .finish()
    }
}

impl DdddocrEngine {
    /// Construct the engine, loading the classifier eagerly
    ///
    /// Never fails: a broken or missing model bundle produces an
    /// engine whose `is_available()` is false.
    pub fn new(model_dir: &Path) -> Self {
        match GlyphClassifier::load(model_dir) {
            Ok(classifier) => {
                info!(
                    "ddddocr engine initialized ({} glyphs)",
                    classifier.charset_size()
                );
                Self {
                    classifier: Some(classifier),
                }
            }
            Err(e) => {
                warn!("ddddocr engine initialization failed: {e:#}");
                Self { classifier: None }
            }
        }
    }
}

impl OcrEngine for DdddocrEngine {
    fn recognize(&self, image_data: &[u8], _prompt: Option<&str>) -> OcrResult {
        let Some(classifier) = &self.classifier else {
            return OcrResult::failure(ENGINE_NAME, "engine not initialized");
        };

        match classifier.classify(image_data) {
            Ok(text) => {
                info!("ddddocr recognized: {text}");
                // The classifier emits no confidence signal; report 1.0
                OcrResult::ok(ENGINE_NAME, text, 1.0)
            }
            Err(e) => {
                error!("ddddocr recognition failed: {e:#}");
                OcrResult::failure(ENGINE_NAME, format!("{e:#}"))
            }
        }
    }

    fn is_available(&self) -> bool {
        self.classifier.is_some()
    }

    fn engine_name(&self) -> &'static str {
        ENGINE_NAME
    }
}
