// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Environment-driven service configuration
//!
//! All options are read once at startup by the composition root and
//! handed to the engines as immutable values.

use std::env;
use std::path::PathBuf;

/// Configuration for the vision-language-model engine
#[derive(Debug, Clone)]
pub struct QwenConfig {
    /// Directory holding the ONNX export (encoder, decoder, tokenizer)
    pub model_dir: PathBuf,
    /// Prefer the CUDA execution provider when one is visible
    pub use_gpu: bool,
    /// Let the model emit intermediate reasoning before its answer
    pub enable_thinking: bool,
    /// Lower bound on total pixels after preprocessing
    pub min_pixels: u32,
    /// Upper bound on total pixels after preprocessing
    pub max_pixels: u32,
    /// Generation cap per request
    pub max_new_tokens: usize,
}

impl Default for QwenConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("./models/qwen2-vl-onnx"),
            use_gpu: true,
            enable_thinking: false,
            min_pixels: 64_000,
            max_pixels: 360_000,
            max_new_tokens: 256,
        }
    }
}

/// Top-level service configuration
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// HTTP listen port
    pub port: u16,
    /// Directory holding the glyph classifier bundle
    pub ddddocr_model_dir: PathBuf,
    /// Vision-language-model engine options
    pub qwen: QwenConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            port: 5000,
            ddddocr_model_dir: PathBuf::from("./models/ddddocr"),
            qwen: QwenConfig::default(),
        }
    }
}

fn env_flag(name: &str, default: bool) -> bool {
    env::var(name)
        .map(|v| {
            let v = v.to_lowercase();
            v == "true" || v == "1"
        })
        .unwrap_or(default)
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

impl ServiceConfig {
    /// Read the configuration from environment variables
    ///
    /// Recognized options: `PORT`, `DDDDOCR_MODEL_DIR`, `QWEN_MODEL`,
    /// `USE_GPU`, `QWEN_THINKING`, `MIN_PIXELS`, `MAX_PIXELS`.
    /// Unset or unparsable values fall back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let qwen_defaults = defaults.qwen.clone();

        Self {
            port: env_parse("PORT", defaults.port),
            ddddocr_model_dir: env::var("DDDDOCR_MODEL_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.ddddocr_model_dir),
            qwen: QwenConfig {
                model_dir: env::var("QWEN_MODEL")
                    .map(PathBuf::from)
                    .unwrap_or(qwen_defaults.model_dir),
                use_gpu: env_flag("USE_GPU", qwen_defaults.use_gpu),
                enable_thinking: env_flag("QWEN_THINKING", qwen_defaults.enable_thinking),
                min_pixels: env_parse("MIN_PIXELS", qwen_defaults.min_pixels),
                max_pixels: env_parse("MAX_PIXELS", qwen_defaults.max_pixels),
                max_new_tokens: qwen_defaults.max_new_tokens,
            },
        }
    }
}
