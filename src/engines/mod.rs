// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Recognition engine abstraction
//!
//! Two engines sit behind one capability contract: a deterministic
//! glyph classifier (`ddddocr`) and a vision-language model (`qwen`).
//! Callers pick one by name through the registry; every engine returns
//! the same normalized [`OcrResult`] shape.

pub mod ddddocr;
pub mod qwen;
pub mod registry;
pub mod result;

pub use ddddocr::DdddocrEngine;
pub use qwen::QwenEngine;
pub use registry::{EngineRegistry, RegistryError, DEFAULT_ENGINE};
pub use result::{EngineStatus, OcrResult};

/// Capability contract implemented by every recognition engine
///
/// `recognize` never surfaces an error to the caller: any internal
/// failure (malformed image, backend error, model not loaded) is
/// converted into a failed [`OcrResult`] carrying a readable message.
pub trait OcrEngine: Send + Sync + std::fmt::Debug {
    /// Recognize the captcha in `image_data`
    ///
    /// `prompt` overrides the default instruction for engines that
    /// accept one; other engines ignore it silently.
    fn recognize(&self, image_data: &[u8], prompt: Option<&str>) -> OcrResult;

    /// Cheap, side-effect-free availability query
    ///
    /// Must not trigger model loading. For the lazily loaded engine
    /// this reports whether the model assets are present, not whether
    /// they are resident in memory.
    fn is_available(&self) -> bool;

    /// Stable identifier, used as the registry key and embedded in
    /// every result
    fn engine_name(&self) -> &'static str;

    /// Diagnostic snapshot for /health
    fn status_info(&self) -> EngineStatus {
        EngineStatus::basic(self.engine_name(), self.is_available())
    }
}
