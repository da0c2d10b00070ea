// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! OCR endpoint module
//!
//! Provides POST /ocr for single-image captcha recognition.

pub mod handler;
pub mod request;

pub use handler::ocr_handler;
pub use request::OcrParams;
