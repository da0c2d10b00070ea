// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Batch OCR endpoint module
//!
//! Provides POST /batch-ocr for multi-file captcha recognition.

pub mod handler;
pub mod response;

pub use handler::batch_ocr_handler;
pub use response::{BatchResponse, BatchResultItem};
