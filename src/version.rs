// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// Version information for the captcha OCR node

/// Semantic version number
pub const VERSION_NUMBER: &str = "2.0.0";

/// Service identifier reported by /health
pub const SERVICE_NAME: &str = "captcha-ocr";

/// Get formatted version string for logging
pub fn get_version_string() -> String {
    format!("Captcha OCR Node {}", VERSION_NUMBER)
}
