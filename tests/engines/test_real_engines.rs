// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Engine contract tests against the real implementations
//!
//! Tests that need downloaded model files are `#[ignore]`d and read
//! their model directory from the usual environment variables.

use std::path::{Path, PathBuf};

use captcha_ocr_node::{DdddocrEngine, OcrEngine, QwenConfig, QwenEngine};

// 1x1 red PNG image (base64)
const TINY_PNG_BASE64: &str =
    "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mP8z8DwHwAFBQIAX8jx0gAAAABJRU5ErkJggg==";

fn tiny_png() -> Vec<u8> {
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    STANDARD.decode(TINY_PNG_BASE64).unwrap()
}

#[test]
fn test_ddddocr_without_bundle_is_unavailable() {
    let engine = DdddocrEngine::new(Path::new("/nonexistent/ddddocr"));
    assert!(!engine.is_available());

    let result = engine.recognize(&tiny_png(), None);
    assert!(!result.success);
    assert_eq!(result.error.as_deref(), Some("engine not initialized"));
}

#[test]
fn test_qwen_without_assets_is_unavailable() {
    let engine = QwenEngine::new(QwenConfig {
        model_dir: "/nonexistent/qwen2-vl-onnx".into(),
        ..Default::default()
    });
    assert!(!engine.is_available());
}

#[test]
fn test_qwen_load_failure_is_cached() {
    let engine = QwenEngine::new(QwenConfig {
        model_dir: "/nonexistent/qwen2-vl-onnx".into(),
        ..Default::default()
    });

    let first = engine.recognize(&tiny_png(), None);
    let second = engine.recognize(&tiny_png(), None);

    assert!(!first.success);
    assert!(!second.success);
    assert_eq!(first.error, second.error);

    let status = engine.status_info();
    assert_eq!(status.model_loaded, Some(false));
}

#[test]
fn test_qwen_result_carries_engine_name() {
    let engine = QwenEngine::new(QwenConfig {
        model_dir: "/nonexistent/qwen2-vl-onnx".into(),
        ..Default::default()
    });
    let result = engine.recognize(&tiny_png(), Some("custom prompt"));
    assert_eq!(result.engine, "qwen");
}

#[test]
#[ignore] // Only run if the classifier bundle is downloaded
fn test_ddddocr_recognizes_valid_image() {
    let model_dir = std::env::var("DDDDOCR_MODEL_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("./models/ddddocr"));
    let engine = DdddocrEngine::new(&model_dir);
    if !engine.is_available() {
        return;
    }

    let result = engine.recognize(&tiny_png(), None);
    assert!(result.success);
    assert_eq!(result.confidence, 1.0);
    assert!(result.error.is_none());
}

#[test]
#[ignore] // Only run if the VLM export is downloaded
fn test_qwen_recognizes_valid_image() {
    let model_dir = std::env::var("QWEN_MODEL")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("./models/qwen2-vl-onnx"));
    let engine = QwenEngine::new(QwenConfig {
        model_dir,
        ..Default::default()
    });
    if !engine.is_available() {
        return;
    }

    let result = engine.recognize(&tiny_png(), None);
    if result.success {
        assert!(result.raw_response.is_some());
        assert!(result.confidence == 0.9 || result.confidence == 0.0);
    }
}
