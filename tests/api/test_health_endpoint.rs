// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Tests for GET /health

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

use captcha_ocr_node::{
    build_router, AppState, EngineRegistry, OcrEngine, OcrResult, ServiceConfig,
};

#[derive(Debug)]
struct StubEngine {
    name: &'static str,
    available: bool,
}

impl OcrEngine for StubEngine {
    fn recognize(&self, _image_data: &[u8], _prompt: Option<&str>) -> OcrResult {
        OcrResult::ok(self.name, "stub", 1.0)
    }

    fn is_available(&self) -> bool {
        self.available
    }

    fn engine_name(&self) -> &'static str {
        self.name
    }
}

async fn get_health(app: axum::Router) -> (StatusCode, serde_json::Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn test_health_with_stub_engines() {
    let registry = EngineRegistry::from_engines([
        Arc::new(StubEngine {
            name: "ddddocr",
            available: true,
        }) as Arc<dyn OcrEngine>,
        Arc::new(StubEngine {
            name: "qwen",
            available: false,
        }) as Arc<dyn OcrEngine>,
    ]);
    let app = build_router(AppState {
        registry: Arc::new(registry),
    });

    let (status, json) = get_health(app).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["service"], "captcha-ocr");
    assert!(json["version"].as_str().is_some());
    assert_eq!(json["engines"]["ddddocr"]["available"], true);
    assert_eq!(json["engines"]["qwen"]["available"], false);
}

#[tokio::test]
async fn test_health_with_real_registry_and_no_models() {
    // Engines register even when their model assets are missing;
    // health stays 200 and reports them unavailable
    let config = ServiceConfig {
        ddddocr_model_dir: "/nonexistent/ddddocr".into(),
        qwen: captcha_ocr_node::QwenConfig {
            model_dir: "/nonexistent/qwen2-vl-onnx".into(),
            ..Default::default()
        },
        ..Default::default()
    };
    let registry = EngineRegistry::startup(&config);
    let app = build_router(AppState {
        registry: Arc::new(registry),
    });

    let (status, json) = get_health(app).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["engines"]["ddddocr"]["available"], false);
    assert_eq!(json["engines"]["qwen"]["available"], false);
    assert_eq!(json["engines"]["qwen"]["model_loaded"], false);
    assert!(json["engines"]["qwen"]["model"].as_str().is_some());
}
