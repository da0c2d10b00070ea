// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Tests for POST /ocr
//!
//! The router is driven in-process with injected stub engines so the
//! dispatch contract (status codes, engine resolution, byte fidelity
//! across encodings) is exercised without model files.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::header::CONTENT_TYPE;
use axum::http::{Request, StatusCode};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use http_body_util::BodyExt;
use tower::ServiceExt;

use captcha_ocr_node::{build_router, AppState, EngineRegistry, OcrEngine, OcrResult};

// 1x1 red PNG image (base64)
const TINY_PNG_BASE64: &str =
    "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mP8z8DwHwAFBQIAX8jx0gAAAABJRU5ErkJggg==";

const MAX_IMAGE_SIZE: usize = 10 * 1024 * 1024;

/// Recording stub engine
#[derive(Debug)]
struct StubEngine {
    name: &'static str,
    available: bool,
    fail: bool,
    calls: AtomicUsize,
    last_image: Mutex<Option<Vec<u8>>>,
    last_prompt: Mutex<Option<String>>,
}

impl StubEngine {
    fn new(name: &'static str) -> Arc<Self> {
        Arc::new(Self::unwrapped(name))
    }

    fn unavailable(name: &'static str) -> Arc<Self> {
        Arc::new(Self {
            available: false,
            ..Self::unwrapped(name)
        })
    }

    fn failing(name: &'static str) -> Arc<Self> {
        Arc::new(Self {
            fail: true,
            ..Self::unwrapped(name)
        })
    }

    fn unwrapped(name: &'static str) -> Self {
        Self {
            name,
            available: true,
            fail: false,
            calls: AtomicUsize::new(0),
            last_image: Mutex::new(None),
            last_prompt: Mutex::new(None),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl OcrEngine for StubEngine {
    fn recognize(&self, image_data: &[u8], prompt: Option<&str>) -> OcrResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_image.lock().unwrap() = Some(image_data.to_vec());
        *self.last_prompt.lock().unwrap() = prompt.map(str::to_string);

        if self.fail {
            OcrResult::failure(self.name, "backend error")
        } else {
            OcrResult::ok(self.name, "a3b9", 1.0)
        }
    }

    fn is_available(&self) -> bool {
        self.available
    }

    fn engine_name(&self) -> &'static str {
        self.name
    }
}

fn router_with(engines: Vec<Arc<StubEngine>>) -> axum::Router {
    let registry = EngineRegistry::from_engines(
        engines
            .into_iter()
            .map(|engine| engine as Arc<dyn OcrEngine>),
    );
    build_router(AppState {
        registry: Arc::new(registry),
    })
}

fn json_request(uri: &str, body: String) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body))
        .unwrap()
}

async fn response_json(response: axum::response::Response) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_json_base64_default_engine() {
    let stub = StubEngine::new("ddddocr");
    let app = router_with(vec![stub.clone()]);

    let body = format!(r#"{{"image_base64": "{TINY_PNG_BASE64}"}}"#);
    let response = app.oneshot(json_request("/ocr", body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = response_json(response).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["text"], "a3b9");
    assert_eq!(json["confidence"], 1.0);
    assert_eq!(json["engine"], "ddddocr");
    assert_eq!(stub.calls(), 1);
}

#[tokio::test]
async fn test_data_uri_prefix_yields_identical_bytes() {
    let stub = StubEngine::new("ddddocr");
    let app = router_with(vec![stub.clone()]);

    let plain = format!(r#"{{"image_base64": "{TINY_PNG_BASE64}"}}"#);
    let response = app.clone().oneshot(json_request("/ocr", plain)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let first = stub.last_image.lock().unwrap().clone().unwrap();

    let prefixed =
        format!(r#"{{"image_base64": "data:image/png;base64,{TINY_PNG_BASE64}"}}"#);
    let response = app.oneshot(json_request("/ocr", prefixed)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let second = stub.last_image.lock().unwrap().clone().unwrap();

    assert_eq!(first, second);
    assert_eq!(first, STANDARD.decode(TINY_PNG_BASE64).unwrap());
}

#[tokio::test]
async fn test_raw_binary_body() {
    let stub = StubEngine::new("ddddocr");
    let app = router_with(vec![stub.clone()]);

    let payload = STANDARD.decode(TINY_PNG_BASE64).unwrap();
    let request = Request::builder()
        .method("POST")
        .uri("/ocr")
        .header(CONTENT_TYPE, "image/png")
        .body(Body::from(payload.clone()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(stub.last_image.lock().unwrap().clone().unwrap(), payload);
}

fn multipart_body(parts: &[(&str, Option<&str>, &[u8])]) -> (String, Vec<u8>) {
    let boundary = "test-boundary";
    let mut body: Vec<u8> = Vec::new();
    for (name, filename, data) in parts {
        body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
        match filename {
            Some(fname) => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{name}\"; filename=\"{fname}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
                )
                .as_bytes(),
            ),
            None => body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
            ),
        }
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());
    (
        format!("multipart/form-data; boundary={boundary}"),
        body,
    )
}

#[tokio::test]
async fn test_multipart_upload() {
    let stub = StubEngine::new("ddddocr");
    let app = router_with(vec![stub.clone()]);

    let payload = STANDARD.decode(TINY_PNG_BASE64).unwrap();
    let (content_type, body) = multipart_body(&[("image", Some("captcha.png"), &payload)]);
    let request = Request::builder()
        .method("POST")
        .uri("/ocr")
        .header(CONTENT_TYPE, content_type)
        .body(Body::from(body))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(stub.last_image.lock().unwrap().clone().unwrap(), payload);
}

#[tokio::test]
async fn test_unknown_engine_is_bad_request() {
    let app = router_with(vec![StubEngine::new("ddddocr")]);

    let body = format!(r#"{{"image_base64": "{TINY_PNG_BASE64}"}}"#);
    let response = app
        .oneshot(json_request("/ocr?engine=tesseract", body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = response_json(response).await;
    assert_eq!(json["success"], false);
    assert!(json["error"]
        .as_str()
        .unwrap()
        .contains("unknown engine: tesseract"));
}

#[tokio::test]
async fn test_unknown_engine_via_body() {
    let app = router_with(vec![StubEngine::new("ddddocr")]);

    let body = format!(r#"{{"image_base64": "{TINY_PNG_BASE64}", "engine": "nope"}}"#);
    let response = app.oneshot(json_request("/ocr", body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unavailable_engine_is_503_and_never_invoked() {
    let stub = StubEngine::unavailable("ddddocr");
    let app = router_with(vec![stub.clone()]);

    let body = format!(r#"{{"image_base64": "{TINY_PNG_BASE64}"}}"#);
    let response = app.oneshot(json_request("/ocr", body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let json = response_json(response).await;
    assert_eq!(json["success"], false);
    assert_eq!(stub.calls(), 0);
}

#[tokio::test]
async fn test_backend_failure_is_500_with_failure_body() {
    let stub = StubEngine::failing("ddddocr");
    let app = router_with(vec![stub.clone()]);

    let body = format!(r#"{{"image_base64": "{TINY_PNG_BASE64}"}}"#);
    let response = app.oneshot(json_request("/ocr", body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = response_json(response).await;
    assert_eq!(json["success"], false);
    assert_eq!(json["error"], "backend error");
    assert_eq!(json["text"], "");
}

#[tokio::test]
async fn test_missing_base64_field_is_400() {
    let app = router_with(vec![StubEngine::new("ddddocr")]);

    let response = app
        .oneshot(json_request("/ocr", r#"{"engine": "ddddocr"}"#.to_string()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = response_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("image_base64"));
}

#[tokio::test]
async fn test_no_image_data_is_400() {
    let app = router_with(vec![StubEngine::new("ddddocr")]);

    let request = Request::builder()
        .method("POST")
        .uri("/ocr")
        .header(CONTENT_TYPE, "text/plain")
        .body(Body::from("hello"))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = response_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("no image data found"));
}

#[tokio::test]
async fn test_oversized_base64_is_400() {
    let app = router_with(vec![StubEngine::new("ddddocr")]);

    let encoded = STANDARD.encode(vec![0u8; MAX_IMAGE_SIZE + 1]);
    let body = format!(r#"{{"image_base64": "{encoded}"}}"#);
    let response = app.oneshot(json_request("/ocr", body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = response_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("size limit"));
}

#[tokio::test]
async fn test_query_engine_overrides_body_engine() {
    let first = StubEngine::new("ddddocr");
    let second = StubEngine::new("qwen");
    let app = router_with(vec![first.clone(), second.clone()]);

    let body = format!(r#"{{"image_base64": "{TINY_PNG_BASE64}", "engine": "ddddocr"}}"#);
    let response = app
        .oneshot(json_request("/ocr?engine=qwen", body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(first.calls(), 0);
    assert_eq!(second.calls(), 1);
}

#[tokio::test]
async fn test_prompt_forwarded_from_body() {
    let stub = StubEngine::new("qwen");
    let app = router_with(vec![stub.clone()]);

    let body = format!(
        r#"{{"image_base64": "{TINY_PNG_BASE64}", "engine": "qwen", "prompt": "solve the math"}}"#
    );
    let response = app.oneshot(json_request("/ocr", body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        stub.last_prompt.lock().unwrap().as_deref(),
        Some("solve the math")
    );
}
