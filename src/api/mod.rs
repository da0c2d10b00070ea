// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! HTTP surface: routing, extraction, and error mapping

pub mod batch_ocr;
pub mod errors;
pub mod extract;
pub mod health;
pub mod http_server;
pub mod ocr;

pub use errors::ApiError;
pub use http_server::{build_router, start_server, AppState};
