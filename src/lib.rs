// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod api;
pub mod config;
pub mod engines;
pub mod version;

// Re-export main types
pub use api::{build_router, start_server, ApiError, AppState};
pub use config::{QwenConfig, ServiceConfig};
pub use engines::{
    DdddocrEngine, EngineRegistry, EngineStatus, OcrEngine, OcrResult, QwenEngine, RegistryError,
    DEFAULT_ENGINE,
};
