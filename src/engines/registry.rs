// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Name-to-engine registry with explicit lifecycle
//!
//! The registry is constructed once by the composition root, shared as
//! `Arc<EngineRegistry>` through the router state, and torn down when
//! the server exits. Both engines are registered unconditionally:
//! unavailability is a per-engine runtime state, not a registration
//! decision.

use std::collections::BTreeMap;
use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::config::ServiceConfig;
use crate::engines::{DdddocrEngine, EngineStatus, OcrEngine, QwenEngine};

/// Engine used when the request names none
pub const DEFAULT_ENGINE: &str = "ddddocr";

/// Registry lookup errors
#[derive(Debug, Clone, Error)]
pub enum RegistryError {
    /// The requested name maps to no registered engine (caller error,
    /// distinct from a registered-but-unavailable engine)
    #[error("unknown engine: {0}")]
    UnknownEngine(String),
}

/// Process-wide mapping from logical engine name to instance
///
/// Exclusively owns the engine instances it holds.
pub struct EngineRegistry {
    engines: BTreeMap<String, Arc<dyn OcrEngine>>,
}

impl EngineRegistry {
    /// Construct both engines and register them under their names
    ///
    /// Engine construction never fails the process: an engine whose
    /// backend cannot initialize registers in an unavailable state.
    pub fn startup(config: &ServiceConfig) -> Self {
        info!("initializing OCR engines");

        let registry = Self::from_engines([
            Arc::new(DdddocrEngine::new(&config.ddddocr_model_dir)) as Arc<dyn OcrEngine>,
            Arc::new(QwenEngine::new(config.qwen.clone())) as Arc<dyn OcrEngine>,
        ]);

        info!(
            "available engines: {:?}",
            registry.available_engines().collect::<Vec<_>>()
        );
        registry
    }

    /// Build a registry from pre-constructed engines
    ///
    /// Used by `startup` and by tests that inject stub engines.
    pub fn from_engines(engines: impl IntoIterator<Item = Arc<dyn OcrEngine>>) -> Self {
        let engines = engines
            .into_iter()
            .map(|engine| (engine.engine_name().to_string(), engine))
            .collect();
        Self { engines }
    }

    /// Resolve an engine by name, defaulting to [`DEFAULT_ENGINE`]
    pub fn get(&self, name: Option<&str>) -> Result<Arc<dyn OcrEngine>, RegistryError> {
        let key = name.unwrap_or(DEFAULT_ENGINE);
        self.engines
            .get(key)
            .cloned()
            .ok_or_else(|| RegistryError::UnknownEngine(key.to_string()))
    }

    /// Names of engines currently able to serve requests
    pub fn available_engines(&self) -> impl Iterator<Item = &str> {
        self.engines
            .values()
            .filter(|engine| engine.is_available())
            .map(|engine| engine.engine_name())
    }

    /// Status snapshot of every registered engine, keyed by name
    pub fn status(&self) -> BTreeMap<String, EngineStatus> {
        self.engines
            .iter()
            .map(|(name, engine)| (name.clone(), engine.status_info()))
            .collect()
    }

    /// Drop all engine instances and log the teardown
    pub fn shutdown(mut self) {
        self.engines.clear();
        info!("OCR engines shut down");
    }
}
