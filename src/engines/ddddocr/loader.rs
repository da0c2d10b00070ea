// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Two-tier model bundle resolution for the glyph classifier
//!
//! The classifier has shipped under two on-disk layouts. The primary
//! loader expects the standard bundle directory; the degraded loader
//! handles the legacy flat layout where the graph and charset sit as
//! bare files beside the directory path. Each tier fails with its own
//! definite error; both failing leaves the engine unavailable without
//! touching process startup.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

/// Which loader tier produced the bundle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadTier {
    /// Standard layout: `<dir>/common.onnx` + `<dir>/charset.json`
    Bundle,
    /// Legacy flat layout: `<dir>.onnx` + `<dir>.charset.txt`
    LegacyFlat,
}

/// Resolved classifier assets
#[derive(Debug, Clone)]
pub struct ModelBundle {
    /// Path to the ONNX graph
    pub model_path: PathBuf,
    /// Glyph table, index-aligned with the model's output classes
    /// (index 0 is the CTC blank)
    pub charset: Vec<String>,
    /// Tier that located the assets
    pub tier: LoadTier,
}

/// Locate the classifier assets under `model_dir`
///
/// Tries the standard bundle layout first, then the legacy flat
/// layout. Returns the first tier that yields a complete bundle.
pub fn locate_bundle(model_dir: &Path) -> Result<ModelBundle> {
    match load_standard_bundle(model_dir) {
        Ok(bundle) => {
            debug!("glyph classifier bundle found at {}", model_dir.display());
            Ok(bundle)
        }
        Err(primary) => match load_legacy_flat(model_dir) {
            Ok(bundle) => {
                debug!(
                    "glyph classifier legacy layout found beside {}",
                    model_dir.display()
                );
                Ok(bundle)
            }
            Err(legacy) => Err(anyhow::anyhow!(
                "glyph classifier bundle not found (standard layout: {primary:#}; legacy layout: {legacy:#})"
            )),
        },
    }
}

/// Tier 1: standard bundle directory
fn load_standard_bundle(model_dir: &Path) -> Result<ModelBundle> {
    let model_path = model_dir.join("common.onnx");
    if !model_path.exists() {
        anyhow::bail!("model not found: {}", model_path.display());
    }

    let charset_path = model_dir.join("charset.json");
    let raw = fs::read_to_string(&charset_path)
        .context(format!("failed to read {}", charset_path.display()))?;
    let charset: Vec<String> = serde_json::from_str(&raw)
        .context(format!("failed to parse {}", charset_path.display()))?;
    validate_charset(&charset, &charset_path)?;

    Ok(ModelBundle {
        model_path,
        charset,
        tier: LoadTier::Bundle,
    })
}

/// Tier 2: legacy flat layout, one file per asset beside the directory
fn load_legacy_flat(model_dir: &Path) -> Result<ModelBundle> {
    let model_path = append_suffix(model_dir, ".onnx");
    if !model_path.exists() {
        anyhow::bail!("model not found: {}", model_path.display());
    }

    let charset_path = append_suffix(model_dir, ".charset.txt");
    let raw = fs::read_to_string(&charset_path)
        .context(format!("failed to read {}", charset_path.display()))?;
    let charset: Vec<String> = raw.lines().map(str::to_string).collect();
    validate_charset(&charset, &charset_path)?;

    Ok(ModelBundle {
        model_path,
        charset,
        tier: LoadTier::LegacyFlat,
    })
}

fn validate_charset(charset: &[String], path: &Path) -> Result<()> {
    // One blank plus at least one glyph
    if charset.len() < 2 {
        anyhow::bail!("charset at {} has too few entries", path.display());
    }
    Ok(())
}

fn append_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut raw: OsString = path.as_os_str().to_owned();
    raw.push(suffix);
    PathBuf::from(raw)
}
