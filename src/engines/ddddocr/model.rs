// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Glyph classifier backing the deterministic engine
//!
//! A single ONNX recognition graph plus a character table, decoded
//! with CTC greedy decoding (best path, blank removal).

use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use ndarray::{ArrayViewD, IxDyn};
use ort::execution_providers::CPUExecutionProvider;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Value;
use tracing::{debug, info};

use super::loader::{locate_bundle, LoadTier};
use super::preprocessing::preprocess_for_classifier;

/// Offline glyph classifier
///
/// Runs on CPU; the session is serialized behind a mutex and the rest
/// of the state is read-only after construction, so concurrent calls
/// are safe.
pub struct GlyphClassifier {
    session: Mutex<Session>,
    charset: Vec<String>,
    input_name: String,
}

impl std::fmt::Debug for GlyphClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlyphClassifier")
            .field("charset_size", &self.charset.len())
            .field("input_name", &self.input_name)
            .finish_non_exhaustive()
    }
}

impl GlyphClassifier {
    /// Load the classifier from a model directory
    ///
    /// Resolution goes through the two-tier loader; see
    /// [`super::loader::locate_bundle`].
    pub fn load(model_dir: &Path) -> Result<Self> {
        let bundle = locate_bundle(model_dir)?;

        info!(
            "loading glyph classifier from {} ({})",
            bundle.model_path.display(),
            match bundle.tier {
                LoadTier::Bundle => "standard layout",
                LoadTier::LegacyFlat => "legacy layout",
            }
        );

        let session = Session::builder()
            .context("failed to create session builder")?
            .with_execution_providers([CPUExecutionProvider::default().build()])
            .context("failed to set CPU execution provider")?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .context("failed to set optimization level")?
            .with_intra_threads(4)
            .context("failed to set intra threads")?
            .commit_from_file(&bundle.model_path)
            .context(format!(
                "failed to load classifier model from {}",
                bundle.model_path.display()
            ))?;

        let input_name = session
            .inputs
            .first()
            .map(|input| input.name.clone())
            .unwrap_or_else(|| "input1".to_string());

        debug!(
            "glyph classifier loaded - input: {}, charset: {} glyphs",
            input_name,
            bundle.charset.len()
        );

        Ok(Self {
            session: Mutex::new(session),
            charset: bundle.charset,
            input_name,
        })
    }

    /// Number of entries in the character table
    pub fn charset_size(&self) -> usize {
        self.charset.len()
    }

    /// Classify raw image bytes into the decoded glyph string
    pub fn classify(&self, image_data: &[u8]) -> Result<String> {
        let tensor = preprocess_for_classifier(image_data)?;

        let mut session = self.session.lock().unwrap();

        let input_value =
            Value::from_array(tensor).context("failed to create input tensor")?;

        let outputs = session
            .run(ort::inputs![&self.input_name => input_value])
            .context("classifier inference failed")?;

        let output_tensor = outputs[0]
            .try_extract_array::<f32>()
            .context("failed to extract output tensor")?;

        ctc_decode(&self.charset, &output_tensor.view())
    }
}

/// CTC greedy decoding over the classifier output
///
/// The model emits a distribution over the charset at each timestep.
/// Best path: argmax per step, skip the blank (index 0), collapse
/// consecutive repeats.
pub(crate) fn ctc_decode(charset: &[String], output: &ArrayViewD<'_, f32>) -> Result<String> {
    let output_shape = output.shape();

    // Expected shape: [batch, seq_len, num_classes] or [seq_len, num_classes]
    let (seq_len, num_classes) = if output_shape.len() == 3 {
        (output_shape[1], output_shape[2])
    } else if output_shape.len() == 2 {
        (output_shape[0], output_shape[1])
    } else {
        anyhow::bail!("unexpected classifier output shape: {:?}", output_shape);
    };

    let mut text = String::new();
    let mut prev_index: Option<usize> = None;

    for t in 0..seq_len {
        let mut max_prob = f32::NEG_INFINITY;
        let mut max_index = 0usize;

        for c in 0..num_classes {
            let prob = if output_shape.len() == 3 {
                output[IxDyn(&[0, t, c])]
            } else {
                output[IxDyn(&[t, c])]
            };

            if prob > max_prob {
                max_prob = prob;
                max_index = c;
            }
        }

        if max_index != 0 && Some(max_index) != prev_index {
            if max_index < charset.len() {
                text.push_str(&charset[max_index]);
            }
        }

        prev_index = if max_index == 0 { None } else { Some(max_index) };
    }

    Ok(text)
}
