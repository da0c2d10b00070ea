// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Qwen2-VL ONNX pipeline: vision encoder + autoregressive decoder
//!
//! The export splits the model into three graphs: a vision encoder
//! producing image embeddings, a token-embedding graph, and a language
//! decoder cross-attending over the image embeddings. Generation is
//! greedy and bounded; the sessions are serialized behind mutexes, so
//! one generation runs at a time.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use image::DynamicImage;
use ndarray::{Array2, Array3, ArrayViewD, Axis, IxDyn};
use ort::execution_providers::{
    CPUExecutionProvider, CUDAExecutionProvider, ExecutionProvider, ExecutionProviderDispatch,
};
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Value;
use tracing::{debug, info};

use crate::config::QwenConfig;

use super::preprocessing::preprocess_for_vlm;
use super::prompt::build_chat_prompt;

/// Candidate file names for the vision encoder graph
const ENCODER_NAMES: &[&str] = &["vision_encoder.onnx", "encoder.onnx"];

/// Candidate file names for the language decoder graph
const DECODER_NAMES: &[&str] = &["decoder_model.onnx", "decoder.onnx"];

/// Token-embedding graph file name
const EMBED_TOKENS_FILE: &str = "embed_tokens.onnx";

/// Tokenizer config file name
const TOKENIZER_FILE: &str = "tokenizer.json";

/// Whether a CUDA execution provider is visible to ONNX Runtime
pub fn gpu_visible() -> bool {
    CUDAExecutionProvider::default()
        .is_available()
        .unwrap_or(false)
}

/// Whether the model directory holds a complete export
///
/// Cheap filesystem check; never loads anything.
pub fn assets_present(model_dir: &Path) -> bool {
    find_model_file(model_dir, ENCODER_NAMES).is_ok()
        && find_model_file(model_dir, DECODER_NAMES).is_ok()
        && model_dir.join(EMBED_TOKENS_FILE).exists()
        && model_dir.join(TOKENIZER_FILE).exists()
}

/// Find a model file by trying multiple possible names
fn find_model_file(dir: &Path, names: &[&str]) -> Result<PathBuf> {
    for name in names {
        let path = dir.join(name);
        if path.exists() {
            return Ok(path);
        }
    }
    anyhow::bail!("model file not found in {}, tried: {:?}", dir.display(), names);
}

/// Loaded vision-language model
pub struct QwenVlModel {
    encoder: Mutex<Session>,
    embed: Mutex<Session>,
    decoder: Mutex<Session>,
    tokenizer: tokenizers::Tokenizer,
    device: &'static str,
    encoder_input_name: String,
    eos_token_id: u32,
    end_of_turn_id: u32,
    max_new_tokens: usize,
}

impl std::fmt::Debug for QwenVlModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QwenVlModel")
            .field("device", &self.device)
            .field("max_new_tokens", &self.max_new_tokens)
            .finish_non_exhaustive()
    }
}

impl QwenVlModel {
    /// Load every graph and the tokenizer from the model directory
    ///
    /// Selects CUDA when the configuration prefers it and a provider
    /// is visible, otherwise CPU. Load cost is seconds to tens of
    /// seconds; callers decide when to pay it.
    pub fn load(config: &QwenConfig) -> Result<Self> {
        let model_dir = config.model_dir.as_path();
        if !model_dir.exists() {
            anyhow::bail!("model directory not found: {}", model_dir.display());
        }

        let device = if config.use_gpu && gpu_visible() {
            "cuda"
        } else {
            "cpu"
        };
        info!(
            "loading vision-language model from {} on {device}",
            model_dir.display()
        );

        let encoder_path = find_model_file(model_dir, ENCODER_NAMES)?;
        let decoder_path = find_model_file(model_dir, DECODER_NAMES)?;
        let embed_path = model_dir.join(EMBED_TOKENS_FILE);
        if !embed_path.exists() {
            anyhow::bail!("token embedding model not found: {}", embed_path.display());
        }
        let tokenizer_path = model_dir.join(TOKENIZER_FILE);
        if !tokenizer_path.exists() {
            anyhow::bail!("tokenizer not found: {}", tokenizer_path.display());
        }

        let tokenizer = tokenizers::Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow::anyhow!("failed to load tokenizer: {e}"))?;

        let eos_token_id = tokenizer.token_to_id("<|endoftext|>").unwrap_or(151_643);
        let end_of_turn_id = tokenizer.token_to_id("<|im_end|>").unwrap_or(151_645);
        debug!("special tokens - eos: {eos_token_id}, end-of-turn: {end_of_turn_id}");

        let encoder = build_session(&encoder_path, device)?;
        let embed = build_session(&embed_path, device)?;
        let decoder = build_session(&decoder_path, device)?;

        let encoder_input_name = encoder
            .inputs
            .first()
            .map(|input| input.name.clone())
            .unwrap_or_else(|| "pixel_values".to_string());

        info!("vision-language model loaded ({device})");

        Ok(Self {
            encoder: Mutex::new(encoder),
            embed: Mutex::new(embed),
            decoder: Mutex::new(decoder),
            tokenizer,
            device,
            encoder_input_name,
            eos_token_id,
            end_of_turn_id,
            max_new_tokens: config.max_new_tokens,
        })
    }

    /// Inference device the sessions were built for
    pub fn device(&self) -> &'static str {
        self.device
    }

    /// Run one full recognition: preprocess, encode, generate, decode
    ///
    /// Generation is greedy (no sampling) and stops at end-of-turn,
    /// end-of-text, or the configured token cap. Returns the decoded
    /// text before any reasoning-block cleanup.
    pub fn generate(
        &self,
        image: &DynamicImage,
        user_prompt: &str,
        enable_thinking: bool,
        min_pixels: u32,
        max_pixels: u32,
    ) -> Result<String> {
        let pixel_values = preprocess_for_vlm(image, min_pixels, max_pixels);
        let image_embeddings = self.encode_image(&pixel_values)?;
        debug!(
            "image encoded to {} sequences x {} dimensions",
            image_embeddings.nrows(),
            image_embeddings.ncols()
        );

        let chat_prompt = build_chat_prompt(user_prompt, enable_thinking);
        let encoding = self
            .tokenizer
            .encode(chat_prompt.as_str(), false)
            .map_err(|e| anyhow::anyhow!("failed to encode prompt: {e}"))?;
        let mut tokens: Vec<u32> = encoding.get_ids().to_vec();
        let prompt_len = tokens.len();

        for _ in 0..self.max_new_tokens {
            let logits = self.forward(&image_embeddings, &tokens)?;
            let next_token = argmax(&logits)?;

            if next_token == self.eos_token_id || next_token == self.end_of_turn_id {
                break;
            }
            tokens.push(next_token);
        }

        let generated = &tokens[prompt_len..];
        debug!("generated {} tokens", generated.len());

        let text = self
            .tokenizer
            .decode(generated, true)
            .map_err(|e| anyhow::anyhow!("failed to decode output: {e}"))?;

        Ok(text.trim().to_string())
    }

    /// Encode a preprocessed image tensor into embeddings [seq, dim]
    fn encode_image(&self, pixel_values: &ndarray::Array4<f32>) -> Result<Array2<f32>> {
        let mut encoder = self.encoder.lock().unwrap();

        let input_value = Value::from_array(pixel_values.to_owned())
            .context("failed to create pixel tensor")?;

        let outputs = encoder
            .run(ort::inputs![&self.encoder_input_name => input_value])
            .context("vision encoder inference failed")?;

        let output_tensor = outputs[0]
            .try_extract_array::<f32>()
            .context("failed to extract encoder output")?;

        parse_embeddings(&output_tensor.view())
    }

    /// Convert token IDs to embeddings via the embed_tokens graph
    fn embed_tokens(&self, input_ids: &[u32]) -> Result<Array3<f32>> {
        let mut embed = self.embed.lock().unwrap();

        let token_len = input_ids.len();
        let mut input_ids_array = Array2::<i64>::zeros((1, token_len));
        for (i, &token) in input_ids.iter().enumerate() {
            input_ids_array[[0, i]] = token as i64;
        }

        let input_ids_value = Value::from_array(input_ids_array)
            .context("failed to create input IDs tensor")?;

        let outputs = embed
            .run(ort::inputs!["input_ids" => input_ids_value])
            .context("token embedding inference failed")?;

        let output_tensor = outputs[0]
            .try_extract_array::<f32>()
            .context("failed to extract token embeddings")?;

        let shape = output_tensor.shape();
        if shape.len() != 3 {
            anyhow::bail!("unexpected embedding shape: {:?}", shape);
        }

        let mut embeddings = Array3::<f32>::zeros((shape[0], shape[1], shape[2]));
        for b in 0..shape[0] {
            for s in 0..shape[1] {
                for e in 0..shape[2] {
                    embeddings[[b, s, e]] = output_tensor[IxDyn(&[b, s, e])];
                }
            }
        }

        Ok(embeddings)
    }

    /// One decoder forward pass; returns next-token logits
    fn forward(&self, image_embeddings: &Array2<f32>, input_ids: &[u32]) -> Result<Vec<f32>> {
        let inputs_embeds = self.embed_tokens(input_ids)?;

        let (seq_len, embed_dim) = (image_embeddings.nrows(), image_embeddings.ncols());
        let mut encoder_input = Array3::<f32>::zeros((1, seq_len, embed_dim));
        for s in 0..seq_len {
            for e in 0..embed_dim {
                encoder_input[[0, s, e]] = image_embeddings[[s, e]];
            }
        }
        let encoder_attention_mask = Array2::<i64>::ones((1, seq_len));

        let mut decoder = self.decoder.lock().unwrap();

        let encoder_value = Value::from_array(encoder_input)
            .context("failed to create image embedding tensor")?;
        let attention_mask_value = Value::from_array(encoder_attention_mask)
            .context("failed to create attention mask tensor")?;
        let inputs_embeds_value =
            Value::from_array(inputs_embeds).context("failed to create inputs_embeds tensor")?;

        let outputs = decoder
            .run(ort::inputs![
                "encoder_hidden_states" => encoder_value,
                "encoder_attention_mask" => attention_mask_value,
                "inputs_embeds" => inputs_embeds_value
            ])
            .context("decoder inference failed")?;

        let output_tensor = outputs[0]
            .try_extract_array::<f32>()
            .context("failed to extract decoder output")?;

        let output_shape = output_tensor.shape();
        let last_pos = if output_shape.len() >= 2 {
            output_shape[1] - 1
        } else {
            0
        };
        let vocab_size = match output_shape.len() {
            3 => output_shape[2],
            2 => output_shape[1],
            _ => anyhow::bail!("unexpected decoder output shape: {:?}", output_shape),
        };

        let mut logits = vec![0.0f32; vocab_size];
        for v in 0..vocab_size {
            logits[v] = match output_shape.len() {
                3 => output_tensor[IxDyn(&[0, last_pos, v])],
                _ => output_tensor[IxDyn(&[last_pos, v])],
            };
        }

        Ok(logits)
    }
}

/// Build an ONNX session for the chosen device
fn build_session(model_path: &Path, device: &str) -> Result<Session> {
    let providers: Vec<ExecutionProviderDispatch> = if device == "cuda" {
        vec![
            CUDAExecutionProvider::default().build(),
            CPUExecutionProvider::default().build(),
        ]
    } else {
        vec![CPUExecutionProvider::default().build()]
    };

    Session::builder()
        .context("failed to create session builder")?
        .with_execution_providers(providers)
        .context("failed to set execution providers")?
        .with_optimization_level(GraphOptimizationLevel::Level3)
        .context("failed to set optimization level")?
        .with_intra_threads(4)
        .context("failed to set intra threads")?
        .commit_from_file(model_path)
        .context(format!(
            "failed to load model from {}",
            model_path.display()
        ))
}

/// Flatten encoder output to [seq, dim]
fn parse_embeddings(output: &ArrayViewD<'_, f32>) -> Result<Array2<f32>> {
    let shape = output.shape();
    match shape.len() {
        3 => {
            // [1, seq, dim] - drop the batch axis
            let view = output.index_axis(Axis(0), 0);
            let mut embeddings = Array2::<f32>::zeros((shape[1], shape[2]));
            for s in 0..shape[1] {
                for e in 0..shape[2] {
                    embeddings[[s, e]] = view[IxDyn(&[s, e])];
                }
            }
            Ok(embeddings)
        }
        2 => {
            let mut embeddings = Array2::<f32>::zeros((shape[0], shape[1]));
            for s in 0..shape[0] {
                for e in 0..shape[1] {
                    embeddings[[s, e]] = output[IxDyn(&[s, e])];
                }
            }
            Ok(embeddings)
        }
        _ => anyhow::bail!("unexpected encoder output shape: {:?}", shape),
    }
}

/// Greedy decoding: index of the highest logit
fn argmax(logits: &[f32]) -> Result<u32> {
    let (max_idx, _) = logits
        .iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
        .ok_or_else(|| anyhow::anyhow!("empty logits vector"))?;
    Ok(max_idx as u32)
}
