// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Command-line client for a running captcha OCR node
//!
//! Reads an image file, posts it as JSON base64, and prints the
//! service response.

use std::path::PathBuf;

use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use clap::Parser;
use serde_json::json;

#[derive(Parser, Debug)]
#[command(name = "captcha-cli", about = "Send a captcha image to the OCR service")]
struct Args {
    /// Image file to recognize
    image: PathBuf,

    /// Service base URL
    #[arg(long, default_value = "http://127.0.0.1:5000", env = "CAPTCHA_SERVER")]
    server: String,

    /// Engine to use (ddddocr or qwen)
    #[arg(long)]
    engine: Option<String>,

    /// Custom prompt (qwen engine only)
    #[arg(long)]
    prompt: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let data = std::fs::read(&args.image)
        .context(format!("failed to read {}", args.image.display()))?;

    let mut body = json!({ "image_base64": STANDARD.encode(&data) });
    if let Some(engine) = &args.engine {
        body["engine"] = json!(engine);
    }
    if let Some(prompt) = &args.prompt {
        body["prompt"] = json!(prompt);
    }

    let url = format!("{}/ocr", args.server.trim_end_matches('/'));
    let response = reqwest::Client::new()
        .post(&url)
        .json(&body)
        .send()
        .await
        .context(format!("request to {url} failed"))?;

    let status = response.status();
    let result: serde_json::Value = response
        .json()
        .await
        .context("failed to parse service response")?;

    println!("{}", serde_json::to_string_pretty(&result)?);

    if !status.is_success() {
        std::process::exit(1);
    }
    Ok(())
}
