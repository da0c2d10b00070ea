// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Prompt construction and output cleanup for the vision-language model
//!
//! The model speaks ChatML with vision placeholder tokens. It may also
//! emit an intermediate reasoning block before its answer; that block
//! is stripped from user-facing text regardless of the thinking
//! configuration, since the backend can produce one either way.

use std::sync::OnceLock;

use regex::Regex;

/// Default captcha-reading instruction
pub const DEFAULT_PROMPT: &str = "Read the captcha in this image.\n\
Rules:\n\
1. If it is a letter/digit combination, return the characters directly (e.g. a3b9)\n\
2. If it is an arithmetic problem, return the computed result (e.g. 3+5=? returns 8)\n\
3. If it is logographic text, return the characters verbatim\n\
4. Return only the captcha content, no explanation\n\n\
The captcha is:";

/// Build the single-turn ChatML conversation for one recognition call
///
/// The vision placeholder marks where the encoder output is attached.
/// When thinking is disabled, an empty think block is pre-seeded so
/// the model skips straight to its answer.
pub fn build_chat_prompt(user_prompt: &str, enable_thinking: bool) -> String {
    let mut prompt = format!(
        "<|im_start|>user\n<|vision_start|><|image_pad|><|vision_end|>{user_prompt}<|im_end|>\n<|im_start|>assistant\n"
    );
    if !enable_thinking {
        prompt.push_str("<think>\n\n</think>\n\n");
    }
    prompt
}

fn think_block() -> &'static Regex {
    static THINK_BLOCK: OnceLock<Regex> = OnceLock::new();
    THINK_BLOCK.get_or_init(|| Regex::new(r"(?s)<think>.*?</think>").unwrap())
}

/// Remove any complete `<think>...</think>` block from generated text
///
/// Text without the marker passes through unchanged (modulo
/// whitespace trimming); applying this to already-stripped text is a
/// no-op.
pub fn strip_thinking(text: &str) -> String {
    think_block().replace_all(text, "").trim().to_string()
}
