// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Image preprocessing for the glyph classifier

use anyhow::{Context, Result};
use image::imageops::FilterType;
use image::DynamicImage;
use ndarray::Array4;

/// Fixed input height of the classifier; width scales with aspect ratio
pub const CLASSIFIER_INPUT_HEIGHT: u32 = 64;

/// Decode raw bytes and convert to the classifier input tensor
///
/// Steps:
/// 1. Decode and convert to grayscale
/// 2. Resize to height 64 preserving aspect ratio
/// 3. Normalize to [-1, 1]: (pixel/255 - 0.5) / 0.5
/// 4. NCHW tensor [1, 1, 64, W]
pub fn preprocess_for_classifier(image_data: &[u8]) -> Result<Array4<f32>> {
    let image = image::load_from_memory(image_data).context("failed to decode image")?;
    Ok(image_to_tensor(&image))
}

/// Convert a decoded image to the classifier input tensor
pub fn image_to_tensor(image: &DynamicImage) -> Array4<f32> {
    let gray = image.to_luma8();
    let (width, height) = gray.dimensions();

    let target_width = if height == 0 {
        1
    } else {
        ((width as f32 * CLASSIFIER_INPUT_HEIGHT as f32 / height as f32).round() as u32).max(1)
    };

    let resized = DynamicImage::ImageLuma8(gray)
        .resize_exact(target_width, CLASSIFIER_INPUT_HEIGHT, FilterType::Lanczos3)
        .to_luma8();

    let (w, h) = (target_width as usize, CLASSIFIER_INPUT_HEIGHT as usize);
    let mut tensor = Array4::zeros((1, 1, h, w));
    for y in 0..h {
        for x in 0..w {
            let pixel = resized.get_pixel(x as u32, y as u32)[0];
            tensor[[0, 0, y, x]] = (pixel as f32 / 255.0 - 0.5) / 0.5;
        }
    }

    tensor
}
