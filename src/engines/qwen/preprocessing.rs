// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Image preprocessing for the vision-language encoder

use image::imageops::FilterType;
use image::DynamicImage;
use ndarray::Array4;

/// Vision transformer patch size; output dimensions align to it
pub const PATCH_SIZE: u32 = 28;

/// CLIP normalization mean values
pub const MEAN: [f32; 3] = [0.481_454_66, 0.457_827_5, 0.408_210_73];

/// CLIP normalization std values
pub const STD: [f32; 3] = [0.268_629_54, 0.261_302_58, 0.275_777_11];

/// Compute output dimensions within the configured pixel budget
///
/// Keeps the aspect ratio, aligns both dimensions to the patch size,
/// and scales so the total pixel count lands inside
/// `[min_pixels, max_pixels]` where the rounding allows it.
pub fn bounded_dimensions(
    width: u32,
    height: u32,
    min_pixels: u32,
    max_pixels: u32,
) -> (u32, u32) {
    let width = width.max(1) as f64;
    let height = height.max(1) as f64;
    let pixels = width * height;

    let scale = if pixels > max_pixels as f64 {
        (max_pixels as f64 / pixels).sqrt()
    } else if pixels < min_pixels as f64 {
        (min_pixels as f64 / pixels).sqrt()
    } else {
        1.0
    };

    let align = |v: f64| -> u32 {
        let patches = (v / PATCH_SIZE as f64).round().max(1.0) as u32;
        patches * PATCH_SIZE
    };

    let mut out_w = align(width * scale);
    let mut out_h = align(height * scale);

    // Rounding up on both axes can overshoot the budget; shrink the
    // longer axis one patch at a time until back inside.
    while out_w as u64 * out_h as u64 > max_pixels as u64 {
        if out_w >= out_h && out_w > PATCH_SIZE {
            out_w -= PATCH_SIZE;
        } else if out_h > PATCH_SIZE {
            out_h -= PATCH_SIZE;
        } else {
            break;
        }
    }

    (out_w, out_h)
}

/// Preprocess a decoded image for the vision encoder
///
/// Steps:
/// 1. Flatten any alpha channel to opaque RGB
/// 2. Resize into the pixel budget, patch-aligned
/// 3. Normalize with CLIP mean/std: (pixel/255 - mean) / std
/// 4. NCHW tensor [1, 3, H, W]
pub fn preprocess_for_vlm(image: &DynamicImage, min_pixels: u32, max_pixels: u32) -> Array4<f32> {
    let (width, height) = (image.width(), image.height());
    let (out_w, out_h) = bounded_dimensions(width, height, min_pixels, max_pixels);

    let rgb = image
        .resize_exact(out_w, out_h, FilterType::Lanczos3)
        .to_rgb8();

    let (w, h) = (out_w as usize, out_h as usize);
    let mut tensor = Array4::zeros((1, 3, h, w));
    for y in 0..h {
        for x in 0..w {
            let pixel = rgb.get_pixel(x as u32, y as u32);
            for c in 0..3 {
                tensor[[0, c, y, x]] = (pixel[c] as f32 / 255.0 - MEAN[c]) / STD[c];
            }
        }
    }

    tensor
}
