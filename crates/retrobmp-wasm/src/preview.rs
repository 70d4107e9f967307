//! Quantized preview WASM bindings.
//!
//! This module exposes the retrobmp-core preview functions to JavaScript,
//! so the conversion dialog can render what a palettized export will look
//! like before the user commits to a file.
//!
//! # Example
//!
//! ```typescript
//! import { preview_4bit } from '@retrobmp/wasm';
//!
//! const preview = preview_4bit(imageData.data, imageData.width, imageData.height, true);
//! const out = new ImageData(
//!   new Uint8ClampedArray(preview.pixels()),
//!   preview.width,
//!   preview.height,
//! );
//! ctx.putImageData(out, 0, 0);
//! ```

use crate::types::JsPixelBuffer;
use retrobmp_core::preview;
use wasm_bindgen::prelude::*;

/// Generate the 256-color preview of an image.
///
/// # Arguments
///
/// * `pixels` - RGBA pixel data as a `Uint8Array` (4 bytes per pixel,
///   row-major order)
/// * `width` - Image width in pixels
/// * `height` - Image height in pixels
///
/// # Returns
///
/// A [`JsPixelBuffer`] of the same dimensions with every opaque pixel
/// replaced by its palette color, or an error if the input fails
/// validation. The quantization is identical to what `encode_8bit` writes
/// to the file.
#[wasm_bindgen]
pub fn preview_8bit(pixels: &[u8], width: u32, height: u32) -> Result<JsPixelBuffer, JsValue> {
    preview::preview_8bit(pixels, width, height)
        .map(JsPixelBuffer::from_buffer)
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Generate the 16-color preview of an image.
///
/// With `aggressive` set, the preview shows the Floyd-Steinberg dithered
/// result, matching what `encode_4bit` would write with the same flag.
#[wasm_bindgen]
pub fn preview_4bit(
    pixels: &[u8],
    width: u32,
    height: u32,
    aggressive: bool,
) -> Result<JsPixelBuffer, JsValue> {
    preview::preview_4bit(pixels, width, height, aggressive)
        .map(JsPixelBuffer::from_buffer)
        .map_err(|e| JsValue::from_str(&e.to_string()))
}
