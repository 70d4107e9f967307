//! Quantized preview generation.
//!
//! The conversion dialog shows what a palettized BMP will look like before
//! the file is written. Previews reuse the exact palette builder and
//! matcher the encoder uses, but emit an RGBA buffer for canvas display
//! instead of a file, so what the user sees is what the encoder writes.

use crate::dither::apply_floyd_steinberg;
use crate::encode::{validate_rgba, EncodeError};
use crate::palette::IndexedPalette;
use crate::{PixelBuffer, OPAQUE_ALPHA_THRESHOLD};

/// Generate the 256-color preview of an image.
///
/// # Arguments
/// * `pixels` - RGBA pixel data (4 bytes per pixel, row-major order)
/// * `width` - Image width in pixels
/// * `height` - Image height in pixels
///
/// # Returns
/// A new [`PixelBuffer`] of the same dimensions, with every opaque pixel
/// replaced by its matched palette color. Alpha bytes pass through
/// unchanged; transparent-ish pixels get their RGB zeroed.
pub fn preview_8bit(pixels: &[u8], width: u32, height: u32) -> Result<PixelBuffer, EncodeError> {
    validate_rgba(pixels, width, height)?;

    let palette = IndexedPalette::build_8bit(pixels);
    Ok(PixelBuffer::new(
        width,
        height,
        quantize_pixels(pixels, &palette),
    ))
}

/// Generate the 16-color preview of an image.
///
/// With `aggressive` set, Floyd-Steinberg dithering runs first and both
/// the palette and the preview are derived from the dithered copy, exactly
/// as the 4-bit encoder does.
pub fn preview_4bit(
    pixels: &[u8],
    width: u32,
    height: u32,
    aggressive: bool,
) -> Result<PixelBuffer, EncodeError> {
    validate_rgba(pixels, width, height)?;

    if aggressive {
        let dithered = apply_floyd_steinberg(pixels, width, height);
        let palette = IndexedPalette::build_4bit(&dithered);
        Ok(PixelBuffer::new(
            width,
            height,
            quantize_pixels(&dithered, &palette),
        ))
    } else {
        let palette = IndexedPalette::build_4bit(pixels);
        Ok(PixelBuffer::new(
            width,
            height,
            quantize_pixels(pixels, &palette),
        ))
    }
}

/// Replace every pixel with its matched palette color.
fn quantize_pixels(pixels: &[u8], palette: &IndexedPalette) -> Vec<u8> {
    let mut out = Vec::with_capacity(pixels.len());
    for px in pixels.chunks_exact(4) {
        if px[3] < OPAQUE_ALPHA_THRESHOLD {
            out.extend_from_slice(&[0, 0, 0, px[3]]);
        } else {
            let color = palette.entries()[palette.nearest_index(px[0], px[1], px[2]) as usize];
            out.extend_from_slice(&[color.r, color.g, color.b, px[3]]);
        }
    }
    out
}
