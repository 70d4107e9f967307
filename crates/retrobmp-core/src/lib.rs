//! Retrobmp Core - BMP export codec
//!
//! This crate provides the core conversion functionality for Retrobmp:
//! turning decoded RGBA pixel buffers into legacy Windows BMP files at
//! 24-bit truecolor, 8-bit palettized, and 4-bit palettized depths, plus
//! the quantized previews shown on screen before a file is written.

pub mod dither;
pub mod encode;
pub mod palette;
pub mod preview;

pub use dither::apply_floyd_steinberg;
pub use encode::{
    encode, encode_4bit, encode_8bit, encode_truecolor, EncodeError, EncodedImage, BMP_MIME_TYPE,
};
pub use preview::{preview_4bit, preview_8bit};

use serde::{Deserialize, Serialize};

/// Upper bound on `width * height` accepted by the codec.
///
/// Callers are expected to validate uploads before invoking the encoder;
/// this bound is the codec's own guard against unbounded allocation.
pub const MAX_PIXELS: u64 = 250_000_000;

/// Alpha values below this threshold are treated as transparent: such
/// pixels are skipped when sampling palette frequencies and when diffusing
/// dither error, and they always map to palette index 0 in encoded output.
pub const OPAQUE_ALPHA_THRESHOLD: u8 = 128;

/// Target color depth for BMP encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ColorDepth {
    /// 24-bit truecolor (no palette table).
    #[default]
    Truecolor,
    /// 8-bit palettized (256-color table).
    Palette256,
    /// 4-bit palettized (16-color table).
    Palette16,
}

impl ColorDepth {
    /// Bits per pixel written into the DIB header.
    pub fn bits_per_pixel(self) -> u16 {
        match self {
            ColorDepth::Truecolor => 24,
            ColorDepth::Palette256 => 8,
            ColorDepth::Palette16 => 4,
        }
    }

    /// Number of palette entries stored in the file (0 for truecolor).
    pub fn palette_len(self) -> usize {
        match self {
            ColorDepth::Truecolor => 0,
            ColorDepth::Palette256 => 256,
            ColorDepth::Palette16 => 16,
        }
    }

    /// Convert a bits-per-pixel value as selected in the UI.
    ///
    /// Only 24, 8, and 4 are supported; anything else is a typed error,
    /// never a silent fallback to a different depth.
    pub fn from_bits_per_pixel(bits: u16) -> Result<Self, EncodeError> {
        match bits {
            24 => Ok(ColorDepth::Truecolor),
            8 => Ok(ColorDepth::Palette256),
            4 => Ok(ColorDepth::Palette16),
            other => Err(EncodeError::UnsupportedDepth(other)),
        }
    }
}

/// Options controlling a BMP export, as selected in the conversion dialog.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EncodeOptions {
    /// Requested bits per pixel (24, 8, or 4).
    pub depth: u16,
    /// Apply Floyd-Steinberg dithering before 4-bit quantization.
    #[serde(default)]
    pub aggressive: bool,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            depth: 24,
            aggressive: false,
        }
    }
}

/// An RGBA pixel buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// RGBA pixel data in row-major order (4 bytes per pixel).
    /// Length should be width * height * 4.
    pub pixels: Vec<u8>,
}

impl PixelBuffer {
    /// Create a new PixelBuffer with the given dimensions and pixel data.
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        debug_assert_eq!(
            pixels.len(),
            (width as usize) * (height as usize) * 4,
            "Pixel buffer size mismatch"
        );
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Get the total number of pixels.
    pub fn pixel_count(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Get the size of the pixel buffer in bytes.
    pub fn byte_size(&self) -> usize {
        self.pixels.len()
    }

    /// Check if this is an empty/invalid image.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0 || self.pixels.is_empty()
    }
}
