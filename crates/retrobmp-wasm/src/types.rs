//! WASM-compatible wrapper types for pixel data.
//!
//! This module provides JavaScript-friendly types that wrap the core
//! Retrobmp types, handling the conversion between Rust and JavaScript
//! data representations.

use retrobmp_core::PixelBuffer;
use wasm_bindgen::prelude::*;

/// An RGBA pixel buffer wrapper for JavaScript.
///
/// This type wraps the core `PixelBuffer` type and provides a
/// JavaScript-friendly interface for accessing image dimensions and pixel
/// data, in the same 4-bytes-per-pixel layout as canvas `ImageData`.
///
/// # Memory Management
///
/// The pixel data is stored in WASM memory. When you call `pixels()`, a copy
/// is made to JavaScript memory as a `Uint8Array`. For performance-critical
/// code, consider keeping the buffer in WASM memory and only extracting
/// pixels when needed.
///
/// The `free()` method can be called to explicitly release WASM memory, but
/// this is optional as wasm-bindgen's finalizer will handle cleanup
/// automatically.
#[wasm_bindgen]
pub struct JsPixelBuffer {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

#[wasm_bindgen]
impl JsPixelBuffer {
    /// Create a new JsPixelBuffer from dimensions and pixel data.
    ///
    /// # Arguments
    /// * `width` - Image width in pixels
    /// * `height` - Image height in pixels
    /// * `pixels` - RGBA pixel data (4 bytes per pixel, row-major order)
    #[wasm_bindgen(constructor)]
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> JsPixelBuffer {
        JsPixelBuffer {
            width,
            height,
            pixels,
        }
    }

    /// Get the image width in pixels
    #[wasm_bindgen(getter)]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Get the image height in pixels
    #[wasm_bindgen(getter)]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Get the number of bytes in the pixel buffer (width * height * 4)
    #[wasm_bindgen(getter)]
    pub fn byte_length(&self) -> usize {
        self.pixels.len()
    }

    /// Returns RGBA pixel data as Uint8Array.
    ///
    /// Note: This creates a copy of the pixel data. For large images, this
    /// can take 10-50ms but is necessary for safe memory management.
    pub fn pixels(&self) -> Vec<u8> {
        self.pixels.clone()
    }

    /// Explicitly free WASM memory.
    ///
    /// This is optional - wasm-bindgen's finalizer will handle cleanup
    /// automatically. Call this if you want to immediately release memory
    /// for a large image.
    pub fn free(self) {
        // Dropping self releases the memory
    }
}

impl JsPixelBuffer {
    /// Create a JsPixelBuffer from a core PixelBuffer.
    ///
    /// This is an internal constructor used by the preview bindings.
    pub(crate) fn from_buffer(buf: PixelBuffer) -> Self {
        Self {
            width: buf.width,
            height: buf.height,
            pixels: buf.pixels,
        }
    }
}
