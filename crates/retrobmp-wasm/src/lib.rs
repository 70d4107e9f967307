//! Retrobmp WASM - WebAssembly bindings for Retrobmp
//!
//! This crate provides WASM bindings to expose the retrobmp-core codec
//! to JavaScript/TypeScript applications.
//!
//! # Module Structure
//!
//! - `types` - WASM-compatible wrapper types for pixel buffers
//! - `encode` - BMP encoding bindings (24-, 8-, and 4-bit export)
//! - `preview` - Quantized preview bindings for canvas display
//!
//! # Usage
//!
//! ```typescript
//! import init, { encode_8bit, bmp_mime_type } from '@retrobmp/wasm';
//!
//! // Initialize WASM module (must call first)
//! await init();
//!
//! // Encode the canvas contents as an 8-bit BMP
//! const imageData = ctx.getImageData(0, 0, canvas.width, canvas.height);
//! const bytes = encode_8bit(imageData.data, imageData.width, imageData.height);
//! const blob = new Blob([bytes], { type: bmp_mime_type() });
//! ```

use wasm_bindgen::prelude::*;

mod encode;
mod preview;
mod types;

// Re-export public types
pub use encode::{bmp_mime_type, encode_4bit, encode_8bit, encode_bmp, encode_truecolor};
pub use preview::{preview_4bit, preview_8bit};
pub use types::JsPixelBuffer;

/// Initialize the WASM module (called automatically on load)
#[wasm_bindgen(start)]
pub fn init() {
    // Future: Set up panic hook for better error messages in browser console
    // when console_error_panic_hook feature is added
}

/// Get the version of the WASM module
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
    }
}
