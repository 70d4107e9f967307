//! BMP encoding WASM bindings.
//!
//! This module exposes the retrobmp-core encode functions to JavaScript,
//! enabling the conversion workflow to produce downloadable BMP files.
//!
//! # Functions
//!
//! - [`encode_truecolor`] - Encode RGBA pixel data as a 24-bit BMP
//! - [`encode_8bit`] - Encode RGBA pixel data as an 8-bit palettized BMP
//! - [`encode_4bit`] - Encode RGBA pixel data as a 4-bit palettized BMP
//! - [`encode_bmp`] - Encode a JsPixelBuffer using an options object
//! - [`bmp_mime_type`] - MIME type for the produced files
//!
//! # Example
//!
//! ```typescript
//! import { encode_4bit, encode_bmp, bmp_mime_type } from '@retrobmp/wasm';
//!
//! // Encode raw canvas data with dithering
//! const bytes = encode_4bit(imageData.data, imageData.width, imageData.height, true);
//!
//! // Or drive the depth from a settings object
//! const bytes = encode_bmp(image, { depth: 4, aggressive: true });
//!
//! const blob = new Blob([bytes], { type: bmp_mime_type() });
//! ```

use crate::types::JsPixelBuffer;
use retrobmp_core::{encode, ColorDepth, EncodeOptions};
use wasm_bindgen::prelude::*;

/// MIME type of the produced files (always `image/bmp`).
///
/// Browsers don't natively encode `image/bmp`, which is why the codec
/// exists; the tag is what the save path attaches to the download blob.
#[wasm_bindgen]
pub fn bmp_mime_type() -> String {
    retrobmp_core::BMP_MIME_TYPE.to_string()
}

/// Encode RGBA pixel data as a 24-bit truecolor BMP.
///
/// # Arguments
///
/// * `pixels` - RGBA pixel data as a `Uint8Array` (4 bytes per pixel,
///   row-major order, the layout of canvas `ImageData`)
/// * `width` - Image width in pixels
/// * `height` - Image height in pixels
///
/// # Returns
///
/// A `Uint8Array` containing the complete BMP file bytes, or an error if
/// the input fails validation.
///
/// # Errors
///
/// Returns an error if:
/// - The pixel data length doesn't match width * height * 4
/// - Width or height is zero, or the pixel count exceeds the codec limit
#[wasm_bindgen]
pub fn encode_truecolor(pixels: &[u8], width: u32, height: u32) -> Result<Vec<u8>, JsValue> {
    encode::encode_truecolor(pixels, width, height)
        .map(|img| img.bytes)
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Encode RGBA pixel data as an 8-bit palettized BMP (256 colors).
///
/// The color table is rebuilt from the image on every call, so identical
/// input always produces identical output.
#[wasm_bindgen]
pub fn encode_8bit(pixels: &[u8], width: u32, height: u32) -> Result<Vec<u8>, JsValue> {
    encode::encode_8bit(pixels, width, height)
        .map(|img| img.bytes)
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Encode RGBA pixel data as a 4-bit palettized BMP (16 colors).
///
/// With `aggressive` set, Floyd-Steinberg dithering runs before
/// quantization, trading flat color areas for smoother gradients.
#[wasm_bindgen]
pub fn encode_4bit(
    pixels: &[u8],
    width: u32,
    height: u32,
    aggressive: bool,
) -> Result<Vec<u8>, JsValue> {
    encode::encode_4bit(pixels, width, height, aggressive)
        .map(|img| img.bytes)
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Encode a JsPixelBuffer using an options object.
///
/// This is a convenience entry for callers that keep the export settings
/// in one place. The options object is `{ depth, aggressive }`, where
/// `depth` is bits per pixel (24, 8, or 4) and `aggressive` (optional,
/// default false) enables dithering for the 4-bit path.
///
/// # Example
///
/// ```typescript
/// const bytes = encode_bmp(image, { depth: 8 });
/// const dithered = encode_bmp(image, { depth: 4, aggressive: true });
/// ```
#[wasm_bindgen]
pub fn encode_bmp(image: &JsPixelBuffer, options: JsValue) -> Result<Vec<u8>, JsValue> {
    let options: EncodeOptions =
        serde_wasm_bindgen::from_value(options).map_err(|e| JsValue::from_str(&e.to_string()))?;
    let depth = ColorDepth::from_bits_per_pixel(options.depth)
        .map_err(|e| JsValue::from_str(&e.to_string()))?;

    let pixels = image.pixels();
    encode::encode(
        &pixels,
        image.width(),
        image.height(),
        depth,
        options.aggressive,
    )
    .map(|img| img.bytes)
    .map_err(|e| JsValue::from_str(&e.to_string()))
}


/// WASM-specific tests that require JsValue.
///
/// These tests use functions that return `Result<T, JsValue>` and can only
/// run on wasm32 targets. Use `wasm-pack test` to run these.
#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    fn options(depth: u16, aggressive: bool) -> JsValue {
        let obj = js_sys::Object::new();
        js_sys::Reflect::set(&obj, &"depth".into(), &JsValue::from(depth)).unwrap();
        js_sys::Reflect::set(&obj, &"aggressive".into(), &JsValue::from(aggressive)).unwrap();
        obj.into()
    }

    #[wasm_bindgen_test]
    fn test_encode_truecolor_basic() {
        let pixels = vec![128u8; 10 * 10 * 4];
        let result = encode_truecolor(&pixels, 10, 10);
        assert!(result.is_ok());

        let bytes = result.unwrap();
        assert_eq!(&bytes[0..2], b"BM");
    }

    #[wasm_bindgen_test]
    fn test_encode_invalid_dimensions() {
        let pixels = vec![128u8; 100];
        let result = encode_truecolor(&pixels, 0, 100);
        assert!(result.is_err());
    }

    #[wasm_bindgen_test]
    fn test_encode_invalid_pixel_data() {
        let pixels = vec![128u8; 5 * 5 * 4]; // Wrong size for 10x10
        let result = encode_8bit(&pixels, 10, 10);
        assert!(result.is_err());
    }

    #[wasm_bindgen_test]
    fn test_encode_bmp_with_options() {
        let buf = JsPixelBuffer::new(4, 4, vec![200u8; 4 * 4 * 4]);
        let result = encode_bmp(&buf, options(4, true));
        assert!(result.is_ok());

        let bytes = result.unwrap();
        assert_eq!(&bytes[0..2], b"BM");
    }

    #[wasm_bindgen_test]
    fn test_encode_bmp_rejects_unsupported_depth() {
        let buf = JsPixelBuffer::new(2, 2, vec![0u8; 2 * 2 * 4]);
        let result = encode_bmp(&buf, options(16, false));
        assert!(result.is_err());
    }

    #[wasm_bindgen_test]
    fn test_encode_bmp_aggressive_defaults_to_false() {
        let buf = JsPixelBuffer::new(2, 2, vec![90u8; 2 * 2 * 4]);

        let obj = js_sys::Object::new();
        js_sys::Reflect::set(&obj, &"depth".into(), &JsValue::from(4u16)).unwrap();

        let without_flag = encode_bmp(&buf, obj.into()).unwrap();
        let explicit = encode_bmp(&buf, options(4, false)).unwrap();
        assert_eq!(without_flag, explicit);
    }
}
