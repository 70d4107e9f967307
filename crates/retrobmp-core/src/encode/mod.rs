//! BMP encoding pipeline for Retrobmp.
//!
//! This module provides functionality for:
//! - Encoding RGBA pixel buffers as legacy Windows BMP files at 24-bit
//!   truecolor, 8-bit palettized, and 4-bit palettized depths
//!
//! # Architecture
//!
//! The encoding pipeline is designed to be used from Web Workers via WASM
//! bindings. All operations are synchronous and single-threaded within
//! WASM; each call is a pure transform from an input buffer to a finished
//! file held in memory.

mod bmp;

pub(crate) use bmp::validate_rgba;
pub use bmp::{
    encode, encode_4bit, encode_8bit, encode_truecolor, EncodeError, EncodedImage, BMP_MIME_TYPE,
};
