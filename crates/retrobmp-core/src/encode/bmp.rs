//! BMP serialization.
//!
//! Writes legacy Windows BMP files (BITMAPINFOHEADER, uncompressed) from
//! RGBA input. The DIB height is written negative, selecting top-down row
//! order so pixel rows can be emitted in the same order they arrive.
//! Palettized depths store a BGR0 color table between the headers and the
//! pixel array; every pixel row is zero-padded to a 4-byte boundary.

use thiserror::Error;

use crate::dither::apply_floyd_steinberg;
use crate::palette::{pixel_indices, IndexedPalette};
use crate::{ColorDepth, MAX_PIXELS};

/// MIME type tag attached to every encoded file.
pub const BMP_MIME_TYPE: &str = "image/bmp";

/// Byte length of the BMP file header.
const FILE_HEADER_SIZE: usize = 14;

/// Byte length of the BITMAPINFOHEADER.
const DIB_HEADER_SIZE: usize = 40;

/// Offset of the pixel array (or palette table) from the start of file.
const HEADERS_SIZE: usize = FILE_HEADER_SIZE + DIB_HEADER_SIZE;

/// Horizontal and vertical resolution written into the DIB header,
/// in pixels per meter (~72 DPI).
const PIXELS_PER_METER: i32 = 2835;

/// Errors that can occur during BMP encoding.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// Width or height is zero, or the pixel count exceeds the allocation
    /// guard ([`MAX_PIXELS`](crate::MAX_PIXELS)).
    #[error("Invalid dimensions: width ({width}) and height ({height}) must be non-zero and within the pixel limit")]
    InvalidDimensions { width: u32, height: u32 },

    /// Pixel data length doesn't match expected dimensions
    #[error("Invalid pixel data: expected {expected} bytes (width * height * 4), got {actual}")]
    BufferLengthMismatch { expected: usize, actual: usize },

    /// The requested bits-per-pixel value has no encoder.
    #[error("Unsupported color depth: {0} bits per pixel (supported: 24, 8, 4)")]
    UnsupportedDepth(u16),
}

/// A finished BMP file held in memory.
///
/// Ownership of the bytes transfers to the caller; the encoder keeps no
/// state between invocations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    /// The complete file contents.
    pub bytes: Vec<u8>,
    /// MIME type for the save path (always `image/bmp`).
    pub mime_type: &'static str,
}

impl EncodedImage {
    fn new(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            mime_type: BMP_MIME_TYPE,
        }
    }
}

/// Validate an RGBA buffer against its claimed dimensions.
///
/// Runs before any output allocation: either the whole encode proceeds or
/// nothing is written.
pub(crate) fn validate_rgba(pixels: &[u8], width: u32, height: u32) -> Result<(), EncodeError> {
    if width == 0 || height == 0 || width as u64 * height as u64 > MAX_PIXELS {
        return Err(EncodeError::InvalidDimensions { width, height });
    }
    let expected = (width as usize) * (height as usize) * 4;
    if pixels.len() != expected {
        return Err(EncodeError::BufferLengthMismatch {
            expected,
            actual: pixels.len(),
        });
    }
    Ok(())
}

/// Encode RGBA pixel data as a 24-bit truecolor BMP.
///
/// # Arguments
/// * `pixels` - RGBA pixel data (4 bytes per pixel, row-major order)
/// * `width` - Image width in pixels
/// * `height` - Image height in pixels
///
/// # Returns
/// The complete BMP file bytes. Pixels are written in B,G,R order with the
/// alpha channel dropped; no palette table is emitted.
pub fn encode_truecolor(
    pixels: &[u8],
    width: u32,
    height: u32,
) -> Result<EncodedImage, EncodeError> {
    validate_rgba(pixels, width, height)?;

    let row = row_size(24, width);
    let pixel_array_size = row * height as usize;
    let padding = row - width as usize * 3;

    let mut bytes = Vec::with_capacity(HEADERS_SIZE + pixel_array_size);
    write_headers(&mut bytes, width, height, ColorDepth::Truecolor, pixel_array_size);

    for row_pixels in pixels.chunks_exact(width as usize * 4) {
        for px in row_pixels.chunks_exact(4) {
            bytes.extend_from_slice(&[px[2], px[1], px[0]]);
        }
        let len = bytes.len();
        bytes.resize(len + padding, 0);
    }

    Ok(EncodedImage::new(bytes))
}

/// Encode RGBA pixel data as an 8-bit palettized BMP.
///
/// A 256-color table is built from the image (see
/// [`IndexedPalette::build_8bit`]) and each pixel is stored as one index
/// byte. Transparent-ish pixels take index 0.
pub fn encode_8bit(pixels: &[u8], width: u32, height: u32) -> Result<EncodedImage, EncodeError> {
    validate_rgba(pixels, width, height)?;

    let palette = IndexedPalette::build_8bit(pixels);
    let indices = pixel_indices(pixels, &palette);

    let row = row_size(8, width);
    let pixel_array_size = row * height as usize;

    let mut bytes = Vec::with_capacity(HEADERS_SIZE + palette.len() * 4 + pixel_array_size);
    write_headers(&mut bytes, width, height, ColorDepth::Palette256, pixel_array_size);
    write_palette(&mut bytes, &palette);

    for row_indices in indices.chunks_exact(width as usize) {
        bytes.extend_from_slice(row_indices);
        let len = bytes.len();
        bytes.resize(len + (row - width as usize), 0);
    }

    Ok(EncodedImage::new(bytes))
}

/// Encode RGBA pixel data as a 4-bit palettized BMP.
///
/// A 16-color table is built from the image (see
/// [`IndexedPalette::build_4bit`]) and pixels are packed two per byte,
/// even-x pixel in the high nibble. With `aggressive` set, Floyd-Steinberg
/// dithering runs first and the palette is built from the dithered copy.
pub fn encode_4bit(
    pixels: &[u8],
    width: u32,
    height: u32,
    aggressive: bool,
) -> Result<EncodedImage, EncodeError> {
    validate_rgba(pixels, width, height)?;

    if aggressive {
        let dithered = apply_floyd_steinberg(pixels, width, height);
        Ok(encode_4bit_prepared(&dithered, width, height))
    } else {
        Ok(encode_4bit_prepared(pixels, width, height))
    }
}

/// Encode with a runtime-selected depth.
///
/// `aggressive` only affects the 4-bit path; the other depths never
/// dither.
pub fn encode(
    pixels: &[u8],
    width: u32,
    height: u32,
    depth: ColorDepth,
    aggressive: bool,
) -> Result<EncodedImage, EncodeError> {
    match depth {
        ColorDepth::Truecolor => encode_truecolor(pixels, width, height),
        ColorDepth::Palette256 => encode_8bit(pixels, width, height),
        ColorDepth::Palette16 => encode_4bit(pixels, width, height, aggressive),
    }
}

/// 4-bit serialization over an already-dithered (or raw) buffer.
fn encode_4bit_prepared(pixels: &[u8], width: u32, height: u32) -> EncodedImage {
    let palette = IndexedPalette::build_4bit(pixels);
    let indices = pixel_indices(pixels, &palette);

    let row = row_size(4, width);
    let pixel_array_size = row * height as usize;
    let packed_width = (width as usize).div_ceil(2);

    let mut bytes = Vec::with_capacity(HEADERS_SIZE + palette.len() * 4 + pixel_array_size);
    write_headers(&mut bytes, width, height, ColorDepth::Palette16, pixel_array_size);
    write_palette(&mut bytes, &palette);

    for row_indices in indices.chunks_exact(width as usize) {
        for pair in row_indices.chunks(2) {
            // High nibble = even-x pixel; a missing odd pixel packs as 0.
            let low = if pair.len() == 2 { pair[1] } else { 0 };
            bytes.push((pair[0] << 4) | low);
        }
        let len = bytes.len();
        bytes.resize(len + (row - packed_width), 0);
    }

    EncodedImage::new(bytes)
}

/// Padded byte length of one pixel row: BMP rows align to 4 bytes.
fn row_size(bits_per_pixel: usize, width: u32) -> usize {
    (bits_per_pixel * width as usize + 31) / 32 * 4
}

/// Write the 14-byte file header and the 40-byte BITMAPINFOHEADER.
fn write_headers(
    bytes: &mut Vec<u8>,
    width: u32,
    height: u32,
    depth: ColorDepth,
    pixel_array_size: usize,
) {
    let palette_bytes = depth.palette_len() * 4;
    let file_size = HEADERS_SIZE + palette_bytes + pixel_array_size;
    let data_offset = HEADERS_SIZE + palette_bytes;

    // File header
    bytes.extend_from_slice(b"BM");
    write_u32(bytes, file_size as u32);
    write_u32(bytes, 0); // Reserved
    write_u32(bytes, data_offset as u32);

    // BITMAPINFOHEADER
    write_u32(bytes, DIB_HEADER_SIZE as u32);
    write_i32(bytes, width as i32);
    write_i32(bytes, -(height as i64) as i32); // Negative height = top-down rows
    write_u16(bytes, 1); // Planes
    write_u16(bytes, depth.bits_per_pixel());
    write_u32(bytes, 0); // Compression (BI_RGB, uncompressed)
    write_u32(bytes, pixel_array_size as u32);
    write_i32(bytes, PIXELS_PER_METER);
    write_i32(bytes, PIXELS_PER_METER);
    write_u32(bytes, depth.palette_len() as u32); // Colors in palette
    write_u32(bytes, depth.palette_len() as u32); // Important colors
}

/// Write the color table: one BGR0 entry per palette slot, in order.
fn write_palette(bytes: &mut Vec<u8>, palette: &IndexedPalette) {
    for entry in palette.entries() {
        bytes.extend_from_slice(&[entry.b, entry.g, entry.r, 0]);
    }
}

fn write_u16(bytes: &mut Vec<u8>, value: u16) {
    bytes.extend_from_slice(&value.to_le_bytes());
}

fn write_u32(bytes: &mut Vec<u8>, value: u32) {
    bytes.extend_from_slice(&value.to_le_bytes());
}

fn write_i32(bytes: &mut Vec<u8>, value: i32) {
    bytes.extend_from_slice(&value.to_le_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_u16(bytes: &[u8], offset: usize) -> u16 {
        u16::from_le_bytes([bytes[offset], bytes[offset + 1]])
    }

    fn read_u32(bytes: &[u8], offset: usize) -> u32 {
        u32::from_le_bytes([
            bytes[offset],
            bytes[offset + 1],
            bytes[offset + 2],
            bytes[offset + 3],
        ])
    }

    fn read_i32(bytes: &[u8], offset: usize) -> i32 {
        read_u32(bytes, offset) as i32
    }

    /// 2x2 test card: red, green, blue, white.
    fn test_card() -> Vec<u8> {
        vec![
            255, 0, 0, 255, //
            0, 255, 0, 255, //
            0, 0, 255, 255, //
            255, 255, 255, 255,
        ]
    }

    #[test]
    fn test_truecolor_2x2_layout() {
        let img = encode_truecolor(&test_card(), 2, 2).unwrap();
        assert_eq!(img.mime_type, "image/bmp");

        // row_size = (24 * 2 + 31) / 32 * 4 = 8; total = 54 + 8 * 2 = 70.
        assert_eq!(img.bytes.len(), 70);
        assert_eq!(&img.bytes[0..2], b"BM");
        assert_eq!(read_u32(&img.bytes, 2), 70); // File size
        assert_eq!(read_u32(&img.bytes, 6), 0); // Reserved
        assert_eq!(read_u32(&img.bytes, 10), 54); // Pixel data offset
        assert_eq!(read_u32(&img.bytes, 14), 40); // DIB header size
        assert_eq!(read_i32(&img.bytes, 18), 2); // Width
        assert_eq!(read_i32(&img.bytes, 22), -2); // Height (top-down)
        assert_eq!(read_u16(&img.bytes, 26), 1); // Planes
        assert_eq!(read_u16(&img.bytes, 28), 24); // Bits per pixel
        assert_eq!(read_u32(&img.bytes, 30), 0); // Compression
        assert_eq!(read_u32(&img.bytes, 34), 16); // Pixel array size
        assert_eq!(read_i32(&img.bytes, 38), 2835); // X pixels per meter
        assert_eq!(read_i32(&img.bytes, 42), 2835); // Y pixels per meter
        assert_eq!(read_u32(&img.bytes, 46), 0); // Colors in palette
        assert_eq!(read_u32(&img.bytes, 50), 0); // Important colors

        // First pixel: red stored as B,G,R.
        assert_eq!(&img.bytes[54..57], &[0, 0, 255]);
        // Second pixel: green.
        assert_eq!(&img.bytes[57..60], &[0, 255, 0]);
        // Row padding (6 data bytes per row, 2 pad bytes).
        assert_eq!(&img.bytes[60..62], &[0, 0]);
        // Second row: blue then white.
        assert_eq!(&img.bytes[62..65], &[255, 0, 0]);
        assert_eq!(&img.bytes[65..68], &[255, 255, 255]);
        assert_eq!(&img.bytes[68..70], &[0, 0]);
    }

    #[test]
    fn test_truecolor_row_padding_is_zero() {
        // Width 3: 9 data bytes per row, padded to 12.
        let pixels = vec![200u8; 3 * 2 * 4];
        let img = encode_truecolor(&pixels, 3, 2).unwrap();
        assert_eq!(img.bytes.len(), 54 + 12 * 2);
        for row in 0..2 {
            let row_start = 54 + row * 12;
            assert_eq!(&img.bytes[row_start + 9..row_start + 12], &[0, 0, 0]);
        }
    }

    #[test]
    fn test_8bit_2x2_layout() {
        let img = encode_8bit(&test_card(), 2, 2).unwrap();

        // 54 header + 1024 palette + row_size(4) * 2.
        assert_eq!(img.bytes.len(), 1086);
        assert_eq!(read_u32(&img.bytes, 2), 1086); // File size
        assert_eq!(read_u32(&img.bytes, 10), 1078); // Pixel data offset
        assert_eq!(read_u16(&img.bytes, 28), 8); // Bits per pixel
        assert_eq!(read_u32(&img.bytes, 34), 8); // Pixel array size
        assert_eq!(read_u32(&img.bytes, 46), 256); // Colors in palette
        assert_eq!(read_u32(&img.bytes, 50), 256); // Important colors

        // The saturated primaries land on their 6x7x6 anchor entries:
        // red = bucket (5,0,0) = entry 210, green = (0,6,0) = 36,
        // blue = (0,0,5) = 5, white = (5,6,5) = 251.
        assert_eq!(img.bytes[1078], 210);
        assert_eq!(img.bytes[1079], 36);
        // Row padding.
        assert_eq!(&img.bytes[1080..1082], &[0, 0]);
        assert_eq!(img.bytes[1082], 5);
        assert_eq!(img.bytes[1083], 251);

        // Palette entry 210 holds red as B,G,R,0.
        let entry = 54 + 210 * 4;
        assert_eq!(&img.bytes[entry..entry + 4], &[0, 0, 255, 0]);
        // Entries past the 252 anchors are black.
        let entry = 54 + 252 * 4;
        assert_eq!(&img.bytes[entry..entry + 4], &[0, 0, 0, 0]);
    }

    #[test]
    fn test_4bit_2x2_layout() {
        let img = encode_4bit(&test_card(), 2, 2, false).unwrap();

        // 54 header + 64 palette + row_size(4) * 2.
        assert_eq!(img.bytes.len(), 126);
        assert_eq!(read_u32(&img.bytes, 2), 126); // File size
        assert_eq!(read_u32(&img.bytes, 10), 118); // Pixel data offset
        assert_eq!(read_u16(&img.bytes, 28), 4); // Bits per pixel
        assert_eq!(read_u32(&img.bytes, 34), 8); // Pixel array size
        assert_eq!(read_u32(&img.bytes, 46), 16); // Colors in palette

        // Frequencies tie, so entries follow scan order: red, green, blue,
        // white. Palette entry 0 stores red as B,G,R,0.
        assert_eq!(&img.bytes[54..58], &[0, 0, 255, 0]);
        assert_eq!(&img.bytes[58..62], &[0, 255, 0, 0]);

        // Row 0 packs indices 0 and 1 into one byte, then pads to 4.
        assert_eq!(&img.bytes[118..122], &[0x01, 0, 0, 0]);
        // Row 1 packs indices 2 and 3.
        assert_eq!(&img.bytes[122..126], &[0x23, 0, 0, 0]);
    }

    #[test]
    fn test_4bit_odd_width_trailing_nibble_zero() {
        // Three pixels of one color: all indices 0, trailing nibble 0.
        let pixels = vec![255u8, 0, 0, 255].repeat(3);
        let img = encode_4bit(&pixels, 3, 1, false).unwrap();
        // row_size(4, 3) = 4; packed bytes = 2.
        assert_eq!(img.bytes.len(), 54 + 64 + 4);
        assert_eq!(&img.bytes[118..122], &[0x00, 0x00, 0, 0]);
    }

    #[test]
    fn test_all_transparent_image_encodes_to_index_zero() {
        let pixels = vec![255u8, 128, 64, 0].repeat(4);

        let img = encode_8bit(&pixels, 2, 2).unwrap();
        assert!(img.bytes[1078..].iter().all(|&b| b == 0));

        let img = encode_4bit(&pixels, 2, 2, false).unwrap();
        assert!(img.bytes[118..].iter().all(|&b| b == 0));

        // Truecolor ignores alpha entirely and must not fail either.
        let img = encode_truecolor(&pixels, 2, 2).unwrap();
        assert_eq!(&img.bytes[54..57], &[64, 128, 255]);
    }

    #[test]
    fn test_encode_dispatch_matches_direct_calls() {
        let pixels = test_card();
        let direct = encode_4bit(&pixels, 2, 2, true).unwrap();
        let dispatched = encode(&pixels, 2, 2, ColorDepth::Palette16, true).unwrap();
        assert_eq!(direct, dispatched);

        let direct = encode_truecolor(&pixels, 2, 2).unwrap();
        let dispatched = encode(&pixels, 2, 2, ColorDepth::Truecolor, false).unwrap();
        assert_eq!(direct, dispatched);
    }

    #[test]
    fn test_zero_dimensions_rejected() {
        assert!(matches!(
            encode_truecolor(&[], 0, 10),
            Err(EncodeError::InvalidDimensions { .. })
        ));
        assert!(matches!(
            encode_8bit(&[], 10, 0),
            Err(EncodeError::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn test_pixel_limit_rejected() {
        // 50_000 * 5_001 = 250_050_000 > MAX_PIXELS. The buffer is not
        // inspected once the dimensions fail.
        assert!(matches!(
            encode_truecolor(&[], 50_000, 5_001),
            Err(EncodeError::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn test_buffer_length_mismatch_rejected() {
        let pixels = vec![0u8; 3 * 4]; // one row short
        let result = encode_4bit(&pixels, 2, 2, false);
        assert!(matches!(
            result,
            Err(EncodeError::BufferLengthMismatch {
                expected: 16,
                actual: 12
            })
        ));
    }

    #[test]
    fn test_error_display() {
        let err = EncodeError::UnsupportedDepth(16);
        assert_eq!(
            err.to_string(),
            "Unsupported color depth: 16 bits per pixel (supported: 24, 8, 4)"
        );
    }

    #[test]
    fn test_encode_deterministic() {
        let pixels: Vec<u8> = (0..6 * 4 * 4).map(|i| (i * 41 % 256) as u8).collect();
        for depth in [ColorDepth::Truecolor, ColorDepth::Palette256, ColorDepth::Palette16] {
            let a = encode(&pixels, 6, 4, depth, true).unwrap();
            let b = encode(&pixels, 6, 4, depth, true).unwrap();
            assert_eq!(a, b);
        }
    }

    // Round-trips against the `image` crate's independent BMP reader.

    #[test]
    fn test_truecolor_roundtrip_with_standard_reader() {
        let img = encode_truecolor(&test_card(), 2, 2).unwrap();
        let decoded = image::load_from_memory_with_format(&img.bytes, image::ImageFormat::Bmp)
            .expect("standard reader must accept our output")
            .to_rgb8();

        assert_eq!(decoded.dimensions(), (2, 2));
        assert_eq!(decoded.get_pixel(0, 0), &image::Rgb([255, 0, 0]));
        assert_eq!(decoded.get_pixel(1, 0), &image::Rgb([0, 255, 0]));
        assert_eq!(decoded.get_pixel(0, 1), &image::Rgb([0, 0, 255]));
        assert_eq!(decoded.get_pixel(1, 1), &image::Rgb([255, 255, 255]));
    }

    #[test]
    fn test_8bit_roundtrip_with_standard_reader() {
        // Saturated primaries survive 8-bit quantization exactly, so the
        // decoded pixels must equal the originals.
        let img = encode_8bit(&test_card(), 2, 2).unwrap();
        let decoded = image::load_from_memory_with_format(&img.bytes, image::ImageFormat::Bmp)
            .expect("standard reader must accept our output")
            .to_rgb8();

        assert_eq!(decoded.dimensions(), (2, 2));
        assert_eq!(decoded.get_pixel(0, 0), &image::Rgb([255, 0, 0]));
        assert_eq!(decoded.get_pixel(1, 1), &image::Rgb([255, 255, 255]));
    }

    #[test]
    fn test_4bit_roundtrip_with_standard_reader() {
        let img = encode_4bit(&test_card(), 2, 2, false).unwrap();
        let decoded = image::load_from_memory_with_format(&img.bytes, image::ImageFormat::Bmp)
            .expect("standard reader must accept our output")
            .to_rgb8();

        assert_eq!(decoded.dimensions(), (2, 2));
        assert_eq!(decoded.get_pixel(0, 0), &image::Rgb([255, 0, 0]));
        assert_eq!(decoded.get_pixel(1, 0), &image::Rgb([0, 255, 0]));
    }

    #[test]
    fn test_odd_width_roundtrip_with_standard_reader() {
        let pixels: Vec<u8> = (0..5 * 3 * 4).map(|i| (i * 19 % 256) as u8).collect();
        for depth in [ColorDepth::Truecolor, ColorDepth::Palette256, ColorDepth::Palette16] {
            let img = encode(&pixels, 5, 3, depth, false).unwrap();
            let decoded =
                image::load_from_memory_with_format(&img.bytes, image::ImageFormat::Bmp)
                    .expect("standard reader must accept our output")
                    .to_rgb8();
            assert_eq!(decoded.dimensions(), (5, 3));
        }
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================
