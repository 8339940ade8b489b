//! Shared test utilities for the fedimage test suite.
//!
//! Every fixture is synthesized in memory so tests never depend on files on
//! disk. Patterns are deterministic: pixel `(x, y)` of a gradient fixture is
//! `[x % 256, y % 256, 128]`.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let bytes = png_bytes(40, 30);
//! let handle = ImageHandle::new(&bytes, "image/png", "a.png", &EncodeSettings::default());
//! assert_eq!(handle.width(), 40);
//! ```

use image::codecs::gif::{GifEncoder, Repeat};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::webp::WebPEncoder;
use image::{Delay, DynamicImage, Frame, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use std::io::Cursor;

// =========================================================================
// Pixel fixtures
// =========================================================================

/// RGB gradient image.
pub fn gradient(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| Rgb([(x % 256) as u8, (y % 256) as u8, 128]))
}

fn encode(image: &DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    image.write_to(&mut out, format).unwrap();
    out.into_inner()
}

// =========================================================================
// Encoded fixtures
// =========================================================================

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    encode(&DynamicImage::ImageRgb8(gradient(width, height)), ImageFormat::Png)
}

/// PNG filled with a single opaque color.
pub fn flat_png_bytes(width: u32, height: u32, color: [u8; 3]) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, Rgb(color));
    encode(&DynamicImage::ImageRgb8(img), ImageFormat::Png)
}

pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    let mut out = Vec::new();
    DynamicImage::ImageRgb8(gradient(width, height))
        .write_with_encoder(JpegEncoder::new_with_quality(&mut out, 90))
        .unwrap();
    out
}

pub fn bmp_bytes(width: u32, height: u32) -> Vec<u8> {
    encode(&DynamicImage::ImageRgb8(gradient(width, height)), ImageFormat::Bmp)
}

pub fn webp_bytes(width: u32, height: u32) -> Vec<u8> {
    let mut out = Vec::new();
    DynamicImage::ImageRgb8(gradient(width, height))
        .write_with_encoder(WebPEncoder::new_lossless(&mut out))
        .unwrap();
    out
}

/// Solid frame colors used by the animated fixtures: red, green, blue.
const COLORS: [[u8; 4]; 3] = [[255, 0, 0, 255], [0, 255, 0, 255], [0, 0, 255, 255]];

fn frame_color(i: usize) -> [u8; 4] {
    COLORS[i % COLORS.len()]
}

/// Animated GIF whose frames are solid red, green, blue, ... in turn.
pub fn animated_gif_bytes(width: u32, height: u32, frames: usize) -> Vec<u8> {
    let mut out = Vec::new();
    {
        let mut encoder = GifEncoder::new(&mut out);
        encoder.set_repeat(Repeat::Infinite).unwrap();
        let frames = (0..frames).map(|i| {
            let buffer = RgbaImage::from_pixel(width, height, Rgba(frame_color(i)));
            Frame::from_parts(buffer, 0, 0, Delay::from_numer_denom_ms(100, 1))
        });
        encoder.encode_frames(frames).unwrap();
    }
    out
}

/// APNG with the same red, green, blue frame sequence, 100ms per frame.
pub fn apng_bytes(width: u32, height: u32, frames: usize) -> Vec<u8> {
    let mut out = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut out, width, height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        encoder.set_animated(frames as u32, 0).unwrap();
        encoder.set_frame_delay(1, 10).unwrap();
        let mut writer = encoder.write_header().unwrap();
        for i in 0..frames {
            let frame = RgbaImage::from_pixel(width, height, Rgba(frame_color(i)));
            writer.write_image_data(frame.as_raw()).unwrap();
        }
        writer.finish().unwrap();
    }
    out
}

/// Append a RIFF chunk, padded to an even length.
fn push_chunk(out: &mut Vec<u8>, tag: &[u8; 4], payload: &[u8]) {
    out.extend_from_slice(tag);
    out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    out.extend_from_slice(payload);
    if payload.len() % 2 == 1 {
        out.push(0);
    }
}

fn push_u24(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_le_bytes()[..3]);
}

/// The `VP8L` chunk payload of a lossless still WebP.
fn vp8l_payload(image: &RgbaImage) -> Vec<u8> {
    let mut still = Vec::new();
    DynamicImage::ImageRgba8(image.clone())
        .write_with_encoder(WebPEncoder::new_lossless(&mut still))
        .unwrap();

    // RIFF <size> WEBP, then chunks
    let mut pos = 12;
    while pos + 8 <= still.len() {
        let len = u32::from_le_bytes(still[pos + 4..pos + 8].try_into().unwrap()) as usize;
        if &still[pos..pos + 4] == b"VP8L" {
            return still[pos + 8..pos + 8 + len].to_vec();
        }
        pos += 8 + len + len % 2;
    }
    panic!("lossless WebP without a VP8L chunk");
}

/// Animated WebP (VP8X + ANIM + one ANMF per frame) with the red, green,
/// blue frame sequence, 100ms per frame, every frame covering the canvas.
pub fn animated_webp_bytes(width: u32, height: u32, frames: usize) -> Vec<u8> {
    let mut body = b"WEBP".to_vec();

    let mut vp8x = vec![0x10 | 0x02, 0, 0, 0]; // alpha + animation
    push_u24(&mut vp8x, width - 1);
    push_u24(&mut vp8x, height - 1);
    push_chunk(&mut body, b"VP8X", &vp8x);

    // Transparent background, loop forever
    push_chunk(&mut body, b"ANIM", &[0, 0, 0, 0, 0, 0]);

    for i in 0..frames {
        let frame = RgbaImage::from_pixel(width, height, Rgba(frame_color(i)));
        let mut anmf = Vec::new();
        push_u24(&mut anmf, 0); // x offset / 2
        push_u24(&mut anmf, 0); // y offset / 2
        push_u24(&mut anmf, width - 1);
        push_u24(&mut anmf, height - 1);
        push_u24(&mut anmf, 100);
        anmf.push(0x02); // no blending, no disposal
        push_chunk(&mut anmf, b"VP8L", &vp8l_payload(&frame));
        push_chunk(&mut body, b"ANMF", &anmf);
    }

    let mut out = b"RIFF".to_vec();
    out.extend_from_slice(&(body.len() as u32).to_le_bytes());
    out.extend_from_slice(&body);
    out
}

/// The classic 1x1 GIF89a: a global palette, one image block and no
/// graphic control extension.
pub fn minimal_gif_bytes() -> Vec<u8> {
    vec![
        0x47, 0x49, 0x46, 0x38, 0x39, 0x61, // GIF89a
        0x01, 0x00, 0x01, 0x00, // 1x1
        0x80, 0x00, 0x00, // global color table, 2 entries
        0xFF, 0xFF, 0xFF, 0x00, 0x00, 0x00, // white, black
        0x2C, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x01, 0x00, 0x00, // image descriptor
        0x02, 0x02, 0x44, 0x01, 0x00, // LZW data
        0x3B, // trailer
    ]
}

/// JPEG gradient with an EXIF APP1 segment carrying `orientation`.
pub fn jpeg_with_orientation(width: u32, height: u32, orientation: u16) -> Vec<u8> {
    let jpeg = jpeg_bytes(width, height);

    // Big-endian TIFF with a single IFD entry: Orientation (0x0112), SHORT, count 1.
    let mut tiff = Vec::new();
    tiff.extend_from_slice(b"MM\x00\x2A");
    tiff.extend_from_slice(&8u32.to_be_bytes());
    tiff.extend_from_slice(&1u16.to_be_bytes());
    tiff.extend_from_slice(&0x0112u16.to_be_bytes());
    tiff.extend_from_slice(&3u16.to_be_bytes());
    tiff.extend_from_slice(&1u32.to_be_bytes());
    tiff.extend_from_slice(&orientation.to_be_bytes());
    tiff.extend_from_slice(&[0, 0]);
    tiff.extend_from_slice(&0u32.to_be_bytes());

    let mut app1 = vec![0xFF, 0xE1];
    let len = (2 + 6 + tiff.len()) as u16;
    app1.extend_from_slice(&len.to_be_bytes());
    app1.extend_from_slice(b"Exif\x00\x00");
    app1.extend_from_slice(&tiff);

    let mut out = Vec::with_capacity(jpeg.len() + app1.len());
    out.extend_from_slice(&jpeg[..2]); // SOI
    out.extend_from_slice(&app1);
    out.extend_from_slice(&jpeg[2..]);
    out
}
