use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, RgbImage};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::error::Result;

const MIN_EDGE: u32 = 64;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct CompressOptions {
    pub max_size_bytes: usize,
    pub max_dimension: u32,
    pub initial_quality: u8,
    pub min_quality: u8,
    pub quality_step: u8,
}

impl Default for CompressOptions {
    fn default() -> Self {
        Self {
            max_size_bytes: 1024 * 1024,
            max_dimension: 1920,
            initial_quality: 85,
            min_quality: 40,
            quality_step: 10,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct CompressedImage {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub quality: u8,
}

impl CompressedImage {
    pub const MIME: &'static str = "image/jpeg";
}

pub fn compress(bytes: &[u8], options: &CompressOptions) -> Result<CompressedImage> {
    let decoded = image::load_from_memory(bytes)?;
    debug!(
        "Decoded screenshot {}x{} ({} bytes)",
        decoded.width(),
        decoded.height(),
        bytes.len()
    );

    let mut rgb = flatten_onto_white(fit_within(decoded, options.max_dimension.max(MIN_EDGE)));

    loop {
        let attempt = encode_with_budget(&rgb, options)?;
        if attempt.bytes.len() <= options.max_size_bytes {
            debug!(
                "Compressed to {}x{} q{} ({} bytes)",
                attempt.width,
                attempt.height,
                attempt.quality,
                attempt.bytes.len()
            );
            return Ok(attempt);
        }

        let longest = rgb.width().max(rgb.height());
        let next = longest * 3 / 4;
        if next < MIN_EDGE {
            warn!(
                "Could not get screenshot under {} bytes, sending {} bytes",
                options.max_size_bytes,
                attempt.bytes.len()
            );
            return Ok(attempt);
        }
        rgb = DynamicImage::ImageRgb8(rgb)
            .resize(next, next, FilterType::Triangle)
            .to_rgb8();
    }
}

/// Encodes at decreasing quality until the budget is met or `min_quality` is hit.
fn encode_with_budget(rgb: &RgbImage, options: &CompressOptions) -> Result<CompressedImage> {
    let min_quality = options.min_quality.clamp(1, 100);
    let step = options.quality_step.max(1);
    let mut quality = options.initial_quality.clamp(min_quality, 100);

    loop {
        let bytes = encode_jpeg(rgb, quality)?;
        if bytes.len() <= options.max_size_bytes || quality <= min_quality {
            return Ok(CompressedImage {
                bytes,
                width: rgb.width(),
                height: rgb.height(),
                quality,
            });
        }
        quality = quality.saturating_sub(step).max(min_quality);
    }
}

fn encode_jpeg(rgb: &RgbImage, quality: u8) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut out, quality);
    encoder.encode_image(rgb)?;
    Ok(out)
}

fn fit_within(img: DynamicImage, max_dimension: u32) -> DynamicImage {
    if img.width() <= max_dimension && img.height() <= max_dimension {
        img
    } else {
        img.resize(max_dimension, max_dimension, FilterType::Triangle)
    }
}

fn flatten_onto_white(img: DynamicImage) -> RgbImage {
    if !img.color().has_alpha() {
        return img.to_rgb8();
    }
    let rgba = img.to_rgba8();
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let blend = |c: u8| ((c as u16 * a as u16 + 255 * (255 - a as u16)) / 255) as u8;
        image::Rgb([blend(r), blend(g), blend(b)])
    })
}
