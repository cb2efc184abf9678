// src/services/transcoder.rs

//! Image transcoder: any supported raster format to a small square PNG.

use std::io::Cursor;

use image::DynamicImage;
use image::codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder};
use image::imageops::FilterType;

use crate::error::{AppError, Result};
use crate::models::TranscodeConfig;

/// Converts raw image payloads to a fixed-size PNG.
#[derive(Debug, Clone)]
pub struct Transcoder {
    size: u32,
    quality: u8,
}

impl Transcoder {
    pub fn new(config: &TranscodeConfig) -> Self {
        Self {
            size: config.size,
            quality: config.quality,
        }
    }

    /// Decode `bytes`, fill a `size`×`size` canvas and re-encode as PNG.
    ///
    /// The source is scaled to cover the canvas and centre-cropped.
    pub fn transcode(&self, bytes: &[u8]) -> Result<Vec<u8>> {
        let source = image::load_from_memory(bytes)
            .map_err(|e| AppError::transcode(format!("cannot decode image: {e}")))?;

        let resized = source.resize_to_fill(self.size, self.size, FilterType::Lanczos3);
        let rgba = DynamicImage::ImageRgba8(resized.to_rgba8());

        let mut png = Vec::new();
        let encoder =
            PngEncoder::new_with_quality(Cursor::new(&mut png), self.compression(), PngFilter::Adaptive);
        rgba.write_with_encoder(encoder)?;
        Ok(png)
    }

    /// PNG is lossless; quality only trades encode time against size.
    fn compression(&self) -> CompressionType {
        match self.quality {
            0..=50 => CompressionType::Best,
            90..=u8::MAX => CompressionType::Fast,
            _ => CompressionType::Default,
        }
    }
}

impl Default for Transcoder {
    fn default() -> Self {
        Self::new(&TranscodeConfig::default())
    }
}
