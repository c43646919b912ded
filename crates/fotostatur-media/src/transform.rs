//! Resize and grayscale transform.

use std::fmt;
use std::io::Cursor;
use std::str::FromStr;

use image::imageops::FilterType;
use image::{ImageFormat, ImageOutputFormat};
use tracing::debug;

use crate::error::{MediaError, MediaResult};

/// JPEG quality used when re-encoding JPEG input.
pub const JPEG_QUALITY: u8 = 90;

/// Transform applied to an accepted image before it is published.
pub trait ImageTransform: Send + Sync {
    /// Resize `data` to the `width`x`height` box and convert it to grayscale.
    fn resize_and_grayscale(&self, data: &[u8], width: u32, height: u32) -> MediaResult<Vec<u8>>;
}

/// How the image is fitted into the target box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResizeMode {
    /// Stretch to exactly the box dimensions
    #[default]
    Exact,
    /// Scale to fit inside the box, keeping the aspect ratio
    Fit,
}

impl FromStr for ResizeMode {
    type Err = MediaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "exact" => Ok(Self::Exact),
            "fit" => Ok(Self::Fit),
            other => Err(MediaError::InvalidResizeMode(other.to_string())),
        }
    }
}

impl fmt::Display for ResizeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResizeMode::Exact => f.write_str("exact"),
            ResizeMode::Fit => f.write_str("fit"),
        }
    }
}

/// [`ImageTransform`] backed by the `image` crate.
///
/// JPEG input stays JPEG; every other format is re-encoded as PNG.
#[derive(Debug, Clone, Default)]
pub struct GrayscaleResizer {
    mode: ResizeMode,
}

impl GrayscaleResizer {
    pub fn new(mode: ResizeMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> ResizeMode {
        self.mode
    }
}

impl ImageTransform for GrayscaleResizer {
    fn resize_and_grayscale(&self, data: &[u8], width: u32, height: u32) -> MediaResult<Vec<u8>> {
        if width == 0 || height == 0 {
            return Err(MediaError::InvalidDimensions { width, height });
        }

        let input_format = image::guess_format(data).map_err(|e| MediaError::decode(e.to_string()))?;
        let img = image::load_from_memory_with_format(data, input_format)
            .map_err(|e| MediaError::decode(e.to_string()))?;

        let resized = match self.mode {
            ResizeMode::Exact => img.resize_exact(width, height, FilterType::Lanczos3),
            ResizeMode::Fit => img.resize(width, height, FilterType::Lanczos3),
        };
        let gray = resized.grayscale();

        let output_format = match input_format {
            ImageFormat::Jpeg => ImageOutputFormat::Jpeg(JPEG_QUALITY),
            _ => ImageOutputFormat::Png,
        };

        let mut out = Vec::new();
        gray.write_to(&mut Cursor::new(&mut out), output_format)
            .map_err(|e| MediaError::encode(e.to_string()))?;

        debug!(
            input_bytes = data.len(),
            output_bytes = out.len(),
            width = gray.width(),
            height = gray.height(),
            "Resized image to grayscale"
        );

        Ok(out)
    }
}

/// MIME type for encoded image bytes, from their magic number.
pub fn content_type(data: &[u8]) -> &'static str {
    match image::guess_format(data) {
        Ok(ImageFormat::Jpeg) => "image/jpeg",
        Ok(ImageFormat::Png) => "image/png",
        Ok(ImageFormat::Gif) => "image/gif",
        Ok(ImageFormat::WebP) => "image/webp",
        Ok(ImageFormat::Bmp) => "image/bmp",
        _ => "application/octet-stream",
    }
}
