pub mod color_bias;
pub mod preprocess;

use anyhow::{Context, Result};
use image::RgbImage;

/// An uploaded chart screenshot: the decoded RGB bitmap plus the original
/// encoded bytes (the vision narrator consumes the encoded form verbatim).
///
/// Immutable once constructed. Preprocessing derives new buffers and never
/// writes back into this one.
#[derive(Debug, Clone)]
pub struct ChartImage {
    rgb: RgbImage,
    encoded: Vec<u8>,
}

impl ChartImage {
    /// Decode a PNG/JPEG byte buffer into a chart image.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        let rgb = image::load_from_memory(&bytes)
            .context("failed to decode chart image bytes")?
            .to_rgb8();
        Ok(Self { rgb, encoded: bytes })
    }

    pub fn width(&self) -> u32 {
        self.rgb.width()
    }

    pub fn height(&self) -> u32 {
        self.rgb.height()
    }

    pub fn rgb(&self) -> &RgbImage {
        &self.rgb
    }

    /// Original encoded bytes as received from the caller.
    pub fn encoded_bytes(&self) -> &[u8] {
        &self.encoded
    }
}
