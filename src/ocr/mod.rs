//! Text recognition collaborator.
//!
//! The pipeline only depends on the [`TextRecognizer`] trait; the shipped
//! implementation hands the preprocessed bitmap to a locally installed
//! `tesseract` binary. Recognition runs in page segmentation mode 6 (uniform
//! block of text) with the default engine, which is what chart screenshots
//! respond to best.

use anyhow::{bail, Context, Result};
use image::GrayImage;
use std::process::Command;

/// Seam for the external OCR engine. Implementations must be cheap to share
/// across blocking tasks.
pub trait TextRecognizer: Send + Sync {
    /// Convert a preprocessed grayscale bitmap into raw text. An empty
    /// string is a valid result (nothing legible on the chart).
    fn recognize(&self, image: &GrayImage) -> Result<String>;
}

#[derive(Debug, Clone)]
pub struct OcrConfig {
    /// Name or path of the tesseract executable.
    pub binary: String,
    pub language: String,
    /// Page segmentation mode. 6 = assume a single uniform block of text.
    pub psm: u8,
    /// Engine mode. 3 = default, based on what is available.
    pub oem: u8,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            binary: "tesseract".to_string(),
            language: "eng".to_string(),
            psm: 6,
            oem: 3,
        }
    }
}

/// OCR through the tesseract CLI. The bitmap travels through a scoped
/// temporary file that is removed when the guard drops, also on error paths.
pub struct TesseractRecognizer {
    config: OcrConfig,
}

impl TesseractRecognizer {
    pub fn new(config: OcrConfig) -> Self {
        Self { config }
    }

    /// Arguments passed to the binary, input path first.
    fn command_args(&self, input_path: &str) -> Vec<String> {
        vec![
            input_path.to_string(),
            "stdout".to_string(),
            "-l".to_string(),
            self.config.language.clone(),
            "--psm".to_string(),
            self.config.psm.to_string(),
            "--oem".to_string(),
            self.config.oem.to_string(),
        ]
    }

    /// Probe whether the binary is runnable at all. Returns the version
    /// banner line on success.
    pub fn probe(&self) -> Result<String> {
        let output = Command::new(&self.config.binary)
            .arg("--version")
            .output()
            .with_context(|| format!("failed to spawn `{} --version`", self.config.binary))?;
        if !output.status.success() {
            bail!("`{} --version` exited with {}", self.config.binary, output.status);
        }
        // Tesseract prints the version banner on stderr.
        let banner = if output.stderr.is_empty() {
            String::from_utf8_lossy(&output.stdout).to_string()
        } else {
            String::from_utf8_lossy(&output.stderr).to_string()
        };
        Ok(banner.lines().next().unwrap_or_default().to_string())
    }
}

impl TextRecognizer for TesseractRecognizer {
    fn recognize(&self, image: &GrayImage) -> Result<String> {
        let file = tempfile::Builder::new()
            .prefix("chartsight-ocr-")
            .suffix(".png")
            .tempfile()
            .context("failed to create temp file for OCR input")?;
        image
            .save_with_format(file.path(), image::ImageFormat::Png)
            .context("failed to write OCR input image")?;

        let path = file.path().to_string_lossy().to_string();
        let output = Command::new(&self.config.binary)
            .args(self.command_args(&path))
            .output()
            .with_context(|| format!("failed to spawn `{}`", self.config.binary))?;

        if !output.status.success() {
            bail!(
                "tesseract exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}
