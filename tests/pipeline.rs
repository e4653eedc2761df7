//! End-to-end pipeline runs over synthetic chart images with mock
//! collaborators, asserting on the composed report.

use anyhow::bail;
use async_trait::async_trait;
use image::{GrayImage, Rgb, RgbImage};
use std::io::Cursor;
use std::sync::Arc;

use chartsight::{
    report, AnalyzerConfig, ChartAnalyzer, ChartImage, ChartRequest, ConfluenceVerdict,
    NarrationRequest, NarratorError, TextRecognizer, TimeframeHint, VisionNarrator,
};

fn solid_chart(color: Rgb<u8>) -> ChartImage {
    let img = RgbImage::from_pixel(24, 24, color);
    let mut bytes = Vec::new();
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .unwrap();
    ChartImage::from_bytes(bytes).unwrap()
}

struct ScriptedRecognizer(&'static str);

impl TextRecognizer for ScriptedRecognizer {
    fn recognize(&self, _image: &GrayImage) -> anyhow::Result<String> {
        Ok(self.0.to_string())
    }
}

struct BrokenRecognizer;

impl TextRecognizer for BrokenRecognizer {
    fn recognize(&self, _image: &GrayImage) -> anyhow::Result<String> {
        bail!("tesseract binary missing")
    }
}

struct ScriptedNarrator(&'static str);

#[async_trait]
impl VisionNarrator for ScriptedNarrator {
    async fn narrate(&self, _request: &NarrationRequest) -> Result<String, NarratorError> {
        Ok(self.0.to_string())
    }
}

struct OfflineNarrator;

#[async_trait]
impl VisionNarrator for OfflineNarrator {
    async fn narrate(&self, _request: &NarrationRequest) -> Result<String, NarratorError> {
        Err(NarratorError::AllDeclined {
            candidates: "llava:7b, llava-phi, mistral".to_string(),
        })
    }
}

#[tokio::test]
async fn multi_timeframe_run_end_to_end() {
    let analyzer = ChartAnalyzer::new(
        AnalyzerConfig::default(),
        Arc::new(ScriptedRecognizer(
            "EURUSD TradingView 1.08543 1.08601 1.08522 4h",
        )),
        Arc::new(ScriptedNarrator("uptrend with mostly green candles")),
    );

    let analysis = analyzer
        .analyze_multi_timeframe(
            solid_chart(Rgb([0, 200, 0])),
            solid_chart(Rgb([0, 200, 0])),
            solid_chart(Rgb([200, 0, 0])),
        )
        .await;

    assert_eq!(analysis.confluence, Some(ConfluenceVerdict::ModerateBullish));
    assert_eq!(analysis.results.len(), 3);

    // Slot labels win over the 4h token in the OCR text.
    let labels: Vec<_> = analysis.results.iter().map(|r| r.label.as_str()).collect();
    assert_eq!(labels, vec!["1D", "4H", "15m"]);

    // Deterministic extraction is identical per chart (same OCR text).
    for result in &analysis.results {
        assert_eq!(result.fields.asset, "EURUSD");
        assert_eq!(result.fields.platform, "TradingView");
        let prices = result.fields.prices.as_ref().unwrap();
        assert_eq!(prices.current, "1.08522");
        assert_eq!(prices.change, "-0.00021");
    }

    let report = report::render(&analysis);
    assert!(report.contains("MODERATE BULLISH CONFLUENCE (2/3)"));
    assert!(report.contains("- **Asset**: EURUSD"));
    assert!(report.contains("### 1D"));
    assert!(report.contains("### 4H"));
    assert!(report.contains("### 15m"));
    assert!(report.contains("EDUCATIONAL purposes ONLY"));
}

#[tokio::test]
async fn offline_collaborators_still_produce_a_full_report() {
    // Both external collaborators down: the report must still render with
    // placeholders and the color bias intact.
    let analyzer = ChartAnalyzer::new(
        AnalyzerConfig::default(),
        Arc::new(BrokenRecognizer),
        Arc::new(OfflineNarrator),
    );

    let analysis = analyzer
        .analyze(vec![ChartRequest {
            image: solid_chart(Rgb([200, 0, 0])),
            timeframe: TimeframeHint::Auto,
        }])
        .await;

    let result = &analysis.results[0];
    assert!(result.ocr_text.starts_with("OCR error:"));
    assert_eq!(result.fields.asset, "Unknown");
    assert_eq!(result.color.unwrap().red_pct, 100.0);
    assert!(result.narrative.contains("Vision analysis unavailable"));

    let report = report::render(&analysis);
    assert!(report.contains("- **Asset**: Unknown"));
    assert!(report.contains("BEARISH"));
    assert!(report.contains("ollama pull llava:7b"));
}

#[tokio::test]
async fn grayscale_chart_reports_colors_not_detected() {
    let analyzer = ChartAnalyzer::new(
        AnalyzerConfig::default(),
        Arc::new(ScriptedRecognizer("GBP 1h")),
        Arc::new(ScriptedNarrator("flat, no clear direction")),
    );

    let analysis = analyzer
        .analyze(vec![ChartRequest {
            image: solid_chart(Rgb([128, 128, 128])),
            timeframe: TimeframeHint::Auto,
        }])
        .await;

    assert!(analysis.results[0].color.is_none());
    let report = report::render(&analysis);
    assert!(report.contains("Colors not detected."));
    assert!(report.contains("- **Asset**: GBPUSD"));
    assert!(report.contains("- **Timeframe**: 1h"));
}
