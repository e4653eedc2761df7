//! The analysis pipeline.
//!
//! One parameterized path for both modes: each chart goes through
//! preprocess, OCR, field extraction, color classification and narration;
//! runs with more than one chart additionally get a confluence verdict and a
//! cross-timeframe synthesis. Charts are processed sequentially because the
//! narrator serializes on a single local inference resource.
//!
//! Degradation policy: a failing stage never aborts the run. OCR failures
//! become placeholder text (field extraction then falls back to defaults),
//! an undetectable color bias stays `None`, and narrator failures become a
//! placeholder narrative with a remediation hint. The worst outcome is a
//! report with degraded sections, never an error to the caller.

use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

use crate::config::AnalyzerConfig;
use crate::confluence::{confluence_verdict, ConfluenceVerdict};
use crate::extract::{extract_fields, ExtractedFields};
use crate::imaging::color_bias::{analyze_colors, ColorBias};
use crate::imaging::preprocess::prepare_for_ocr;
use crate::imaging::ChartImage;
use crate::narrator::prompts::{chart_prompt, synthesis_prompt, STANDALONE_ROLE};
use crate::narrator::{NarrationRequest, NarratorError, VisionNarrator};
use crate::ocr::TextRecognizer;
use crate::timeframe::Timeframe;

/// Placeholder used when recognition succeeds but finds nothing.
pub const OCR_EMPTY_PLACEHOLDER: &str = "OCR: no text detected";

/// How the timeframe for a chart is determined.
#[derive(Debug, Clone)]
pub enum TimeframeHint {
    /// Scan the OCR text for a timeframe token.
    Auto,
    /// Use this label verbatim, no scanning.
    Forced(String),
    /// A known multi-timeframe slot: forces the label and gives the
    /// narrator its role description.
    Known(Timeframe),
}

/// One chart to analyze.
#[derive(Debug, Clone)]
pub struct ChartRequest {
    pub image: ChartImage,
    pub timeframe: TimeframeHint,
}

/// Everything the pipeline derived from one chart. Immutable once built,
/// discarded at the end of the run.
#[derive(Debug, Clone, Serialize)]
pub struct TimeframeResult {
    /// Resolved timeframe label for this slot (forced, known, or extracted).
    pub label: String,
    /// Raw recognizer output, or a placeholder when recognition degraded.
    pub ocr_text: String,
    pub fields: ExtractedFields,
    pub color: Option<ColorBias>,
    pub narrative: String,
}

/// Outcome of a full run. `confluence` and `synthesis` are present only for
/// multi-chart runs.
#[derive(Debug, Clone, Serialize)]
pub struct Analysis {
    pub results: Vec<TimeframeResult>,
    pub confluence: Option<ConfluenceVerdict>,
    pub synthesis: Option<String>,
}

pub struct ChartAnalyzer {
    config: AnalyzerConfig,
    recognizer: Arc<dyn TextRecognizer>,
    narrator: Arc<dyn VisionNarrator>,
}

impl ChartAnalyzer {
    pub fn new(
        config: AnalyzerConfig,
        recognizer: Arc<dyn TextRecognizer>,
        narrator: Arc<dyn VisionNarrator>,
    ) -> Self {
        Self {
            config,
            recognizer,
            narrator,
        }
    }

    /// Analyze one or many charts. Multi-chart runs get a confluence verdict
    /// and a synthesis narration on top of the per-chart results.
    pub async fn analyze(&self, charts: Vec<ChartRequest>) -> Analysis {
        let multi = charts.len() > 1;
        let mut results = Vec::with_capacity(charts.len());
        for chart in charts {
            results.push(self.analyze_chart(chart).await);
        }

        if !multi {
            return Analysis {
                results,
                confluence: None,
                synthesis: None,
            };
        }

        let biases: Vec<_> = results.iter().map(|r| r.color.map(|c| c.bias)).collect();
        let verdict = confluence_verdict(&biases);

        let sections: Vec<_> = results
            .iter()
            .map(|r| (r.label.clone(), r.narrative.clone(), r.color))
            .collect();
        let request = NarrationRequest {
            prompt: synthesis_prompt(&sections),
            image: None,
            max_tokens: self.config.synthesis_narration_tokens,
        };
        let synthesis_started = Instant::now();
        let synthesis = match self.narrator.narrate(&request).await {
            Ok(text) => text,
            Err(err) => {
                log::warn!(
                    "synthesis narration failed after {}ms: {err}",
                    synthesis_started.elapsed().as_millis()
                );
                narration_placeholder(&err)
            }
        };

        Analysis {
            results,
            confluence: Some(verdict),
            synthesis: Some(synthesis),
        }
    }

    /// Convenience wrapper for the three-chart multi-timeframe run, slots in
    /// fixed order: daily, 4-hour, 15-minute.
    pub async fn analyze_multi_timeframe(
        &self,
        daily: ChartImage,
        four_hour: ChartImage,
        fifteen_min: ChartImage,
    ) -> Analysis {
        let charts = vec![
            ChartRequest {
                image: daily,
                timeframe: TimeframeHint::Known(Timeframe::Daily),
            },
            ChartRequest {
                image: four_hour,
                timeframe: TimeframeHint::Known(Timeframe::FourHour),
            },
            ChartRequest {
                image: fifteen_min,
                timeframe: TimeframeHint::Known(Timeframe::FifteenMin),
            },
        ];
        self.analyze(charts).await
    }

    async fn analyze_chart(&self, chart: ChartRequest) -> TimeframeResult {
        let started = Instant::now();
        let (forced_label, role) = match &chart.timeframe {
            TimeframeHint::Auto => (None, STANDALONE_ROLE),
            TimeframeHint::Forced(label) => (Some(label.clone()), STANDALONE_ROLE),
            TimeframeHint::Known(tf) => (Some(tf.label().to_string()), tf.role()),
        };

        let image = Arc::new(chart.image);

        // Preprocess + OCR are CPU-bound; keep them off the async runtime.
        let ocr_started = Instant::now();
        let ocr_outcome = tokio::task::spawn_blocking({
            let image = Arc::clone(&image);
            let recognizer = Arc::clone(&self.recognizer);
            let preprocess = self.config.preprocess.clone();
            move || {
                let prepared = prepare_for_ocr(&image, &preprocess);
                recognizer.recognize(&prepared)
            }
        })
        .await;
        let ocr_ms = ocr_started.elapsed().as_millis();

        let ocr_text = match ocr_outcome {
            Ok(Ok(text)) if !text.trim().is_empty() => {
                log::info!("OCR completed: {} chars in {ocr_ms}ms", text.len());
                text
            }
            Ok(Ok(_)) => {
                log::warn!("OCR found no text after {ocr_ms}ms");
                OCR_EMPTY_PLACEHOLDER.to_string()
            }
            Ok(Err(err)) => {
                log::warn!("OCR failed after {ocr_ms}ms: {err:#}");
                format!("OCR error: {err}")
            }
            Err(err) => {
                log::warn!("OCR worker join failed: {err}");
                format!("OCR error: {err}")
            }
        };

        let fields = extract_fields(&ocr_text, forced_label.as_deref());
        let label = fields.timeframe.clone();

        let color_started = Instant::now();
        let color = tokio::task::spawn_blocking({
            let image = Arc::clone(&image);
            let config = self.config.color.clone();
            move || analyze_colors(&image, &config)
        })
        .await
        .unwrap_or_else(|err| {
            log::warn!("color analysis worker join failed: {err}");
            None
        });
        let color_ms = color_started.elapsed().as_millis();

        let narration_started = Instant::now();
        let request = NarrationRequest {
            prompt: chart_prompt(&label, role),
            image: Some(image.encoded_bytes().to_vec()),
            max_tokens: self.config.chart_narration_tokens,
        };
        let narrative = match self.narrator.narrate(&request).await {
            Ok(text) => text,
            Err(err) => {
                log::warn!(
                    "narration failed for {label} after {}ms: {err}",
                    narration_started.elapsed().as_millis()
                );
                narration_placeholder(&err)
            }
        };
        let narration_ms = narration_started.elapsed().as_millis();

        log::info!(
            "chart {label} analyzed in {}ms (ocr: {ocr_ms}ms, color: {color_ms}ms, narration: {narration_ms}ms)",
            started.elapsed().as_millis()
        );

        TimeframeResult {
            label,
            ocr_text,
            fields,
            color,
            narrative,
        }
    }
}

/// Placeholder narrative substituted when every narrator candidate fails.
/// Keeps the deterministic results renderable and tells the user what to fix.
fn narration_placeholder(err: &NarratorError) -> String {
    format!(
        "Vision analysis unavailable ({err}). Check that the Ollama server is \
         running and that a vision model is pulled, e.g. `ollama pull llava:7b`."
    )
}
