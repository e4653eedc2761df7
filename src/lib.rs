pub mod config;
pub mod confluence;
pub mod extract;
pub mod imaging;
pub mod narrator;
pub mod ocr;
pub mod pipeline;
pub mod report;
pub mod timeframe;

pub use config::AnalyzerConfig;
pub use confluence::{confluence_verdict, ConfluenceVerdict};
pub use extract::{extract_fields, ExtractedFields, PriceStats};
pub use imaging::color_bias::{analyze_colors, BiasLabel, ColorBias, ColorBiasConfig};
pub use imaging::preprocess::{prepare_for_ocr, PreprocessConfig};
pub use imaging::ChartImage;
pub use narrator::{
    NarrationRequest, NarratorConfig, NarratorError, OllamaNarrator, VisionNarrator,
};
pub use ocr::{OcrConfig, TesseractRecognizer, TextRecognizer};
pub use pipeline::{Analysis, ChartAnalyzer, ChartRequest, TimeframeHint, TimeframeResult};
pub use timeframe::Timeframe;
