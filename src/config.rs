use crate::imaging::color_bias::ColorBiasConfig;
use crate::imaging::preprocess::PreprocessConfig;

/// Tunables for one analysis run. Collaborator-specific settings
/// ([`crate::ocr::OcrConfig`], [`crate::narrator::NarratorConfig`]) live with
/// their implementations; this struct covers the deterministic core.
#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    pub preprocess: PreprocessConfig,
    pub color: ColorBiasConfig,
    /// Generation cap for a per-chart narration.
    pub chart_narration_tokens: u32,
    /// Generation cap for the cross-timeframe synthesis.
    pub synthesis_narration_tokens: u32,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            preprocess: PreprocessConfig::default(),
            color: ColorBiasConfig::default(),
            chart_narration_tokens: 400,
            synthesis_narration_tokens: 500,
        }
    }
}
