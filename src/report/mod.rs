//! Markdown report assembly.
//!
//! The report is the only output of a run: identification fields, price
//! statistics, the color-bias table, narrative text and a fixed disclaimer.
//! Rendering is pure string composition over an [`Analysis`]; a degraded
//! analysis renders placeholders, never errors.

use chrono::Utc;

use crate::extract::UNKNOWN;
use crate::pipeline::{Analysis, TimeframeResult};

const DISCLAIMER: &str = "\
## DISCLAIMER

This analysis is for EDUCATIONAL purposes ONLY.
- It is NOT investment advice
- Validate with a human analyst before acting
- Markets are unpredictable";

/// Render the report for a single- or multi-chart analysis.
pub fn render(analysis: &Analysis) -> String {
    if analysis.results.len() > 1 {
        render_multi(analysis)
    } else {
        render_single(analysis)
    }
}

fn render_single(analysis: &Analysis) -> String {
    let Some(result) = analysis.results.first() else {
        return format!("# CHART ANALYSIS REPORT\n\nNo chart was analyzed.\n\n{DISCLAIMER}\n");
    };

    let mut out = String::from("# CHART ANALYSIS REPORT\n\n");
    out.push_str("## Identification\n");
    out.push_str(&format!("- **Asset**: {}\n", result.fields.asset));
    out.push_str(&format!("- **Timeframe**: {}\n", result.fields.timeframe));
    out.push_str(&format!("- **Platform**: {}\n", result.fields.platform));
    out.push_str(&format!("- **Analyzed**: {}\n", date_stamp()));

    out.push_str("\n## Price statistics\n");
    match &result.fields.prices {
        Some(prices) => {
            out.push_str(&format!("- **Current**: {}\n", prices.current));
            out.push_str(&format!("- **High**: {:.5}\n", prices.high));
            out.push_str(&format!("- **Low**: {:.5}\n", prices.low));
            out.push_str(&format!("- **Change**: {}\n", prices.change));
        }
        None => out.push_str("No forex-style quotes recognized.\n"),
    }

    out.push_str("\n## Color bias\n");
    match &result.color {
        Some(color) => {
            out.push_str(&format!(
                "**{}** (green {:.1}%, red {:.1}%)\n",
                color.bias, color.green_pct, color.red_pct
            ));
        }
        None => out.push_str("Colors not detected.\n"),
    }

    out.push_str("\n## Vision analysis\n");
    out.push_str(&result.narrative);
    out.push_str("\n\n");
    out.push_str(DISCLAIMER);
    out.push('\n');
    out
}

fn render_multi(analysis: &Analysis) -> String {
    let asset = first_known(&analysis.results, |r| &r.fields.asset);
    let platform = first_known(&analysis.results, |r| &r.fields.platform);
    let labels: Vec<&str> = analysis.results.iter().map(|r| r.label.as_str()).collect();

    let mut out = String::from("# MULTI-TIMEFRAME REPORT\n\n");
    out.push_str("## Identification\n");
    out.push_str(&format!("- **Asset**: {asset}\n"));
    out.push_str(&format!("- **Platform**: {platform}\n"));
    out.push_str(&format!("- **Analyzed**: {}\n", date_stamp()));
    out.push_str(&format!("- **Timeframes**: {}\n", labels.join(", ")));

    out.push_str("\n## Confluence signal (colors)\n");
    if let Some(verdict) = &analysis.confluence {
        out.push_str(&format!("**{verdict}**\n"));
    }
    out.push_str("\n| Timeframe | Color bias | Green | Red |\n");
    out.push_str("|-----------|------------|-------|-----|\n");
    for result in &analysis.results {
        match &result.color {
            Some(color) => out.push_str(&format!(
                "| {} | {} | {:.1}% | {:.1}% |\n",
                result.label, color.bias, color.green_pct, color.red_pct
            )),
            None => out.push_str(&format!(
                "| {} | not detected | 0.0% | 0.0% |\n",
                result.label
            )),
        }
    }

    if let Some(synthesis) = &analysis.synthesis {
        out.push_str("\n## Multi-timeframe synthesis\n");
        out.push_str(synthesis);
        out.push('\n');
    }

    out.push_str("\n## Timeframe details\n");
    for result in &analysis.results {
        out.push_str(&format!("\n### {}\n", result.label));
        out.push_str(&result.narrative);
        out.push('\n');
    }

    out.push('\n');
    out.push_str(DISCLAIMER);
    out.push('\n');
    out
}

/// First non-"Unknown" value across timeframes, scanning in slot order. The
/// asset may come from one chart and the platform from another.
fn first_known<'a>(
    results: &'a [TimeframeResult],
    field: impl Fn(&'a TimeframeResult) -> &'a str,
) -> &'a str {
    results
        .iter()
        .map(field)
        .find(|value| *value != UNKNOWN)
        .unwrap_or(UNKNOWN)
}

fn date_stamp() -> String {
    Utc::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::{ExtractedFields, PriceStats};
    use crate::imaging::color_bias::{BiasLabel, ColorBias};

    fn result(
        label: &str,
        asset: &str,
        platform: &str,
        color: Option<ColorBias>,
    ) -> TimeframeResult {
        TimeframeResult {
            label: label.to_string(),
            ocr_text: "raw".to_string(),
            fields: ExtractedFields {
                asset: asset.to_string(),
                timeframe: label.to_string(),
                platform: platform.to_string(),
                prices: None,
            },
            color,
            narrative: format!("{label} narrative"),
        }
    }

    fn bullish() -> Option<ColorBias> {
        Some(ColorBias {
            green_pct: 75.0,
            red_pct: 25.0,
            bias: BiasLabel::Bullish,
        })
    }

    #[test]
    fn single_report_renders_fields_and_disclaimer() {
        let mut tf = result("4h", "EURUSD", "TradingView", bullish());
        tf.fields.prices = Some(PriceStats {
            current: "1.08522".to_string(),
            high: 1.08601,
            low: 1.08522,
            change: "-0.00021".to_string(),
        });
        let analysis = Analysis {
            results: vec![tf],
            confluence: None,
            synthesis: None,
        };
        let report = render(&analysis);
        assert!(report.contains("# CHART ANALYSIS REPORT"));
        assert!(report.contains("- **Asset**: EURUSD"));
        assert!(report.contains("- **Current**: 1.08522"));
        assert!(report.contains("- **Change**: -0.00021"));
        assert!(report.contains("BULLISH"));
        assert!(report.contains("4h narrative"));
        assert!(report.contains("EDUCATIONAL purposes ONLY"));
    }

    #[test]
    fn single_report_surfaces_missing_color_as_not_detected() {
        let analysis = Analysis {
            results: vec![result("1h", "Unknown", "Unknown", None)],
            confluence: None,
            synthesis: None,
        };
        let report = render(&analysis);
        assert!(report.contains("Colors not detected."));
        assert!(report.contains("No forex-style quotes recognized."));
    }

    #[test]
    fn multi_report_scans_identification_fields_independently() {
        // Asset only readable on the 4H chart, platform only on the 15m:
        // the report combines them.
        let analysis = Analysis {
            results: vec![
                result("1D", "Unknown", "Unknown", bullish()),
                result("4H", "EURUSD", "Unknown", bullish()),
                result("15m", "Unknown", "TradingView", None),
            ],
            confluence: Some(crate::confluence::ConfluenceVerdict::ModerateBullish),
            synthesis: Some("aligned enough".to_string()),
        };
        let report = render(&analysis);
        assert!(report.contains("- **Asset**: EURUSD"));
        assert!(report.contains("- **Platform**: TradingView"));
        assert!(report.contains("MODERATE BULLISH CONFLUENCE (2/3)"));
        assert!(report.contains("| 15m | not detected | 0.0% | 0.0% |"));
        assert!(report.contains("aligned enough"));
        assert!(report.contains("### 1D"));
        assert!(report.contains("### 15m"));
    }
}
