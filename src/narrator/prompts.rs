//! Prompt builders for the vision narrator.
//!
//! The prompts pin the model to visual observation only: no invented
//! numbers, no price levels, a fixed checklist per chart, and a one-word
//! directional signal at the end.

use crate::imaging::color_bias::ColorBias;

/// Per-chart analysis prompt. `role` describes what this view contributes to
/// a multi-timeframe read; single-chart runs pass a generic role.
pub fn chart_prompt(timeframe: &str, role: &str) -> String {
    format!(
        "Analyze this trading chart on the {timeframe} timeframe.\n\
         \n\
         Context: this chart shows the {timeframe} view. Its role in the analysis is: {role}.\n\
         \n\
         STRICT RULES:\n\
         - Describe ONLY what is visually present\n\
         - No invented numbers and no price levels\n\
         - Stay concise and factual\n\
         \n\
         Points to cover for the {timeframe}:\n\
         1. Trend: bullish, bearish or sideways?\n\
         2. Recent direction: what is the dominant visible move?\n\
         3. Structure: consolidation? impulse? breakout? range?\n\
         4. Candles: mostly green or mostly red?\n\
         5. Moving averages: direction of the EMA/MA lines if visible?\n\
         6. Momentum: strong or weak? accelerating?\n\
         7. {timeframe} signal in ONE WORD: BULLISH / BEARISH / NEUTRAL\n\
         \n\
         Keep it short and precise."
    )
}

/// Role used when a chart is analyzed on its own, outside a multi-timeframe
/// run.
pub const STANDALONE_ROLE: &str = "standalone technical review of a single chart";

/// Cross-timeframe synthesis prompt built from the three per-chart
/// narratives and their color biases.
pub fn synthesis_prompt(sections: &[(String, String, Option<ColorBias>)]) -> String {
    let mut prompt = String::from(
        "You are an expert technical analyst. Below are the analyses of different \
         timeframes for the same asset.\n",
    );

    for (timeframe, narrative, color) in sections {
        let bias = color
            .map(|c| c.bias.to_string())
            .unwrap_or_else(|| "N/A".to_string());
        prompt.push_str(&format!(
            "\n=== {timeframe} ANALYSIS ===\n{narrative}\nColor bias {timeframe}: {bias}\n"
        ));
    }

    prompt.push_str(
        "\nBased ONLY on these analyses, give your multi-timeframe synthesis:\n\
         \n\
         1. Timeframe alignment: do the timeframes point in the same direction?\n\
         2. Confluence: is the signal consistent across timeframes?\n\
         3. Global signal: BUY / SELL / WAIT\n\
         4. Signal strength: strong (3/3 aligned) / medium (2/3 aligned) / weak (1/3 or contradictory)\n\
         5. Recommendation: concise summary of the action to consider\n\
         \n\
         Reminder: this is for EDUCATIONAL use only, not investment advice.\n\
         \n\
         Stay concise and structured.",
    );

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::color_bias::{BiasLabel, ColorBias};

    #[test]
    fn chart_prompt_embeds_timeframe_and_role() {
        let prompt = chart_prompt("1D", "macro trend and overall market direction");
        assert!(prompt.contains("the 1D timeframe"));
        assert!(prompt.contains("macro trend"));
        assert!(prompt.contains("ONE WORD"));
    }

    #[test]
    fn synthesis_prompt_carries_every_section_and_bias() {
        let sections = vec![
            (
                "1D".to_string(),
                "daily looks strong".to_string(),
                Some(ColorBias {
                    green_pct: 80.0,
                    red_pct: 20.0,
                    bias: BiasLabel::Bullish,
                }),
            ),
            ("4H".to_string(), "choppy".to_string(), None),
        ];
        let prompt = synthesis_prompt(&sections);
        assert!(prompt.contains("=== 1D ANALYSIS ==="));
        assert!(prompt.contains("daily looks strong"));
        assert!(prompt.contains("Color bias 1D: BULLISH"));
        assert!(prompt.contains("Color bias 4H: N/A"));
        assert!(prompt.contains("BUY / SELL / WAIT"));
    }
}
