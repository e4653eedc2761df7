//! Structured field extraction from raw OCR text.
//!
//! Deliberately best-effort: matching is case-sensitive substring/regex over
//! the noisy OCR output with fixed precedence, and no attempt is made to
//! correct misread characters. A text that matches nothing yields the
//! "Unknown" defaults rather than an error.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

pub const UNKNOWN: &str = "Unknown";

/// Timeframe tokens scanned for in priority order. Containment is raw
/// substring search, so "415m" hits `15m` before `1m` ever gets a look.
const TIMEFRAME_PRIORITY: [&str; 9] = ["1M", "1W", "1D", "4h", "1h", "30m", "15m", "5m", "1m"];

/// Price statistics over every forex-style quote found in the text
/// (decimal numbers with exactly 4 or 5 fractional digits).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceStats {
    /// The last matched token in document order, verbatim. Not necessarily
    /// the numeric maximum.
    pub current: String,
    pub high: f64,
    pub low: f64,
    /// `current - first_match` to 5 decimal places, or `"N/A"` when fewer
    /// than two tokens matched.
    pub change: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedFields {
    pub asset: String,
    pub timeframe: String,
    pub platform: String,
    pub prices: Option<PriceStats>,
}

fn price_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d+\.\d{4,5}").expect("hard-coded pattern"))
}

fn pair_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"([A-Z]{3})[/\s]([A-Z]{3})").expect("hard-coded pattern"))
}

/// Parse OCR text into structured fields.
///
/// `forced_timeframe` bypasses timeframe scanning entirely and is used
/// verbatim (multi-timeframe runs know which slot each chart belongs to).
///
/// Pure function of its inputs: same text, same fields.
pub fn extract_fields(text: &str, forced_timeframe: Option<&str>) -> ExtractedFields {
    ExtractedFields {
        asset: extract_asset(text),
        timeframe: match forced_timeframe {
            Some(label) => label.to_string(),
            None => extract_timeframe(text),
        },
        platform: extract_platform(text),
        prices: extract_prices(text),
    }
}

/// First-match-wins asset resolution. The well-known currency checks run
/// before the generic pair pattern, so a text mentioning both "EUR" and a
/// matchable three-letter pair still resolves to EURUSD.
fn extract_asset(text: &str) -> String {
    if text.contains("EUR") || text.contains("Euro") {
        return "EURUSD".to_string();
    }
    if text.contains("GBP") {
        return "GBPUSD".to_string();
    }
    if text.contains("JPY") {
        return "USDJPY".to_string();
    }
    if let Some(captures) = pair_pattern().captures(text) {
        return format!("{}/{}", &captures[1], &captures[2]);
    }
    UNKNOWN.to_string()
}

fn extract_timeframe(text: &str) -> String {
    TIMEFRAME_PRIORITY
        .iter()
        .find(|token| text.contains(*token))
        .map(|token| token.to_string())
        .unwrap_or_else(|| UNKNOWN.to_string())
}

fn extract_platform(text: &str) -> String {
    if text.contains("TradingView") {
        "TradingView".to_string()
    } else if text.contains("MetaTrader") {
        "MetaTrader".to_string()
    } else {
        UNKNOWN.to_string()
    }
}

fn extract_prices(text: &str) -> Option<PriceStats> {
    let tokens: Vec<&str> = price_pattern().find_iter(text).map(|m| m.as_str()).collect();
    if tokens.is_empty() {
        return None;
    }

    let values: Vec<f64> = tokens
        .iter()
        .filter_map(|token| token.parse::<f64>().ok())
        .collect();
    let high = values.iter().cloned().fold(f64::MIN, f64::max);
    let low = values.iter().cloned().fold(f64::MAX, f64::min);

    let current = tokens[tokens.len() - 1].to_string();
    let change = if tokens.len() > 1 {
        let first: f64 = tokens[0].parse().unwrap_or(0.0);
        let last: f64 = current.parse().unwrap_or(0.0);
        format!("{:.5}", last - first)
    } else {
        "N/A".to_string()
    };

    Some(PriceStats {
        current,
        high,
        low,
        change,
    })
}
