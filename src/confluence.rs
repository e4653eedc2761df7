//! Cross-timeframe confluence verdict.
//!
//! A pure function of the per-timeframe color-bias labels. A missing bias
//! counts as neither bullish nor bearish, so any undetected chart can only
//! weaken a verdict toward MIXED.

use serde::{Deserialize, Serialize};

use crate::imaging::color_bias::BiasLabel;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfluenceVerdict {
    StrongBullish,
    StrongBearish,
    ModerateBullish,
    ModerateBearish,
    Mixed,
}

impl ConfluenceVerdict {
    /// Report wording, agreement counts included.
    pub fn describe(&self) -> &'static str {
        match self {
            ConfluenceVerdict::StrongBullish => "STRONG BULLISH CONFLUENCE (3/3)",
            ConfluenceVerdict::StrongBearish => "STRONG BEARISH CONFLUENCE (3/3)",
            ConfluenceVerdict::ModerateBullish => "MODERATE BULLISH CONFLUENCE (2/3)",
            ConfluenceVerdict::ModerateBearish => "MODERATE BEARISH CONFLUENCE (2/3)",
            ConfluenceVerdict::Mixed => "NO CONFLUENCE, MIXED SIGNAL",
        }
    }
}

impl std::fmt::Display for ConfluenceVerdict {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.describe())
    }
}

/// Derive the verdict from the per-timeframe biases of a three-chart run,
/// checked in strict-to-loose order.
pub fn confluence_verdict(biases: &[Option<BiasLabel>]) -> ConfluenceVerdict {
    let bullish = biases.iter().filter(|b| **b == Some(BiasLabel::Bullish)).count();
    let bearish = biases.iter().filter(|b| **b == Some(BiasLabel::Bearish)).count();

    if bullish == 3 {
        ConfluenceVerdict::StrongBullish
    } else if bearish == 3 {
        ConfluenceVerdict::StrongBearish
    } else if bullish == 2 {
        ConfluenceVerdict::ModerateBullish
    } else if bearish == 2 {
        ConfluenceVerdict::ModerateBearish
    } else {
        ConfluenceVerdict::Mixed
    }
}
