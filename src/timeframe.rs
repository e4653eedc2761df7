use serde::{Deserialize, Serialize};

/// The three chart views a multi-timeframe run covers, in confluence scan
/// order: 1D first, then 4H, then 15m.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Timeframe {
    Daily,
    FourHour,
    FifteenMin,
}

impl Timeframe {
    pub const ALL: [Timeframe; 3] = [Timeframe::Daily, Timeframe::FourHour, Timeframe::FifteenMin];

    /// Display label, also used as the forced timeframe passed to field
    /// extraction for this slot.
    pub fn label(&self) -> &'static str {
        match self {
            Timeframe::Daily => "1D",
            Timeframe::FourHour => "4H",
            Timeframe::FifteenMin => "15m",
        }
    }

    /// The role this view plays in a multi-timeframe read, injected into the
    /// narrator prompt.
    pub fn role(&self) -> &'static str {
        match self {
            Timeframe::Daily => "macro trend and overall market direction",
            Timeframe::FourHour => "intermediate trend and price structure",
            Timeframe::FifteenMin => "precise entry timing and short-term momentum",
        }
    }
}

impl std::fmt::Display for Timeframe {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}
