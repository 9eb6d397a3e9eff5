//! A collection of time-series bars for a specific symbol and timeframe.

use serde::Serialize;

use crate::models::{bar::Bar, timeframe::TimeFrame};

/// Represents a complete set of time-series data for a single symbol.
///
/// This struct groups a vector of [`Bar`]s with their corresponding symbol
/// and [`TimeFrame`], making the data set self-describing. Bars keep the
/// order the provider returned them in.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarSeries {
    /// The symbol this data represents (e.g., "AAPL", "SPY").
    pub symbol: String,
    /// The time interval for each bar in the series.
    pub timeframe: TimeFrame,
    /// The collection of OHLCV bars.
    pub bars: Vec<Bar>,
}

impl BarSeries {
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }
}
