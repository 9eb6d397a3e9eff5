//! Canonical in-memory representation of a time-series bar (OHLCV).
//!
//! This struct is the standard output of every [`DataProvider`](crate::providers::DataProvider)
//! implementation, regardless of which vendor produced the payload.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// A single time-series bar (OHLCV) for a given timestamp.
///
/// Vendor-agnostic; built once at the provider boundary and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bar {
    /// The timestamp for this bar (UTC).
    pub timestamp: DateTime<Utc>,

    /// Opening price.
    pub open: f64,

    /// Highest price during the bar interval.
    pub high: f64,

    /// Lowest price during the bar interval.
    pub low: f64,

    /// Closing price.
    pub close: f64,

    /// Shares traded during the bar interval.
    pub volume: u64,

    /// Trade count for the bar. Not all providers supply this.
    pub trade_count: Option<u64>,

    /// Volume-weighted average price. Not all providers supply this.
    pub vwap: Option<f64>,
}

impl Bar {
    /// True when every price field is a finite number.
    pub fn has_finite_prices(&self) -> bool {
        [self.open, self.high, self.low, self.close]
            .iter()
            .all(|p| p.is_finite())
    }
}

/// Converts a vendor-reported count (sometimes encoded as a JSON float) into an
/// unsigned integer. Negative or non-finite inputs collapse to zero.
pub(crate) fn count_from_f64(raw: f64) -> u64 {
    if raw.is_finite() && raw > 0.0 {
        raw.round() as u64
    } else {
        0
    }
}
