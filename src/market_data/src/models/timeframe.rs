//! Bar granularity shared by every provider.
//!
//! A [`TimeFrame`] is an amount paired with a [`TimeFrameUnit`]. Its `Display`
//! form is the Alpaca timeframe token (`5Min`, `1Hour`, `1Day`, `1Week`,
//! `1Month`), which doubles as the provider-neutral token sent to clients.
//! Which amounts a vendor accepts is checked by each provider, not here.

use std::fmt;

use serde::{Serialize, Serializer};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TimeFrameError {
    #[error("Invalid amount for {unit:?}: {message}")]
    InvalidAmount {
        unit: TimeFrameUnit,
        message: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeFrameUnit {
    Minute,
    Hour,
    Day,
    Week,
    Month,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimeFrame {
    pub amount: u32,
    pub unit: TimeFrameUnit,
}

impl TimeFrame {
    pub const fn new(amount: u32, unit: TimeFrameUnit) -> Self {
        Self { amount, unit }
    }

    pub const fn minutes(amount: u32) -> Self {
        Self::new(amount, TimeFrameUnit::Minute)
    }

    pub const fn hours(amount: u32) -> Self {
        Self::new(amount, TimeFrameUnit::Hour)
    }

    pub const fn day() -> Self {
        Self::new(1, TimeFrameUnit::Day)
    }

    pub const fn week() -> Self {
        Self::new(1, TimeFrameUnit::Week)
    }

    pub const fn month() -> Self {
        Self::new(1, TimeFrameUnit::Month)
    }

    /// Minute and hour bars; these get time-of-day chart labels.
    pub const fn is_intraday(&self) -> bool {
        matches!(self.unit, TimeFrameUnit::Minute | TimeFrameUnit::Hour)
    }

    /// Rejects a zero amount, which no vendor accepts.
    pub fn ensure_non_zero(&self) -> Result<(), TimeFrameError> {
        if self.amount == 0 {
            return Err(TimeFrameError::InvalidAmount {
                unit: self.unit,
                message: "amount must be at least 1".into(),
            });
        }
        Ok(())
    }
}

impl fmt::Display for TimeFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let unit = match self.unit {
            TimeFrameUnit::Minute => "Min",
            TimeFrameUnit::Hour => "Hour",
            TimeFrameUnit::Day => "Day",
            TimeFrameUnit::Week => "Week",
            TimeFrameUnit::Month => "Month",
        };
        write!(f, "{}{}", self.amount, unit)
    }
}

impl Serialize for TimeFrame {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
