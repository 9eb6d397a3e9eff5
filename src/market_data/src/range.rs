//! Range/interval resolution for chart requests.
//!
//! The UI picks a range (`6mo`) and an interval (`1wk`). [`resolve`] turns
//! that pair into a provider [`TimeFrame`] and a concrete `[start, end)`
//! window. Resolution never fails: unknown range tokens fall back to a
//! 180-day lookback and unknown interval tokens to daily bars.
//!
//! ```
//! use chrono::{TimeZone, Utc};
//! use market_data::range::resolve;
//!
//! let now = Utc.with_ymd_and_hms(2024, 6, 14, 18, 0, 0).unwrap();
//! let window = resolve("1y", "1wk", now);
//! assert_eq!(window.timeframe.to_string(), "1Week");
//! assert_eq!(window.end, now);
//! ```

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc, Weekday};
use serde::Serialize;

use crate::models::timeframe::TimeFrame;

/// Lookback used when the range token is not recognized.
pub const DEFAULT_LOOKBACK_DAYS: i64 = 180;

/// A chart range the UI can ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChartRange {
    OneDay,
    FiveDays,
    OneMonth,
    ThreeMonths,
    SixMonths,
    OneYear,
    TwoYears,
    FiveYears,
}

impl ChartRange {
    pub const ALL: [ChartRange; 8] = [
        ChartRange::OneDay,
        ChartRange::FiveDays,
        ChartRange::OneMonth,
        ChartRange::ThreeMonths,
        ChartRange::SixMonths,
        ChartRange::OneYear,
        ChartRange::TwoYears,
        ChartRange::FiveYears,
    ];

    pub fn parse(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.token() == token.trim())
    }

    pub const fn token(self) -> &'static str {
        match self {
            ChartRange::OneDay => "1d",
            ChartRange::FiveDays => "5d",
            ChartRange::OneMonth => "1mo",
            ChartRange::ThreeMonths => "3mo",
            ChartRange::SixMonths => "6mo",
            ChartRange::OneYear => "1y",
            ChartRange::TwoYears => "2y",
            ChartRange::FiveYears => "5y",
        }
    }

    /// Days to look back from `now`. `None` for [`ChartRange::OneDay`], which
    /// uses the prior-session window instead.
    pub const fn lookback_days(self) -> Option<i64> {
        match self {
            ChartRange::OneDay => None,
            ChartRange::FiveDays => Some(5),
            ChartRange::OneMonth => Some(30),
            ChartRange::ThreeMonths => Some(90),
            ChartRange::SixMonths => Some(180),
            ChartRange::OneYear => Some(365),
            ChartRange::TwoYears => Some(730),
            ChartRange::FiveYears => Some(1825),
        }
    }
}

/// A bar interval the UI can ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChartInterval {
    OneMinute,
    FiveMinutes,
    FifteenMinutes,
    ThirtyMinutes,
    OneHour,
    OneDay,
    OneWeek,
    OneMonth,
}

impl ChartInterval {
    pub const ALL: [ChartInterval; 8] = [
        ChartInterval::OneMinute,
        ChartInterval::FiveMinutes,
        ChartInterval::FifteenMinutes,
        ChartInterval::ThirtyMinutes,
        ChartInterval::OneHour,
        ChartInterval::OneDay,
        ChartInterval::OneWeek,
        ChartInterval::OneMonth,
    ];

    pub fn parse(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|i| i.token() == token.trim())
    }

    pub const fn token(self) -> &'static str {
        match self {
            ChartInterval::OneMinute => "1m",
            ChartInterval::FiveMinutes => "5m",
            ChartInterval::FifteenMinutes => "15m",
            ChartInterval::ThirtyMinutes => "30m",
            ChartInterval::OneHour => "1h",
            ChartInterval::OneDay => "1d",
            ChartInterval::OneWeek => "1wk",
            ChartInterval::OneMonth => "1mo",
        }
    }

    pub const fn timeframe(self) -> TimeFrame {
        match self {
            ChartInterval::OneMinute => TimeFrame::minutes(1),
            ChartInterval::FiveMinutes => TimeFrame::minutes(5),
            ChartInterval::FifteenMinutes => TimeFrame::minutes(15),
            ChartInterval::ThirtyMinutes => TimeFrame::minutes(30),
            ChartInterval::OneHour => TimeFrame::hours(1),
            ChartInterval::OneDay => TimeFrame::day(),
            ChartInterval::OneWeek => TimeFrame::week(),
            ChartInterval::OneMonth => TimeFrame::month(),
        }
    }
}

/// A (range, interval) selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeSpec {
    pub range: ChartRange,
    pub interval: ChartInterval,
}

impl RangeSpec {
    /// Selection shown when the UI has not picked anything yet.
    pub const DEFAULT: RangeSpec = RangeSpec::new(ChartRange::SixMonths, ChartInterval::OneWeek);

    /// Range buttons offered by the chart page, each with its paired interval.
    pub const SUGGESTED: [RangeSpec; 8] = [
        RangeSpec::new(ChartRange::OneDay, ChartInterval::FiveMinutes),
        RangeSpec::new(ChartRange::FiveDays, ChartInterval::FifteenMinutes),
        RangeSpec::new(ChartRange::OneMonth, ChartInterval::OneDay),
        RangeSpec::new(ChartRange::ThreeMonths, ChartInterval::OneDay),
        RangeSpec::new(ChartRange::SixMonths, ChartInterval::OneWeek),
        RangeSpec::new(ChartRange::OneYear, ChartInterval::OneWeek),
        RangeSpec::new(ChartRange::TwoYears, ChartInterval::OneWeek),
        RangeSpec::new(ChartRange::FiveYears, ChartInterval::OneMonth),
    ];

    pub const fn new(range: ChartRange, interval: ChartInterval) -> Self {
        Self { range, interval }
    }

    /// Interval paired with `range` in [`RangeSpec::SUGGESTED`].
    pub fn suggested_for(range: ChartRange) -> Self {
        Self::SUGGESTED
            .into_iter()
            .find(|s| s.range == range)
            .unwrap_or(Self::DEFAULT)
    }
}

/// Provider timeframe plus the concrete window to request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResolvedWindow {
    pub timeframe: TimeFrame,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Resolves raw UI tokens. Unknown tokens never fail; see the module docs.
pub fn resolve(range: &str, interval: &str, now: DateTime<Utc>) -> ResolvedWindow {
    let timeframe = ChartInterval::parse(interval)
        .map(ChartInterval::timeframe)
        .unwrap_or(TimeFrame::day());

    let (start, end) = match ChartRange::parse(range) {
        Some(r) => match r.lookback_days() {
            Some(days) => (now - Duration::days(days), now),
            None => prior_session(now),
        },
        None => (now - Duration::days(DEFAULT_LOOKBACK_DAYS), now),
    };

    ResolvedWindow {
        timeframe,
        start,
        end,
    }
}

/// Resolves an already-typed selection.
pub fn resolve_spec(spec: RangeSpec, now: DateTime<Utc>) -> ResolvedWindow {
    resolve(spec.range.token(), spec.interval.token(), now)
}

// Regular US session in UTC (EDT offsets); holidays are not modelled.
const SESSION_OPEN: NaiveTime = match NaiveTime::from_hms_opt(13, 30, 0) {
    Some(t) => t,
    None => panic!("session open is not a valid time"),
};

const SESSION_CLOSE: NaiveTime = match NaiveTime::from_hms_opt(20, 0, 0) {
    Some(t) => t,
    None => panic!("session close is not a valid time"),
};

fn prior_trading_day(now: DateTime<Utc>) -> NaiveDate {
    let mut day = now.date_naive() - Duration::days(1);
    while matches!(day.weekday(), Weekday::Sat | Weekday::Sun) {
        day -= Duration::days(1);
    }
    day
}

fn prior_session(now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let day = prior_trading_day(now);
    (
        day.and_time(SESSION_OPEN).and_utc(),
        day.and_time(SESSION_CLOSE).and_utc(),
    )
}
