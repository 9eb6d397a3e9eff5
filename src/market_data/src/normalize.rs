//! Reshapes a provider [`BarSeries`] into the label/close pair a chart plots.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use tracing::warn;

use crate::models::{bar::Bar, bar_series::BarSeries};

const DATE: &str = "%Y-%m-%d";
const DATE_TIME: &str = "%Y-%m-%d %H:%M";
const TIME: &str = "%H:%M";

/// Chart-ready data: `labels[i]` pairs with `closes[i]`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChartSeries {
    pub labels: Vec<String>,
    pub closes: Vec<f64>,
}

impl ChartSeries {
    pub fn is_empty(&self) -> bool {
        self.closes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.closes.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LabelStyle {
    /// Date for daily and coarser bars, date and time for intraday.
    #[default]
    Full,
    /// Time of day only, for sparklines.
    Mini,
}

/// Picks the series for `symbol` out of a multi-symbol response.
pub fn find_series<'a>(series: &'a [BarSeries], symbol: &str) -> Option<&'a BarSeries> {
    series
        .iter()
        .find(|s| s.symbol.eq_ignore_ascii_case(symbol.trim()))
}

/// Normalizes with labels in UTC.
pub fn normalize(series: Option<&BarSeries>, style: LabelStyle) -> ChartSeries {
    normalize_in(series, style, Tz::UTC)
}

/// Normalizes with labels rendered in `tz`. Bars keep provider order.
pub fn normalize_in(series: Option<&BarSeries>, style: LabelStyle, tz: Tz) -> ChartSeries {
    let Some(series) = series else {
        return ChartSeries::default();
    };
    if series.bars.is_empty() {
        return ChartSeries::default();
    }

    if let Some(pos) = first_out_of_order(&series.bars) {
        warn!(
            symbol = %series.symbol,
            index = pos,
            "bars are not in ascending time order; passing through as received"
        );
    }

    let format = match style {
        LabelStyle::Mini => TIME,
        LabelStyle::Full if series.timeframe.is_intraday() => DATE_TIME,
        LabelStyle::Full => DATE,
    };

    let (labels, closes) = series
        .bars
        .iter()
        .map(|bar| (label(bar.timestamp, tz, format), bar.close))
        .unzip();

    ChartSeries { labels, closes }
}

fn label(ts: DateTime<Utc>, tz: Tz, format: &str) -> String {
    ts.with_timezone(&tz).format(format).to_string()
}

fn first_out_of_order(bars: &[Bar]) -> Option<usize> {
    bars.windows(2)
        .position(|w| w[1].timestamp <= w[0].timestamp)
        .map(|i| i + 1)
}
