//! Chart fetch: resolve the window, fetch bars, normalize.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::Serialize;

use crate::{
    models::{request_params::BarsRequestParams, symbol::validate_symbol},
    normalize::{ChartSeries, LabelStyle, find_series, normalize_in},
    outcome::{FetchOutcome, settle},
    providers::{DataProvider, ProviderError},
    range::{ChartInterval, ChartRange, RangeSpec, ResolvedWindow, resolve},
};

/// Range and interval used by the sparkline next to each holding.
pub const MINI_SPEC: RangeSpec = RangeSpec::new(ChartRange::OneDay, ChartInterval::FiveMinutes);

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Chart {
    pub symbol: String,
    pub window: ResolvedWindow,
    #[serde(flatten)]
    pub series: ChartSeries,
}

/// Fetches and normalizes one symbol's chart.
///
/// Returns `Err` only for a malformed symbol or a timeframe the provider
/// cannot serve; upstream trouble comes back as a [`FetchOutcome`].
pub async fn fetch_chart(
    provider: &dyn DataProvider,
    symbol: &str,
    range: &str,
    interval: &str,
    now: DateTime<Utc>,
    tz: Tz,
) -> Result<FetchOutcome<Chart>, ProviderError> {
    let window = resolve(range, interval, now);
    fetch_window(provider, symbol, window, LabelStyle::Full, tz).await
}

/// Prior-session intraday sparkline, labelled by time of day.
pub async fn fetch_mini_chart(
    provider: &dyn DataProvider,
    symbol: &str,
    now: DateTime<Utc>,
    tz: Tz,
) -> Result<FetchOutcome<Chart>, ProviderError> {
    let window = resolve(MINI_SPEC.range.token(), MINI_SPEC.interval.token(), now);
    fetch_window(provider, symbol, window, LabelStyle::Mini, tz).await
}

async fn fetch_window(
    provider: &dyn DataProvider,
    symbol: &str,
    window: ResolvedWindow,
    style: LabelStyle,
    tz: Tz,
) -> Result<FetchOutcome<Chart>, ProviderError> {
    let symbol = validate_symbol(symbol)?;
    let params = BarsRequestParams::single(&symbol, window.timeframe, window.start, window.end);
    let fetched = provider.fetch_bars(params).await;

    let outcome = settle("chart", fetched, |all| {
        find_series(all, &symbol).is_none_or(|s| s.is_empty())
    })?;

    Ok(outcome.map(|all| Chart {
        series: normalize_in(find_series(&all, &symbol), style, tz),
        symbol,
        window,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::{bar::Bar, bar_series::BarSeries},
        providers::InternalSnafu,
    };
    use async_trait::async_trait;
    use chrono::{Duration, TimeZone};
    use std::sync::Mutex;

    #[derive(Default)]
    struct Canned {
        bars: Vec<Bar>,
        fail: bool,
        seen: Mutex<Vec<BarsRequestParams>>,
    }

    #[async_trait]
    impl DataProvider for Canned {
        async fn fetch_bars(
            &self,
            params: BarsRequestParams,
        ) -> Result<Vec<BarSeries>, ProviderError> {
            self.seen.lock().unwrap().push(params.clone());
            if self.fail {
                return InternalSnafu { message: "boom" }.fail();
            }
            Ok(vec![BarSeries {
                symbol: params.symbols[0].clone(),
                timeframe: params.timeframe,
                bars: self.bars.clone(),
            }])
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 12, 15, 0, 0).unwrap()
    }

    fn bar(ts: DateTime<Utc>, close: f64) -> Bar {
        Bar {
            timestamp: ts,
            open: close,
            high: close,
            low: close,
            close,
            volume: 1,
            trade_count: None,
            vwap: None,
        }
    }

    #[tokio::test]
    async fn resolves_and_normalizes() {
        let provider = Canned {
            bars: vec![
                bar(now() - Duration::days(7), 100.0),
                bar(now() - Duration::days(1), 105.0),
            ],
            ..Default::default()
        };
        let chart = fetch_chart(&provider, "aapl", "1y", "1wk", now(), Tz::UTC)
            .await
            .unwrap()
            .ready()
            .unwrap();
        assert_eq!(chart.symbol, "AAPL");
        assert_eq!(chart.series.closes, vec![100.0, 105.0]);
        let seen = provider.seen.lock().unwrap();
        assert_eq!(seen[0].timeframe.to_string(), "1Week");
        assert_eq!(seen[0].start, now() - Duration::days(365));
    }

    #[tokio::test]
    async fn no_bars_is_empty_result() {
        let provider = Canned::default();
        let outcome = fetch_chart(&provider, "AAPL", "6mo", "1wk", now(), Tz::UTC)
            .await
            .unwrap();
        assert_eq!(outcome, FetchOutcome::EmptyResult);
    }

    #[tokio::test]
    async fn provider_failure_is_unavailable() {
        let provider = Canned {
            fail: true,
            ..Default::default()
        };
        let outcome = fetch_mini_chart(&provider, "AAPL", now(), Tz::UTC)
            .await
            .unwrap();
        assert!(matches!(outcome, FetchOutcome::UpstreamUnavailable { .. }));
    }

    #[tokio::test]
    async fn bad_symbol_is_an_error() {
        let provider = Canned::default();
        assert!(
            fetch_chart(&provider, "../etc", "1d", "5m", now(), Tz::UTC)
                .await
                .is_err()
        );
        assert!(provider.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn mini_uses_prior_session_and_time_labels() {
        let session = Utc.with_ymd_and_hms(2024, 6, 11, 13, 30, 0).unwrap();
        let provider = Canned {
            bars: vec![bar(session, 1.0), bar(session + Duration::minutes(5), 2.0)],
            ..Default::default()
        };
        let chart = fetch_mini_chart(&provider, "SPY", now(), Tz::UTC)
            .await
            .unwrap()
            .ready()
            .unwrap();
        assert_eq!(chart.series.labels, vec!["13:30", "13:35"]);
        assert_eq!(chart.window.start, session);
        assert_eq!(chart.window.timeframe.to_string(), "5Min");
    }
}
