use chrono::DateTime;
use serde::Deserialize;

use crate::{
    models::{
        bar::{Bar, count_from_f64},
        bar_series::BarSeries,
        symbol::SymbolMatch,
        timeframe::TimeFrame,
    },
    providers::{InternalSnafu, ProviderError},
};

#[derive(Deserialize, Debug)]
pub struct YahooChartResponse {
    pub chart: YahooChart,
}

#[derive(Deserialize, Debug)]
pub struct YahooChart {
    #[serde(default)]
    pub result: Option<Vec<YahooChartResult>>,
    #[serde(default)]
    pub error: Option<YahooError>,
}

#[derive(Deserialize, Debug)]
pub struct YahooError {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Deserialize, Debug)]
pub struct YahooChartResult {
    pub meta: YahooMeta,
    #[serde(default)]
    pub timestamp: Option<Vec<i64>>,
    pub indicators: YahooIndicators,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct YahooMeta {
    pub symbol: String,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub regular_market_price: Option<f64>,
}

#[derive(Deserialize, Debug)]
pub struct YahooIndicators {
    #[serde(default)]
    pub quote: Vec<YahooQuoteBlock>,
}

/// Column-oriented OHLCV. Yahoo pads missing samples with `null`.
#[derive(Deserialize, Debug, Default)]
pub struct YahooQuoteBlock {
    #[serde(default)]
    pub open: Vec<Option<f64>>,
    #[serde(default)]
    pub high: Vec<Option<f64>>,
    #[serde(default)]
    pub low: Vec<Option<f64>>,
    #[serde(default)]
    pub close: Vec<Option<f64>>,
    #[serde(default)]
    pub volume: Vec<Option<f64>>,
}

impl YahooChartResponse {
    /// Zips the parallel arrays into bars, one series per result.
    pub fn into_series(self, timeframe: TimeFrame) -> Result<Vec<BarSeries>, ProviderError> {
        if let Some(err) = self.chart.error {
            return InternalSnafu {
                message: format!("yahoo chart error {}: {}", err.code, err.description),
            }
            .fail();
        }

        self.chart
            .result
            .unwrap_or_default()
            .into_iter()
            .map(|result| result.into_series(timeframe))
            .collect()
    }
}

impl YahooChartResult {
    fn into_series(self, timeframe: TimeFrame) -> Result<BarSeries, ProviderError> {
        let timestamps = self.timestamp.unwrap_or_default();
        let quote = self.indicators.quote.into_iter().next().unwrap_or_default();

        let n = timestamps.len();
        let columns = [
            ("open", quote.open.len()),
            ("high", quote.high.len()),
            ("low", quote.low.len()),
            ("close", quote.close.len()),
        ];
        if let Some((name, len)) = columns.iter().find(|(_, len)| n > 0 && *len != n) {
            return InternalSnafu {
                message: format!(
                    "yahoo chart for {}: {name} has {len} values for {n} timestamps",
                    self.meta.symbol
                ),
            }
            .fail();
        }

        let mut bars = Vec::with_capacity(n);
        for (i, ts) in timestamps.into_iter().enumerate() {
            let (Some(open), Some(high), Some(low), Some(close)) =
                (quote.open[i], quote.high[i], quote.low[i], quote.close[i])
            else {
                continue;
            };
            let Some(timestamp) = DateTime::from_timestamp(ts, 0) else {
                continue;
            };
            let volume = quote.volume.get(i).copied().flatten().unwrap_or(0.0);
            bars.push(Bar {
                timestamp,
                open,
                high,
                low,
                close,
                volume: count_from_f64(volume),
                trade_count: None,
                vwap: None,
            });
        }

        Ok(BarSeries {
            symbol: self.meta.symbol,
            timeframe,
            bars,
        })
    }
}

#[derive(Deserialize, Debug, Default)]
pub struct YahooSearchResponse {
    #[serde(default)]
    pub quotes: Vec<YahooSearchQuote>,
}

#[derive(Deserialize, Debug)]
pub struct YahooSearchQuote {
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub shortname: Option<String>,
    #[serde(default)]
    pub longname: Option<String>,
    #[serde(default)]
    pub exchange: Option<String>,
    #[serde(rename = "quoteType", default)]
    pub quote_type: Option<String>,
}

impl YahooSearchResponse {
    /// Drops hits without a symbol (news, people, etc).
    pub fn into_matches(self) -> Vec<SymbolMatch> {
        self.quotes
            .into_iter()
            .filter_map(|q| {
                Some(SymbolMatch {
                    symbol: q.symbol.filter(|s| !s.is_empty())?,
                    short_name: q.shortname,
                    long_name: q.longname,
                    exchange: q.exchange,
                    quote_type: q.quote_type,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHART: &str = r#"{"chart":{"result":[{
        "meta":{"symbol":"MSFT","currency":"USD","regularMarketPrice":420.5},
        "timestamp":[1717421400,1717507800,1717594200],
        "indicators":{"quote":[{
            "open":[415.5,null,424.0],
            "high":[416.4,null,425.1],
            "low":[408.9,null,419.8],
            "close":[413.5,null,424.0],
            "volume":[17484700,null,null]
        }]}
    }],"error":null}}"#;

    #[test]
    fn zips_columns_and_skips_null_rows() {
        let resp: YahooChartResponse = serde_json::from_str(CHART).unwrap();
        let series = resp.into_series(TimeFrame::day()).unwrap();
        assert_eq!(series.len(), 1);
        let msft = &series[0];
        assert_eq!(msft.symbol, "MSFT");
        assert_eq!(msft.bars.len(), 2);
        assert_eq!(msft.bars[0].volume, 17_484_700);
        assert_eq!(msft.bars[1].close, 424.0);
        assert_eq!(msft.bars[1].volume, 0);
    }

    #[test]
    fn column_length_mismatch_is_rejected() {
        let body = r#"{"chart":{"result":[{"meta":{"symbol":"X"},"timestamp":[1,2],
            "indicators":{"quote":[{"open":[1.0],"high":[1.0,2.0],"low":[1.0,2.0],"close":[1.0,2.0]}]}}]}}"#;
        let resp: YahooChartResponse = serde_json::from_str(body).unwrap();
        let err = resp.into_series(TimeFrame::day()).unwrap_err();
        assert!(err.to_string().contains("open has 1 values"));
    }

    #[test]
    fn chart_error_object_surfaces() {
        let body = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#;
        let resp: YahooChartResponse = serde_json::from_str(body).unwrap();
        assert!(resp.into_series(TimeFrame::day()).is_err());
    }

    #[test]
    fn no_timestamps_is_empty_series() {
        let body = r#"{"chart":{"result":[{"meta":{"symbol":"X"},"indicators":{"quote":[{}]}}]}}"#;
        let resp: YahooChartResponse = serde_json::from_str(body).unwrap();
        let series = resp.into_series(TimeFrame::day()).unwrap();
        assert!(series[0].is_empty());
    }

    #[test]
    fn search_hits_without_symbol_are_dropped() {
        let body = r#"{"quotes":[
            {"symbol":"AAPL","shortname":"Apple Inc.","longname":"Apple Inc.","exchange":"NMS","quoteType":"EQUITY"},
            {"shortname":"news item"}
        ]}"#;
        let resp: YahooSearchResponse = serde_json::from_str(body).unwrap();
        let hits = resp.into_matches();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].exchange.as_deref(), Some("NMS"));
        assert_eq!(hits[0].quote_type.as_deref(), Some("EQUITY"));
    }
}
