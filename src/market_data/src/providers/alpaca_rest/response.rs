use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Deserialize;

use crate::models::{
    bar::{Bar, count_from_f64},
    quote::LatestQuote,
};

#[derive(Deserialize, Debug, Clone)]
pub struct AlpacaBar {
    #[serde(rename = "t")]
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "o")]
    pub open: f64,
    #[serde(rename = "h")]
    pub high: f64,
    #[serde(rename = "l")]
    pub low: f64,
    #[serde(rename = "c")]
    pub close: f64,
    #[serde(rename = "v")]
    pub volume: f64,
    #[serde(rename = "n", default)]
    pub trade_count: Option<u64>,
    #[serde(rename = "vw", default)]
    pub vwap: Option<f64>,
}

impl From<AlpacaBar> for Bar {
    fn from(ab: AlpacaBar) -> Self {
        Bar {
            timestamp: ab.timestamp,
            open: ab.open,
            high: ab.high,
            low: ab.low,
            close: ab.close,
            volume: count_from_f64(ab.volume),
            trade_count: ab.trade_count,
            vwap: ab.vwap,
        }
    }
}

/// One page of `/v2/stocks/bars`. Alpaca sends `"bars": null` when the
/// window has no data.
#[derive(Deserialize, Debug, Default)]
pub struct AlpacaResponse {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub bars: IndexMap<String, Vec<AlpacaBar>>,
    pub next_page_token: Option<String>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<IndexMap<String, Vec<AlpacaBar>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Deserialize, Debug)]
pub struct AlpacaQuote {
    #[serde(rename = "t")]
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "ax", default)]
    pub ask_exchange: String,
    #[serde(rename = "ap")]
    pub ask_price: f64,
    #[serde(rename = "as")]
    pub ask_size: f64,
    #[serde(rename = "bx", default)]
    pub bid_exchange: String,
    #[serde(rename = "bp")]
    pub bid_price: f64,
    #[serde(rename = "bs")]
    pub bid_size: f64,
    #[serde(rename = "c", default)]
    pub conditions: Option<Vec<String>>,
    #[serde(rename = "z", default)]
    pub tape: String,
}

#[derive(Deserialize, Debug)]
pub struct AlpacaLatestQuoteResponse {
    pub symbol: String,
    pub quote: Option<AlpacaQuote>,
}

impl AlpacaLatestQuoteResponse {
    pub fn into_quote(self) -> Option<LatestQuote> {
        let q = self.quote?;
        Some(LatestQuote {
            symbol: self.symbol,
            timestamp: q.timestamp,
            bid_price: q.bid_price,
            bid_size: q.bid_size,
            bid_exchange: q.bid_exchange,
            ask_price: q.ask_price,
            ask_size: q.ask_size,
            ask_exchange: q.ask_exchange,
            conditions: q.conditions.unwrap_or_default(),
            tape: q.tape,
        })
    }
}
