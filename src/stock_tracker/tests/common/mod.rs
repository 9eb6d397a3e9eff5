#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use chrono_tz::Tz;
use market_data::{
    models::{
        bar::Bar, bar_series::BarSeries, quote::LatestQuote, request_params::BarsRequestParams,
        symbol::SymbolMatch,
    },
    providers::{ApiSnafu, DataProvider, ProviderError, QuoteProvider, SymbolSearch},
};
use portfolio::store::sqlite::SqliteLedger;
use stock_tracker::server::{AppState, router};
use tempfile::TempDir;
use tokio::net::TcpListener;

/// Bars for `AAPL`, nothing for `EMPTY`, a 503 for `DOWN`.
pub struct StubBars;

#[async_trait]
impl DataProvider for StubBars {
    async fn fetch_bars(&self, params: BarsRequestParams) -> Result<Vec<BarSeries>, ProviderError> {
        let symbol = params.symbols[0].clone();
        match symbol.as_str() {
            "DOWN" => ApiSnafu {
                status: 503u16,
                message: "maintenance",
            }
            .fail(),
            "EMPTY" => Ok(vec![]),
            _ => Ok(vec![BarSeries {
                symbol,
                timeframe: params.timeframe,
                bars: vec![bar(3, 190.0), bar(4, 192.5)],
            }]),
        }
    }
}

fn bar(day: u32, close: f64) -> Bar {
    Bar {
        timestamp: Utc.with_ymd_and_hms(2024, 6, day, 4, 0, 0).unwrap(),
        open: close,
        high: close,
        low: close,
        close,
        volume: 1_000,
        trade_count: None,
        vwap: None,
    }
}

/// Quotes every symbol at bid 165 / ask 166, except `NOQUOTE`.
pub struct StubQuotes;

#[async_trait]
impl QuoteProvider for StubQuotes {
    async fn fetch_latest_quote(
        &self,
        symbol: &str,
    ) -> Result<Option<LatestQuote>, ProviderError> {
        if symbol == "NOQUOTE" {
            return Ok(None);
        }
        Ok(Some(LatestQuote {
            symbol: symbol.to_string(),
            timestamp: Utc.with_ymd_and_hms(2024, 6, 4, 15, 0, 0).unwrap(),
            bid_price: 165.0,
            bid_size: 3.0,
            bid_exchange: "V".into(),
            ask_price: 166.0,
            ask_size: 1.0,
            ask_exchange: "V".into(),
            conditions: vec!["R".into()],
            tape: "C".into(),
        }))
    }
}

pub struct StubSearch;

#[async_trait]
impl SymbolSearch for StubSearch {
    async fn search(&self, query: &str) -> Result<Vec<SymbolMatch>, ProviderError> {
        if query.eq_ignore_ascii_case("apple") {
            Ok(vec![SymbolMatch {
                symbol: "AAPL".into(),
                short_name: Some("Apple Inc.".into()),
                long_name: None,
                exchange: Some("NMS".into()),
                quote_type: Some("EQUITY".into()),
            }])
        } else {
            Ok(vec![])
        }
    }
}

pub struct TestServer {
    _dir: TempDir, // keep alive for the life of the test
    pub base_url: String,
    pub client: reqwest::Client,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

pub async fn spawn_server(with_quotes: bool) -> TestServer {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("ledger.db").to_string_lossy().to_string();
    let ledger = SqliteLedger::open(&path).expect("open ledger");

    let state = AppState {
        bars: Arc::new(StubBars),
        quotes: with_quotes.then(|| Arc::new(StubQuotes) as Arc<dyn QuoteProvider>),
        search: Arc::new(StubSearch),
        store: Arc::new(ledger),
        display_tz: Tz::UTC,
    };

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router(state)).await.unwrap();
    });

    TestServer {
        _dir: dir,
        base_url: format!("http://{addr}"),
        client: reqwest::Client::new(),
    }
}
