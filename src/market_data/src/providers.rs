//! Provider abstraction for market data sources.
//!
//! Three capabilities are split into separate traits so a vendor only
//! implements what it actually serves:
//!
//! - [`DataProvider`]: historical OHLCV bars (Alpaca, Yahoo chart).
//! - [`QuoteProvider`]: latest bid/ask (Alpaca).
//! - [`SymbolSearch`]: ticker autocomplete (Yahoo).
//!
//! All traits are object safe; callers hold them as `Arc<dyn ...>` and pick
//! the vendor at runtime through [`build_bars_provider`].
//!
//! # Example
//!
//! ```rust
//! use async_trait::async_trait;
//! use market_data::models::{bar_series::BarSeries, request_params::BarsRequestParams};
//! use market_data::providers::{DataProvider, ProviderError};
//!
//! struct MyProvider;
//!
//! #[async_trait]
//! impl DataProvider for MyProvider {
//!     async fn fetch_bars(
//!         &self,
//!         _params: BarsRequestParams,
//!     ) -> Result<Vec<BarSeries>, ProviderError> {
//!         Ok(vec![])
//!     }
//! }
//! ```

pub mod alpaca_rest;
pub mod payload;
pub mod yahoo_chart;

use std::{fmt, str::FromStr, sync::Arc};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use shared_utils::env::MissingEnvVarError;
use snafu::{Backtrace, Snafu};

use crate::models::{
    bar_series::BarSeries, quote::LatestQuote, request_params::BarsRequestParams,
    symbol::SymbolMatch,
};

use self::{alpaca_rest::provider::AlpacaProvider, yahoo_chart::provider::YahooProvider};

pub const DEFAULT_ALPACA_DATA_URL: &str = "https://data.alpaca.markets";
pub const DEFAULT_YAHOO_CHART_URL: &str = "https://query1.finance.yahoo.com";
pub const DEFAULT_YAHOO_SEARCH_URL: &str = "https://query2.finance.yahoo.com";

/// Fetches time-series bar data from a market data vendor.
#[async_trait]
pub trait DataProvider: Send + Sync {
    /// Returns one [`BarSeries`] per symbol the vendor had data for. A symbol
    /// with no bars in the window may be missing from the result entirely.
    async fn fetch_bars(&self, params: BarsRequestParams) -> Result<Vec<BarSeries>, ProviderError>;
}

/// Fetches the latest top-of-book quote for one symbol.
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    /// `Ok(None)` when the vendor answered but has no quote for the symbol.
    async fn fetch_latest_quote(&self, symbol: &str)
    -> Result<Option<LatestQuote>, ProviderError>;
}

/// Ticker lookup by free-text query.
#[async_trait]
pub trait SymbolSearch: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<SymbolMatch>, ProviderError>;
}

/// Errors that can occur during the creation of a provider instance
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ProviderInitError {
    /// missed environment variable.
    #[snafu(display("Missing environment variable: {source}"))]
    MissingEnvVar {
        source: MissingEnvVarError,
        backtrace: Backtrace,
    },

    /// failed to init reqwest client
    #[snafu(display("Failed to build HTTP client: {source}"))]
    ClientBuild {
        source: reqwest::Error,
        backtrace: Backtrace,
    },

    /// API key contains characters that cannot go in a header.
    #[snafu(display("Invalid API key format: {source}"))]
    InvalidApiKey {
        source: reqwest::header::InvalidHeaderValue,
        backtrace: Backtrace,
    },
}

/// Errors that can occur within a provider implementation.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ProviderError {
    /// Transport failure, timeout, or a body that did not decode.
    #[snafu(display("API request failed: {source}"))]
    Reqwest {
        source: reqwest::Error,
        backtrace: Backtrace,
    },

    /// The vendor answered with a non-2xx status.
    #[snafu(display("API error ({status}): {message}"))]
    Api {
        status: u16,
        message: String,
        backtrace: Backtrace,
    },

    /// The request parameters were invalid for this specific provider.
    #[snafu(display("Invalid parameters for provider: {message}"))]
    Validation {
        message: String,
        backtrace: Backtrace,
    },

    /// The payload decoded but did not make sense.
    #[snafu(display("Internal provider error: {message}"))]
    Internal {
        message: String,
        backtrace: Backtrace,
    },

    #[snafu(display("Provider initialization error: {source}"))]
    Init {
        #[snafu(backtrace)]
        source: ProviderInitError,
    },
}

impl ProviderError {
    /// True for errors caused by the caller's input rather than the vendor.
    pub fn is_validation(&self) -> bool {
        matches!(self, ProviderError::Validation { .. })
    }
}

/// Which vendor serves bar history.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderId {
    #[default]
    Alpaca,
    Yahoo,
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ProviderId::Alpaca => "alpaca",
            ProviderId::Yahoo => "yahoo",
        })
    }
}

impl FromStr for ProviderId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "alpaca" => Ok(ProviderId::Alpaca),
            "yahoo" => Ok(ProviderId::Yahoo),
            other => Err(format!("unknown provider: {other}")),
        }
    }
}

/// Base URLs for each vendor. Overridden in tests to point at a local stub.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub alpaca_data_url: String,
    pub yahoo_chart_url: String,
    pub yahoo_search_url: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            alpaca_data_url: DEFAULT_ALPACA_DATA_URL.to_string(),
            yahoo_chart_url: DEFAULT_YAHOO_CHART_URL.to_string(),
            yahoo_search_url: DEFAULT_YAHOO_SEARCH_URL.to_string(),
        }
    }
}

/// Builds the bar provider selected by `id`. Alpaca reads its keys from the
/// environment.
pub fn build_bars_provider(
    id: ProviderId,
    endpoints: &Endpoints,
) -> Result<Arc<dyn DataProvider>, ProviderInitError> {
    Ok(match id {
        ProviderId::Alpaca => Arc::new(AlpacaProvider::new(&endpoints.alpaca_data_url)?),
        ProviderId::Yahoo => Arc::new(YahooProvider::new(
            &endpoints.yahoo_chart_url,
            &endpoints.yahoo_search_url,
        )?),
    })
}

/// Latest quotes are only served by Alpaca.
pub fn build_quote_provider(
    endpoints: &Endpoints,
) -> Result<Arc<dyn QuoteProvider>, ProviderInitError> {
    Ok(Arc::new(AlpacaProvider::new(&endpoints.alpaca_data_url)?))
}

/// Symbol search is only served by Yahoo and needs no credentials.
pub fn build_symbol_search(
    endpoints: &Endpoints,
) -> Result<Arc<dyn SymbolSearch>, ProviderInitError> {
    Ok(Arc::new(YahooProvider::new(
        &endpoints.yahoo_chart_url,
        &endpoints.yahoo_search_url,
    )?))
}

/// Joins a base URL and a path without doubling or dropping the slash.
pub(crate) fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
