use chrono::{DateTime, Utc};

use crate::{models::timeframe::TimeFrame, providers::alpaca_rest::params::AlpacaBarsParams};

/// Universal parameters for requesting time-series bar data from any market data provider.
///
/// This is the standard input for every
/// [`DataProvider`](crate::providers::DataProvider) implementation.
#[derive(Clone, Debug)]
pub struct BarsRequestParams {
    /// List of symbols to request (e.g., `["AAPL"]`, `["SPY", "QQQ"]`).
    pub symbols: Vec<String>,

    /// The time interval for each bar (e.g., 5 minutes, 1 week).
    ///
    /// **Validation of allowed values is performed by each data provider
    /// implementation, according to their own API rules.**
    pub timeframe: TimeFrame,

    /// Start of the requested time range (inclusive, UTC).
    pub start: DateTime<Utc>,

    /// End of the requested time range (exclusive, UTC).
    pub end: DateTime<Utc>,

    /// Optional, provider-specific parameters.
    pub provider_specific: ProviderParams,
}

impl BarsRequestParams {
    /// Request for a single symbol with no vendor-specific options.
    pub fn single(
        symbol: impl Into<String>,
        timeframe: TimeFrame,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Self {
        Self {
            symbols: vec![symbol.into()],
            timeframe,
            start,
            end,
            provider_specific: ProviderParams::None,
        }
    }
}

/// Per-request options for a particular provider, kept out of the universal
/// `BarsRequestParams`.
#[derive(Clone, Debug, Default)]
pub enum ProviderParams {
    #[default]
    None,
    Alpaca(AlpacaBarsParams),
}
