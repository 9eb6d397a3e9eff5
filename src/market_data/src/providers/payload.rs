//! Raw vendor payloads as explicit variants, converted to [`BarSeries`] at
//! the provider boundary.

use tracing::warn;

use crate::{
    models::{bar::Bar, bar_series::BarSeries, timeframe::TimeFrame},
    providers::{
        ProviderError, alpaca_rest::response::AlpacaResponse,
        yahoo_chart::response::YahooChartResponse,
    },
};

#[derive(Debug)]
pub enum BarsPayload {
    /// `/v2/stocks/bars` with every page already merged.
    Alpaca(AlpacaResponse),
    /// One `/v8/finance/chart` body.
    Yahoo(YahooChartResponse),
}

impl BarsPayload {
    /// Converts to internal series, dropping bars whose prices are not finite.
    pub fn into_series(self, timeframe: TimeFrame) -> Result<Vec<BarSeries>, ProviderError> {
        let series = match self {
            BarsPayload::Alpaca(resp) => resp
                .bars
                .into_iter()
                .map(|(symbol, bars)| BarSeries {
                    symbol,
                    timeframe,
                    bars: bars.into_iter().map(Bar::from).collect(),
                })
                .collect(),
            BarsPayload::Yahoo(resp) => resp.into_series(timeframe)?,
        };
        Ok(series.into_iter().map(drop_non_finite).collect())
    }
}

fn drop_non_finite(mut series: BarSeries) -> BarSeries {
    let before = series.bars.len();
    series.bars.retain(Bar::has_finite_prices);
    let dropped = before - series.bars.len();
    if dropped > 0 {
        warn!(symbol = %series.symbol, dropped, "discarded bars with non-finite prices");
    }
    series
}
