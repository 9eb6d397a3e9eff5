use async_trait::async_trait;
use reqwest::{
    Client, Response,
    header::{HeaderMap, HeaderValue, USER_AGENT},
};
use snafu::ResultExt;
use tracing::debug;

use crate::{
    models::{
        bar_series::BarSeries,
        request_params::BarsRequestParams,
        symbol::{SymbolMatch, validate_symbol},
        timeframe::{TimeFrame, TimeFrameUnit},
    },
    providers::{
        ApiSnafu, ClientBuildSnafu, DataProvider, ProviderError, ProviderInitError, ReqwestSnafu,
        SymbolSearch, ValidationSnafu, join_url,
        payload::BarsPayload,
        yahoo_chart::response::{YahooChartResponse, YahooSearchResponse},
    },
};

// Yahoo rejects requests without a browser-like agent.
const BROWSER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

const SEARCH_LIMIT: u32 = 10;

pub struct YahooProvider {
    client: Client,
    chart_url: String,
    search_url: String,
}

impl YahooProvider {
    pub fn new(chart_url: &str, search_url: &str) -> Result<Self, ProviderInitError> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_AGENT));
        let client = Client::builder()
            .default_headers(headers)
            .build()
            .context(ClientBuildSnafu)?;
        Ok(Self {
            client,
            chart_url: chart_url.trim_end_matches('/').to_string(),
            search_url: search_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get(&self, url: &str, query: &[(&str, String)]) -> Result<Response, ProviderError> {
        debug!(url, ?query, "yahoo request");
        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .context(ReqwestSnafu)?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return ApiSnafu {
                status: status.as_u16(),
                message,
            }
            .fail();
        }
        Ok(response)
    }
}

/// Yahoo's `interval` token for a timeframe, if it has one.
pub fn yahoo_interval(timeframe: &TimeFrame) -> Result<&'static str, ProviderError> {
    let token = match (timeframe.unit, timeframe.amount) {
        (TimeFrameUnit::Minute, 1) => "1m",
        (TimeFrameUnit::Minute, 2) => "2m",
        (TimeFrameUnit::Minute, 5) => "5m",
        (TimeFrameUnit::Minute, 15) => "15m",
        (TimeFrameUnit::Minute, 30) => "30m",
        (TimeFrameUnit::Minute, 60) | (TimeFrameUnit::Hour, 1) => "60m",
        (TimeFrameUnit::Minute, 90) => "90m",
        (TimeFrameUnit::Day, 1) => "1d",
        (TimeFrameUnit::Day, 5) => "5d",
        (TimeFrameUnit::Week, 1) => "1wk",
        (TimeFrameUnit::Month, 1) => "1mo",
        (TimeFrameUnit::Month, 3) => "3mo",
        _ => {
            return ValidationSnafu {
                message: format!("Yahoo does not support timeframe {timeframe}"),
            }
            .fail();
        }
    };
    Ok(token)
}

#[async_trait]
impl DataProvider for YahooProvider {
    async fn fetch_bars(&self, params: BarsRequestParams) -> Result<Vec<BarSeries>, ProviderError> {
        let interval = yahoo_interval(&params.timeframe)?;
        let mut out = Vec::with_capacity(params.symbols.len());

        // The chart endpoint serves one symbol per call.
        for raw in &params.symbols {
            let symbol = validate_symbol(raw)?;
            let url = join_url(&self.chart_url, &format!("/v8/finance/chart/{symbol}"));
            let query = [
                ("period1", params.start.timestamp().to_string()),
                ("period2", params.end.timestamp().to_string()),
                ("interval", interval.to_string()),
                ("includePrePost", "false".to_string()),
            ];
            let body = self
                .get(&url, &query)
                .await?
                .json::<YahooChartResponse>()
                .await
                .context(ReqwestSnafu)?;
            out.extend(BarsPayload::Yahoo(body).into_series(params.timeframe)?);
        }

        Ok(out)
    }
}

#[async_trait]
impl SymbolSearch for YahooProvider {
    async fn search(&self, query: &str) -> Result<Vec<SymbolMatch>, ProviderError> {
        let q = query.trim();
        if q.is_empty() {
            return ValidationSnafu {
                message: "search query must not be empty",
            }
            .fail();
        }
        let url = join_url(&self.search_url, "/v1/finance/search");
        let params = [
            ("q", q.to_string()),
            ("quotesCount", SEARCH_LIMIT.to_string()),
            ("newsCount", "0".to_string()),
        ];
        let body = self
            .get(&url, &params)
            .await?
            .json::<YahooSearchResponse>()
            .await
            .context(ReqwestSnafu)?;
        Ok(body.into_matches())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_tokens() {
        assert_eq!(yahoo_interval(&TimeFrame::minutes(5)).unwrap(), "5m");
        assert_eq!(yahoo_interval(&TimeFrame::hours(1)).unwrap(), "60m");
        assert_eq!(yahoo_interval(&TimeFrame::week()).unwrap(), "1wk");
        assert_eq!(yahoo_interval(&TimeFrame::month()).unwrap(), "1mo");
        assert!(yahoo_interval(&TimeFrame::hours(4)).unwrap_err().is_validation());
    }
}
