use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use indexmap::IndexMap;
use nonzero_ext::nonzero;
use reqwest::{Client, Response, header};
use secrecy::{ExposeSecret, SecretString};
use shared_utils::env::get_env_var;
use snafu::ResultExt;
use tracing::debug;

use crate::{
    models::{
        bar_series::BarSeries, quote::LatestQuote, request_params::BarsRequestParams,
        symbol::validate_symbol,
    },
    providers::{
        ApiSnafu, ClientBuildSnafu, DataProvider, InvalidApiKeySnafu, MissingEnvVarSnafu,
        ProviderError, ProviderInitError, QuoteProvider, ReqwestSnafu, ValidationSnafu,
        alpaca_rest::{
            params::{construct_params, validate_timeframe},
            response::{AlpacaBar, AlpacaLatestQuoteResponse, AlpacaResponse},
        },
        join_url,
        payload::BarsPayload,
    },
};

/// Free-plan ceiling for the data API.
const REQUESTS_PER_MINUTE: std::num::NonZeroU32 = nonzero!(200u32);

/// Hard stop on pagination so a misbehaving token cannot loop forever.
const MAX_PAGES: usize = 1_000;

pub struct AlpacaProvider {
    client: Client,
    base_url: String,
    limiter: DefaultDirectRateLimiter,
}

impl AlpacaProvider {
    /// Creates a new Alpaca provider.
    ///
    /// Reads API keys from the `APCA_API_KEY_ID` and `APCA_API_SECRET_KEY`
    /// environment variables.
    pub fn new(base_url: &str) -> Result<Self, ProviderInitError> {
        let api_key =
            SecretString::new(get_env_var("APCA_API_KEY_ID").context(MissingEnvVarSnafu)?.into());
        let secret_key = SecretString::new(
            get_env_var("APCA_API_SECRET_KEY")
                .context(MissingEnvVarSnafu)?
                .into(),
        );
        Self::with_credentials(base_url, api_key, secret_key)
    }

    /// Creates a provider with explicit keys instead of reading the environment.
    pub fn with_credentials(
        base_url: &str,
        api_key: SecretString,
        secret_key: SecretString,
    ) -> Result<Self, ProviderInitError> {
        let mut key_header =
            header::HeaderValue::from_str(api_key.expose_secret()).context(InvalidApiKeySnafu)?;
        key_header.set_sensitive(true);
        let mut secret_header = header::HeaderValue::from_str(secret_key.expose_secret())
            .context(InvalidApiKeySnafu)?;
        secret_header.set_sensitive(true);

        let mut headers = header::HeaderMap::new();
        headers.insert("APCA-API-KEY-ID", key_header);
        headers.insert("APCA-API-SECRET-KEY", secret_header);

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .context(ClientBuildSnafu)?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            limiter: RateLimiter::direct(Quota::per_minute(REQUESTS_PER_MINUTE)),
        })
    }

    async fn get(&self, url: &str, query: &[(String, String)]) -> Result<Response, ProviderError> {
        self.limiter.until_ready().await;
        debug!(url, ?query, "alpaca request");
        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .context(ReqwestSnafu)?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown API error".to_string());
            return ApiSnafu {
                status: status.as_u16(),
                message,
            }
            .fail();
        }
        Ok(response)
    }
}

#[async_trait]
impl DataProvider for AlpacaProvider {
    async fn fetch_bars(
        &self,
        mut params: BarsRequestParams,
    ) -> Result<Vec<BarSeries>, ProviderError> {
        validate_timeframe(&params.timeframe)?;
        if params.symbols.is_empty() {
            return ValidationSnafu {
                message: "at least one symbol is required",
            }
            .fail();
        }
        params.symbols = params
            .symbols
            .iter()
            .map(|s| validate_symbol(s))
            .collect::<Result<_, _>>()?;

        let url = join_url(&self.base_url, "/v2/stocks/bars");
        let mut all_bars: IndexMap<String, Vec<AlpacaBar>> = IndexMap::new();
        let mut next_page_token: Option<String> = None;

        for _ in 0..MAX_PAGES {
            let mut query_params = construct_params(&params);
            if let Some(token) = &next_page_token {
                query_params.push(("page_token".to_string(), token.clone()));
            }

            let page = self
                .get(&url, &query_params)
                .await?
                .json::<AlpacaResponse>()
                .await
                .context(ReqwestSnafu)?;

            for (symbol, bars) in page.bars {
                all_bars.entry(symbol).or_default().extend(bars);
            }

            match page.next_page_token {
                Some(token) if !token.is_empty() => next_page_token = Some(token),
                _ => break,
            }
        }

        BarsPayload::Alpaca(AlpacaResponse {
            bars: all_bars,
            next_page_token: None,
        })
        .into_series(params.timeframe)
    }
}

#[async_trait]
impl QuoteProvider for AlpacaProvider {
    async fn fetch_latest_quote(
        &self,
        symbol: &str,
    ) -> Result<Option<LatestQuote>, ProviderError> {
        let symbol = validate_symbol(symbol)?;
        let url = join_url(
            &self.base_url,
            &format!("/v2/stocks/{symbol}/quotes/latest"),
        );
        let response = self
            .get(&url, &[])
            .await?
            .json::<AlpacaLatestQuoteResponse>()
            .await
            .context(ReqwestSnafu)?;
        Ok(response.into_quote())
    }
}
