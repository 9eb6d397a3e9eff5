use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use chrono::Utc;
use market_data::{
    chart::{Chart, fetch_chart, fetch_mini_chart},
    lookup::{fetch_quote, search_symbols},
    models::{quote::LatestQuote, symbol::SymbolMatch},
    outcome::FetchOutcome,
    range::{ChartRange, RangeSpec},
};
use serde::Deserialize;

use super::{
    AppState,
    error::{ApiResult, api_err, provider_err},
};

#[derive(Debug, Deserialize)]
pub struct ChartQuery {
    pub symbol: Option<String>,
    pub range: Option<String>,
    pub interval: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SymbolQuery {
    pub symbol: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

/// Range and interval tokens for a chart request. A known range with no
/// interval gets its suggested pairing.
pub(crate) fn chart_tokens(range: Option<&str>, interval: Option<&str>) -> (String, String) {
    match (range, interval) {
        (Some(r), Some(i)) => (r.to_string(), i.to_string()),
        (Some(r), None) => match ChartRange::parse(r) {
            Some(parsed) => (
                r.to_string(),
                RangeSpec::suggested_for(parsed).interval.token().to_string(),
            ),
            None => (r.to_string(), RangeSpec::DEFAULT.interval.token().to_string()),
        },
        (None, Some(i)) => (RangeSpec::DEFAULT.range.token().to_string(), i.to_string()),
        (None, None) => (
            RangeSpec::DEFAULT.range.token().to_string(),
            RangeSpec::DEFAULT.interval.token().to_string(),
        ),
    }
}

fn required_symbol(symbol: Option<String>) -> ApiResult<String> {
    match symbol {
        Some(s) if !s.trim().is_empty() => Ok(s),
        _ => Err(api_err(StatusCode::BAD_REQUEST, "symbol is required")),
    }
}

fn ready_or_status<T>(what: &str, outcome: FetchOutcome<T>) -> ApiResult<T> {
    match outcome {
        FetchOutcome::Ready(v) => Ok(v),
        FetchOutcome::EmptyResult => {
            Err(api_err(StatusCode::NOT_FOUND, &format!("no {what} data")))
        }
        FetchOutcome::UpstreamUnavailable { reason } => Err(api_err(
            StatusCode::BAD_GATEWAY,
            &format!("{what} upstream unavailable: {reason}"),
        )),
    }
}

pub async fn chart(
    State(state): State<AppState>,
    Query(query): Query<ChartQuery>,
) -> ApiResult<Json<Chart>> {
    let symbol = required_symbol(query.symbol)?;
    let (range, interval) = chart_tokens(query.range.as_deref(), query.interval.as_deref());
    let outcome = fetch_chart(
        state.bars.as_ref(),
        &symbol,
        &range,
        &interval,
        Utc::now(),
        state.display_tz,
    )
    .await
    .map_err(provider_err)?;
    ready_or_status("chart", outcome).map(Json)
}

pub async fn mini_chart(
    State(state): State<AppState>,
    Query(query): Query<SymbolQuery>,
) -> ApiResult<Json<Chart>> {
    let symbol = required_symbol(query.symbol)?;
    let outcome = fetch_mini_chart(state.bars.as_ref(), &symbol, Utc::now(), state.display_tz)
        .await
        .map_err(provider_err)?;
    ready_or_status("chart", outcome).map(Json)
}

pub async fn quote(
    State(state): State<AppState>,
    Query(query): Query<SymbolQuery>,
) -> ApiResult<Json<LatestQuote>> {
    let symbol = required_symbol(query.symbol)?;
    let Some(quotes) = state.quotes.as_ref() else {
        return Err(api_err(
            StatusCode::SERVICE_UNAVAILABLE,
            "latest quotes are not configured",
        ));
    };
    let outcome = fetch_quote(quotes.as_ref(), &symbol)
        .await
        .map_err(provider_err)?;
    ready_or_status("quote", outcome).map(Json)
}

/// An empty or unreachable search answers `[]` so autocomplete stays quiet.
pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Json<Vec<SymbolMatch>>> {
    if query.q.trim().is_empty() {
        return Ok(Json(Vec::new()));
    }
    let outcome = search_symbols(state.search.as_ref(), &query.q)
        .await
        .map_err(provider_err)?;
    Ok(Json(outcome.ready().unwrap_or_default()))
}
