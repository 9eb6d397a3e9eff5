//! Quote and symbol-search fetches, folded into [`FetchOutcome`].

use crate::{
    models::{quote::LatestQuote, symbol::SymbolMatch},
    outcome::{FetchOutcome, settle},
    providers::{ProviderError, QuoteProvider, SymbolSearch},
};

pub async fn fetch_quote(
    provider: &dyn QuoteProvider,
    symbol: &str,
) -> Result<FetchOutcome<LatestQuote>, ProviderError> {
    let fetched = provider.fetch_latest_quote(symbol).await;
    Ok(match settle("quote", fetched, Option::is_none)? {
        FetchOutcome::Ready(Some(q)) => FetchOutcome::Ready(q),
        FetchOutcome::Ready(None) | FetchOutcome::EmptyResult => FetchOutcome::EmptyResult,
        FetchOutcome::UpstreamUnavailable { reason } => {
            FetchOutcome::UpstreamUnavailable { reason }
        }
    })
}

pub async fn search_symbols(
    search: &dyn SymbolSearch,
    query: &str,
) -> Result<FetchOutcome<Vec<SymbolMatch>>, ProviderError> {
    settle("search", search.search(query).await, Vec::is_empty)
}
