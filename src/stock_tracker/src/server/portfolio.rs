use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
};
use market_data::{lookup::fetch_quote, providers::QuoteProvider};
use portfolio::{
    cost_basis::PortfolioPosition,
    ledger::{self, LedgerError},
    models::transaction::{NewTransaction, Transaction},
    store::TransactionPage,
    valuation::{Valuation, value_position},
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{
    AppState,
    error::{ApiResult, api_err, ledger_err},
};

const DEFAULT_PAGE_LIMIT: u32 = 10;
const MAX_PAGE_LIMIT: u32 = 100;

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Holding {
    #[serde(flatten)]
    pub position: PortfolioPosition,
    /// Missing when no quote could be had for the symbol.
    pub valuation: Option<Valuation>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioView {
    pub user_id: String,
    pub holdings: Vec<Holding>,
}

pub async fn list_transactions(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(page): Query<PageQuery>,
) -> ApiResult<Json<TransactionPage>> {
    let limit = page.limit.unwrap_or(DEFAULT_PAGE_LIMIT).clamp(1, MAX_PAGE_LIMIT);
    let offset = page.offset.unwrap_or(0);
    state
        .store
        .list_page(&user_id, limit, offset)
        .await
        .map(Json)
        .map_err(|e| ledger_err(LedgerError::from(e)))
}

pub async fn create_transaction(
    State(state): State<AppState>,
    body: Result<Json<NewTransaction>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Transaction>)> {
    let Json(new) = body.map_err(|e| api_err(StatusCode::BAD_REQUEST, &e.body_text()))?;
    let stored = ledger::record(state.store.as_ref(), new)
        .await
        .map_err(ledger_err)?;
    Ok((StatusCode::CREATED, Json(stored)))
}

pub async fn portfolio(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<PortfolioView>> {
    let positions = ledger::positions(state.store.as_ref(), &user_id)
        .await
        .map_err(ledger_err)?;

    let mut holdings = Vec::with_capacity(positions.len());
    for position in positions {
        let valuation = match state.quotes.as_deref() {
            Some(quotes) => valuation_for(quotes, &position).await,
            None => None,
        };
        holdings.push(Holding {
            position,
            valuation,
        });
    }
    Ok(Json(PortfolioView { user_id, holdings }))
}

async fn valuation_for(
    quotes: &dyn QuoteProvider,
    position: &PortfolioPosition,
) -> Option<Valuation> {
    match fetch_quote(quotes, &position.symbol).await {
        Ok(outcome) => outcome
            .ready()
            .and_then(|quote| value_position(position, &quote)),
        Err(e) => {
            debug!(symbol = %position.symbol, error = %e, "no quote for holding");
            None
        }
    }
}
