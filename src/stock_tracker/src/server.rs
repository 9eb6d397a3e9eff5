//! HTTP proxy in front of the market-data vendors and the transaction store.

mod error;
mod market;
mod portfolio;

use std::sync::Arc;

use anyhow::Context;
use axum::{
    Json, Router,
    routing::{get, post},
};
use chrono_tz::Tz;
use market_data::providers::{
    DataProvider, QuoteProvider, SymbolSearch, build_bars_provider, build_quote_provider,
    build_symbol_search,
};
use ::portfolio::store::{PositionStore, build_store};
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

use crate::config::AppConfig;

pub use error::ApiError;

#[derive(Clone)]
pub struct AppState {
    pub bars: Arc<dyn DataProvider>,
    /// Absent when no quote vendor could be set up (e.g. no Alpaca keys).
    pub quotes: Option<Arc<dyn QuoteProvider>>,
    pub search: Arc<dyn SymbolSearch>,
    pub store: Arc<dyn PositionStore>,
    pub display_tz: Tz,
}

impl AppState {
    pub fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let endpoints = config.endpoints();
        let bars = build_bars_provider(config.market_data.provider, &endpoints)
            .with_context(|| format!("set up {} bar provider", config.market_data.provider))?;
        let quotes = match build_quote_provider(&endpoints) {
            Ok(q) => Some(q),
            Err(e) => {
                warn!(error = %e, "latest quotes disabled");
                None
            }
        };
        let search = build_symbol_search(&endpoints).context("set up symbol search")?;
        let store = build_store(&config.store)?;
        Ok(Self {
            bars,
            quotes,
            search,
            store,
            display_tz: config.display_tz()?,
        })
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/chart", get(market::chart))
        .route("/api/chart/mini", get(market::mini_chart))
        .route("/api/quote", get(market::quote))
        .route("/api/search", get(market::search))
        .route("/api/transactions", post(portfolio::create_transaction))
        .route("/api/transactions/:user_id", get(portfolio::list_transactions))
        .route("/api/portfolio/:user_id", get(portfolio::portfolio))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn serve(state: AppState, listener: TcpListener) -> anyhow::Result<()> {
    let addr = listener.local_addr()?;
    info!("stock tracker listening on http://{addr}");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "ok": true }))
}
