//! Client for the remote backend service that owns users, stocks and
//! transactions.
//!
//! The backend keys transactions by stock id, so this store keeps a small
//! id/symbol cache and resolves in both directions.

use std::{collections::HashMap, time::Duration};

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use crate::{
    cost_basis::check_append,
    models::transaction::{NewTransaction, Side, Transaction},
    store::{PositionStore, StoreError, TransactionPage},
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Hard stop on history paging so a backend that ignores `offset` cannot
/// loop forever.
const MAX_PAGES: usize = 1_000;

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct StockDto {
    id: String,
    symbol: String,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct BackendTransaction {
    id: String,
    user_id: String,
    stock_id: String,
    transaction_type: Side,
    quantity: f64,
    price: f64,
    transaction_time: DateTime<Utc>,
}

#[derive(Deserialize, Debug)]
struct TransactionsEnvelope {
    // The backend sends `null` rather than `[]` for an empty page.
    #[serde(default)]
    transactions: Option<Vec<BackendTransaction>>,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct CreateTransaction<'a> {
    user_id: &'a str,
    stock_id: &'a str,
    transaction_type: Side,
    quantity: f64,
    price: f64,
}

#[derive(Default)]
struct StockCache {
    symbol_by_id: HashMap<String, String>,
    id_by_symbol: HashMap<String, String>,
}

pub struct BackendStore {
    client: Client,
    base_url: String,
    page_size: u32,
    stocks: RwLock<StockCache>,
    /// Serializes checked appends made through this client.
    append_lock: Mutex<()>,
}

fn unavailable(err: reqwest::Error) -> StoreError {
    StoreError::Unavailable(err.to_string())
}

async fn check(response: Response) -> Result<Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    Err(match status {
        StatusCode::NOT_FOUND => StoreError::NotFound(message),
        s if s.is_server_error() => StoreError::Unavailable(format!("{s}: {message}")),
        s => StoreError::Rejected {
            status: s.as_u16(),
            message,
        },
    })
}

impl BackendStore {
    pub fn new(base_url: &str, page_size: u32) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("build backend HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            page_size: page_size.max(1),
            stocks: RwLock::new(StockCache::default()),
            append_lock: Mutex::new(()),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn remember(&self, stock: StockDto) -> String {
        let mut cache = self.stocks.write().await;
        cache
            .id_by_symbol
            .insert(stock.symbol.to_ascii_uppercase(), stock.id.clone());
        cache.symbol_by_id.insert(stock.id, stock.symbol.clone());
        stock.symbol
    }

    async fn stock_id(&self, symbol: &str) -> Result<String, StoreError> {
        let key = symbol.to_ascii_uppercase();
        if let Some(id) = self.stocks.read().await.id_by_symbol.get(&key) {
            return Ok(id.clone());
        }
        let url = self.url(&format!("/api/stocks/symbol/{key}"));
        debug!(%url, "resolve stock id");
        let response = self.client.get(&url).send().await.map_err(unavailable)?;
        let stock: StockDto = match check(response).await {
            Ok(r) => r.json().await.map_err(unavailable)?,
            Err(StoreError::NotFound(_)) => {
                return Err(StoreError::NotFound(format!("stock {key}")));
            }
            Err(e) => return Err(e),
        };
        let id = stock.id.clone();
        self.remember(stock).await;
        Ok(id)
    }

    async fn symbol(&self, stock_id: &str) -> Result<String, StoreError> {
        if let Some(symbol) = self.stocks.read().await.symbol_by_id.get(stock_id) {
            return Ok(symbol.clone());
        }
        let url = self.url(&format!("/api/stocks/{stock_id}"));
        debug!(%url, "resolve stock symbol");
        let response = self.client.get(&url).send().await.map_err(unavailable)?;
        let stock: StockDto = check(response).await?.json().await.map_err(unavailable)?;
        Ok(self.remember(stock).await)
    }

    async fn resolve_transaction(&self, raw: BackendTransaction) -> Result<Transaction, StoreError> {
        let symbol = self.symbol(&raw.stock_id).await?;
        Ok(Transaction {
            id: raw.id,
            user_id: raw.user_id,
            symbol,
            side: raw.transaction_type,
            quantity: raw.quantity,
            price: raw.price,
            timestamp: raw.transaction_time,
        })
    }

    async fn fetch_page(
        &self,
        user_id: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<Transaction>, StoreError> {
        let url = self.url(&format!("/api/user/{user_id}/transactions"));
        debug!(%url, limit, offset, "list transactions");
        let response = self
            .client
            .get(&url)
            .query(&[("limit", limit), ("offset", offset)])
            .send()
            .await
            .map_err(unavailable)?;
        let envelope: TransactionsEnvelope =
            check(response).await?.json().await.map_err(unavailable)?;

        let mut out = Vec::new();
        for raw in envelope.transactions.unwrap_or_default() {
            out.push(self.resolve_transaction(raw).await?);
        }
        Ok(out)
    }
}

#[async_trait]
impl PositionStore for BackendStore {
    async fn list(&self, user_id: &str) -> Result<Vec<Transaction>, StoreError> {
        let mut all = Vec::new();
        let mut offset = 0u32;
        for _ in 0..MAX_PAGES {
            let page = self.fetch_page(user_id, self.page_size, offset).await?;
            let len = page.len();
            all.extend(page);
            if len < self.page_size as usize {
                // Backend pages are newest first.
                all.reverse();
                return Ok(all);
            }
            offset = offset.saturating_add(self.page_size);
        }
        Err(StoreError::Unavailable(format!(
            "transaction history of {user_id} did not end after {MAX_PAGES} pages"
        )))
    }

    async fn list_page(
        &self,
        user_id: &str,
        limit: u32,
        offset: u32,
    ) -> Result<TransactionPage, StoreError> {
        Ok(TransactionPage::new(
            self.fetch_page(user_id, limit, offset).await?,
        ))
    }

    async fn append(&self, new: NewTransaction) -> Result<Transaction, StoreError> {
        let stock_id = self.stock_id(&new.symbol).await?;
        let body = CreateTransaction {
            user_id: &new.user_id,
            stock_id: &stock_id,
            transaction_type: new.side,
            quantity: new.quantity,
            price: new.price,
        };
        let response = self
            .client
            .post(self.url("/api/transactions"))
            .json(&body)
            .send()
            .await
            .map_err(unavailable)?;
        let created: BackendTransaction =
            check(response).await?.json().await.map_err(unavailable)?;
        self.resolve_transaction(created).await
    }

    /// The backend cannot check and write in one request, so checked appends
    /// through this client are serialized. Writers in other processes are not.
    async fn append_checked(&self, new: NewTransaction) -> Result<Transaction, StoreError> {
        let _guard = self.append_lock.lock().await;
        let history = self.list(&new.user_id).await?;
        check_append(&history, &new)?;
        self.append(new).await
    }
}
