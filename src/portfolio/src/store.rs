//! Where transactions live.
//!
//! [`PositionStore`] is implemented by a local SQLite ledger, a client for
//! the remote backend service, and a fallback that prefers the remote and
//! drops to the local ledger while the remote is unreachable.

pub mod backend;
pub mod config;
pub mod fallback;
pub mod sqlite;

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::{
    cost_basis::CostBasisError,
    models::transaction::{NewTransaction, Transaction},
};

use self::{
    backend::BackendStore,
    config::{StoreConfig, StoreKind},
    fallback::FallbackStore,
    sqlite::SqliteLedger,
};

#[derive(Debug, Error)]
pub enum StoreError {
    /// Transport failure or a 5xx. The only error the fallback store retries
    /// against the local ledger.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("store rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// The append was refused because it would sell more than is held.
    #[error(transparent)]
    OverSell(#[from] CostBasisError),

    #[error(transparent)]
    Database(#[from] anyhow::Error),
}

/// One page of history, newest first. `count` is the number of
/// transactions in this page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionPage {
    pub transactions: Vec<Transaction>,
    pub count: usize,
}

impl TransactionPage {
    pub fn new(transactions: Vec<Transaction>) -> Self {
        let count = transactions.len();
        Self {
            transactions,
            count,
        }
    }
}

#[async_trait]
pub trait PositionStore: Send + Sync {
    /// Every transaction of `user_id`, oldest first.
    async fn list(&self, user_id: &str) -> Result<Vec<Transaction>, StoreError>;

    /// At most `limit` transactions after skipping `offset`, newest first.
    async fn list_page(
        &self,
        user_id: &str,
        limit: u32,
        offset: u32,
    ) -> Result<TransactionPage, StoreError>;

    /// Stores a validated transaction and returns it with its id and time.
    async fn append(&self, new: NewTransaction) -> Result<Transaction, StoreError>;

    /// Like [`append`](Self::append), but first checks `new` against the
    /// user's stored history with [`check_append`](crate::cost_basis::check_append).
    /// No other checked append through this store runs between the check
    /// and the write, and both hit the same backing store.
    async fn append_checked(&self, new: NewTransaction) -> Result<Transaction, StoreError>;
}

/// Builds the store selected by `config.kind`.
pub fn build_store(config: &StoreConfig) -> anyhow::Result<Arc<dyn PositionStore>> {
    info!(kind = ?config.kind, "opening transaction store");
    Ok(match config.kind {
        StoreKind::Local => Arc::new(SqliteLedger::open(&config.database_url)?),
        StoreKind::Remote => Arc::new(BackendStore::new(&config.backend_url, config.page_size)?),
        StoreKind::Fallback => Arc::new(FallbackStore::new(
            Arc::new(BackendStore::new(&config.backend_url, config.page_size)?),
            Arc::new(SqliteLedger::open(&config.database_url)?),
        )),
    })
}
