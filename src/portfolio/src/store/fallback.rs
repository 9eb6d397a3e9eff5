use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::warn;

use crate::{
    cost_basis::check_append,
    models::transaction::{NewTransaction, Transaction},
    store::{PositionStore, StoreError, TransactionPage},
};

/// Uses `remote` while it answers and `local` while it is unavailable.
///
/// Only [`StoreError::Unavailable`] triggers the fallback; a rejection or a
/// missing stock from the remote is returned as is.
///
/// A checked append picks its store when it reads history: once the remote
/// has answered, the write goes to the remote or fails, never to `local`.
pub struct FallbackStore {
    remote: Arc<dyn PositionStore>,
    local: Arc<dyn PositionStore>,
    append_lock: Mutex<()>,
}

impl FallbackStore {
    pub fn new(remote: Arc<dyn PositionStore>, local: Arc<dyn PositionStore>) -> Self {
        Self {
            remote,
            local,
            append_lock: Mutex::new(()),
        }
    }
}

fn falling_back(op: &str, reason: &str) {
    warn!(op, reason, "remote store unavailable, using local ledger");
}

#[async_trait]
impl PositionStore for FallbackStore {
    async fn list(&self, user_id: &str) -> Result<Vec<Transaction>, StoreError> {
        match self.remote.list(user_id).await {
            Err(StoreError::Unavailable(reason)) => {
                falling_back("list", &reason);
                self.local.list(user_id).await
            }
            other => other,
        }
    }

    async fn list_page(
        &self,
        user_id: &str,
        limit: u32,
        offset: u32,
    ) -> Result<TransactionPage, StoreError> {
        match self.remote.list_page(user_id, limit, offset).await {
            Err(StoreError::Unavailable(reason)) => {
                falling_back("list_page", &reason);
                self.local.list_page(user_id, limit, offset).await
            }
            other => other,
        }
    }

    async fn append(&self, new: NewTransaction) -> Result<Transaction, StoreError> {
        match self.remote.append(new.clone()).await {
            Err(StoreError::Unavailable(reason)) => {
                falling_back("append", &reason);
                self.local.append(new).await
            }
            other => other,
        }
    }

    async fn append_checked(&self, new: NewTransaction) -> Result<Transaction, StoreError> {
        let _guard = self.append_lock.lock().await;
        match self.remote.list(&new.user_id).await {
            Ok(history) => {
                check_append(&history, &new)?;
                self.remote.append(new).await
            }
            Err(StoreError::Unavailable(reason)) => {
                falling_back("append_checked", &reason);
                self.local.append_checked(new).await
            }
            Err(e) => Err(e),
        }
    }
}
