//! Recording transactions and deriving positions through a [`PositionStore`].

use thiserror::Error;
use tracing::info;

use crate::{
    cost_basis::{CostBasisError, PortfolioPosition, aggregate_all},
    models::transaction::{NewTransaction, Side, Transaction, TransactionError},
    store::{PositionStore, StoreError},
};

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error(transparent)]
    Invalid(#[from] TransactionError),

    #[error(transparent)]
    CostBasis(#[from] CostBasisError),

    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for LedgerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::OverSell(oversell) => LedgerError::CostBasis(oversell),
            other => LedgerError::Store(other),
        }
    }
}

/// Validates and stores `new`. A sell that would take the position below
/// zero is rejected before anything is written; the store runs that check
/// and the write as one step.
pub async fn record(
    store: &dyn PositionStore,
    new: NewTransaction,
) -> Result<Transaction, LedgerError> {
    let new = new.validate()?;
    let stored = match new.side {
        Side::Sell => store.append_checked(new).await?,
        Side::Buy => store.append(new).await?,
    };
    info!(
        id = %stored.id,
        user = %stored.user_id,
        symbol = %stored.symbol,
        side = %stored.side,
        quantity = stored.quantity,
        "transaction recorded"
    );
    Ok(stored)
}

/// Open positions of `user_id`, one per symbol in first-traded order.
pub async fn positions(
    store: &dyn PositionStore,
    user_id: &str,
) -> Result<Vec<PortfolioPosition>, LedgerError> {
    let history = store.list(user_id).await?;
    Ok(aggregate_all(&history)?)
}
