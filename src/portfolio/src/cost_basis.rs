//! Average-cost position keeping.
//!
//! Every held unit of a symbol shares one running average price. A buy adds
//! its cost; a sell removes units at the average in effect before the sell,
//! so selling never changes the average of what is left. Selling more than
//! is held is an error, never clamped.

use indexmap::IndexMap;
use serde::Serialize;
use thiserror::Error;

use crate::models::transaction::{NewTransaction, Side, Transaction};

/// Quantities within this distance of zero count as flat.
pub const QUANTITY_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioPosition {
    pub symbol: String,
    pub quantity: f64,
    pub total_cost: f64,
    /// `None` while the position is flat.
    pub average_cost: Option<f64>,
}

impl PortfolioPosition {
    pub fn is_flat(&self) -> bool {
        self.quantity <= QUANTITY_EPSILON
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum CostBasisError {
    #[error(
        "cannot sell {requested} {symbol} at transaction {index}: only {held} held"
    )]
    OverSell {
        symbol: String,
        index: usize,
        requested: f64,
        held: f64,
    },
}

#[derive(Debug, Default, Clone, Copy)]
struct Lot {
    quantity: f64,
    total_cost: f64,
}

impl Lot {
    fn apply(
        &mut self,
        symbol: &str,
        index: usize,
        side: Side,
        quantity: f64,
        price: f64,
    ) -> Result<(), CostBasisError> {
        match side {
            Side::Buy => {
                self.quantity += quantity;
                self.total_cost += quantity * price;
            }
            Side::Sell => {
                if quantity > self.quantity + QUANTITY_EPSILON {
                    return Err(CostBasisError::OverSell {
                        symbol: symbol.to_string(),
                        index,
                        requested: quantity,
                        held: self.quantity,
                    });
                }
                if self.quantity > 0.0 {
                    let average = self.total_cost / self.quantity;
                    self.total_cost -= quantity * average;
                }
                self.quantity -= quantity;
            }
        }
        if self.quantity.abs() <= QUANTITY_EPSILON {
            *self = Lot::default();
        }
        Ok(())
    }

    fn into_position(self, symbol: String) -> PortfolioPosition {
        let average_cost = (self.quantity > 0.0).then(|| self.total_cost / self.quantity);
        PortfolioPosition {
            symbol,
            quantity: self.quantity,
            total_cost: self.total_cost,
            average_cost,
        }
    }
}

fn symbol_key(symbol: &str) -> String {
    symbol.trim().to_ascii_uppercase()
}

/// Folds the transactions for `symbol` (case-insensitive) in slice order.
///
/// On an oversell, `index` is the offending transaction's position in
/// `transactions`.
pub fn aggregate(
    symbol: &str,
    transactions: &[Transaction],
) -> Result<PortfolioPosition, CostBasisError> {
    let key = symbol_key(symbol);
    let mut lot = Lot::default();
    for (index, tx) in transactions.iter().enumerate() {
        if symbol_key(&tx.symbol) == key {
            lot.apply(&key, index, tx.side, tx.quantity, tx.price)?;
        }
    }
    Ok(lot.into_position(key))
}

/// One position per symbol in first-seen order. Flat positions are left out.
pub fn aggregate_all(
    transactions: &[Transaction],
) -> Result<Vec<PortfolioPosition>, CostBasisError> {
    let mut lots: IndexMap<String, Lot> = IndexMap::new();
    for (index, tx) in transactions.iter().enumerate() {
        let key = symbol_key(&tx.symbol);
        let lot = lots.entry(key.clone()).or_default();
        lot.apply(&key, index, tx.side, tx.quantity, tx.price)?;
    }
    Ok(lots
        .into_iter()
        .map(|(symbol, lot)| lot.into_position(symbol))
        .filter(|p| !p.is_flat())
        .collect())
}

/// Checks that `candidate` can follow `history` without overselling.
pub fn check_append(
    history: &[Transaction],
    candidate: &NewTransaction,
) -> Result<(), CostBasisError> {
    if candidate.side == Side::Buy {
        return Ok(());
    }
    let key = symbol_key(&candidate.symbol);
    let mut lot = Lot::default();
    for (index, tx) in history.iter().enumerate() {
        if symbol_key(&tx.symbol) == key {
            lot.apply(&key, index, tx.side, tx.quantity, tx.price)?;
        }
    }
    lot.apply(
        &key,
        history.len(),
        candidate.side,
        candidate.quantity,
        candidate.price,
    )
}
