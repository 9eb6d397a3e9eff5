//! Buy/sell records. Append-only; never edited once stored.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use market_data::models::symbol::validate_symbol;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    #[serde(rename = "BUY", alias = "buy", alias = "Buy")]
    Buy,
    #[serde(rename = "SELL", alias = "sell", alias = "Sell")]
    Sell,
}

impl Side {
    pub const fn as_str(self) -> &'static str {
        match self {
            Side::Buy => "BUY",
            Side::Sell => "SELL",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Side {
    type Err = TransactionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "BUY" => Ok(Side::Buy),
            "SELL" => Ok(Side::Sell),
            _ => Err(TransactionError::UnknownSide(s.to_string())),
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum TransactionError {
    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("{field} must be a positive number, got {value}")]
    NotPositive { field: &'static str, value: f64 },

    #[error("invalid symbol: {0}")]
    InvalidSymbol(String),

    #[error("transaction type must be BUY or SELL, got {0:?}")]
    UnknownSide(String),
}

/// A stored transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    pub user_id: String,
    pub symbol: String,
    #[serde(rename = "transactionType")]
    pub side: Side,
    pub quantity: f64,
    pub price: f64,
    #[serde(rename = "transactionTime")]
    pub timestamp: DateTime<Utc>,
}

/// A transaction as submitted, before it has an id or a timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTransaction {
    pub user_id: String,
    pub symbol: String,
    #[serde(rename = "transactionType")]
    pub side: Side,
    pub quantity: f64,
    pub price: f64,
}

impl NewTransaction {
    /// Trims ids, upper-cases the symbol, and rejects anything that cannot be
    /// stored.
    pub fn validate(self) -> Result<Self, TransactionError> {
        let user_id = self.user_id.trim().to_string();
        if user_id.is_empty() {
            return Err(TransactionError::MissingField("userId"));
        }
        if self.symbol.trim().is_empty() {
            return Err(TransactionError::MissingField("symbol"));
        }
        let symbol = validate_symbol(&self.symbol)
            .map_err(|_| TransactionError::InvalidSymbol(self.symbol.clone()))?;
        for (field, value) in [("quantity", self.quantity), ("price", self.price)] {
            if !(value.is_finite() && value > 0.0) {
                return Err(TransactionError::NotPositive { field, value });
            }
        }
        Ok(Self {
            user_id,
            symbol,
            ..self
        })
    }

    /// Stamps the transaction with an id and time.
    pub fn into_transaction(self, id: String, timestamp: DateTime<Utc>) -> Transaction {
        Transaction {
            id,
            user_id: self.user_id,
            symbol: self.symbol,
            side: self.side,
            quantity: self.quantity,
            price: self.price,
            timestamp,
        }
    }
}
