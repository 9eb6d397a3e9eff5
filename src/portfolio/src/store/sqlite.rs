//! Local append-only ledger on SQLite.

use anyhow::{Context, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use diesel::prelude::*;
use tracing::debug;
use uuid::Uuid;

use crate::{
    cost_basis::check_append,
    db::{connection::connect_sqlite, migrate},
    models::transaction::{NewTransaction, Side, Transaction},
    schema::transactions,
    store::{PositionStore, StoreError, TransactionPage},
};

#[derive(Queryable, Selectable, Debug)]
#[diesel(table_name = transactions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
struct TransactionRow {
    id: String,
    user_id: String,
    symbol: String,
    side: String,
    quantity: f64,
    price: f64,
    transaction_time: String, // RFC3339 UTC
}

impl TryFrom<TransactionRow> for Transaction {
    type Error = anyhow::Error;

    fn try_from(row: TransactionRow) -> anyhow::Result<Self> {
        let side: Side = row.side.parse()?;
        let timestamp = DateTime::parse_from_rfc3339(&row.transaction_time)
            .with_context(|| format!("bad transaction_time on {}", row.id))?
            .with_timezone(&Utc);
        Ok(Transaction {
            id: row.id,
            user_id: row.user_id,
            symbol: row.symbol,
            side,
            quantity: row.quantity,
            price: row.price,
            timestamp,
        })
    }
}

#[derive(Insertable)]
#[diesel(table_name = transactions)]
struct NewTransactionRow<'a> {
    id: &'a str,
    user_id: &'a str,
    symbol: &'a str,
    side: &'a str,
    quantity: f64,
    price: f64,
    transaction_time: &'a str,
}

/// Transactions in a local SQLite file. Each call opens its own connection on
/// the blocking pool.
pub struct SqliteLedger {
    database_url: String,
}

impl SqliteLedger {
    /// Opens the ledger, creating and migrating the file if needed.
    pub fn open(database_url: &str) -> anyhow::Result<Self> {
        migrate::run_sqlite(database_url)
            .with_context(|| format!("migrate ledger at {database_url}"))?;
        Ok(Self {
            database_url: database_url.to_string(),
        })
    }

    async fn with_conn<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&mut SqliteConnection) -> anyhow::Result<T> + Send + 'static,
    {
        let url = self.database_url.clone();
        let joined = tokio::task::spawn_blocking(move || {
            let mut conn = connect_sqlite(&url)?;
            f(&mut conn)
        })
        .await
        .map_err(|e| anyhow!("ledger task failed: {e}"))?;
        Ok(joined?)
    }
}

fn load(rows: Vec<TransactionRow>) -> anyhow::Result<Vec<Transaction>> {
    rows.into_iter().map(Transaction::try_from).collect()
}

fn history(conn: &mut SqliteConnection, user: &str) -> anyhow::Result<Vec<Transaction>> {
    use crate::schema::transactions::dsl as t;
    let rows = t::transactions
        .filter(t::user_id.eq(user))
        .order(t::seq.asc())
        .select(TransactionRow::as_select())
        .load(conn)?;
    load(rows)
}

fn insert(conn: &mut SqliteConnection, tx: &Transaction) -> anyhow::Result<()> {
    let time = tx.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true);
    let row = NewTransactionRow {
        id: &tx.id,
        user_id: &tx.user_id,
        symbol: &tx.symbol,
        side: tx.side.as_str(),
        quantity: tx.quantity,
        price: tx.price,
        transaction_time: &time,
    };
    diesel::insert_into(transactions::table)
        .values(&row)
        .execute(conn)?;
    Ok(())
}

#[async_trait]
impl PositionStore for SqliteLedger {
    async fn list(&self, user_id: &str) -> Result<Vec<Transaction>, StoreError> {
        let user = user_id.to_string();
        self.with_conn(move |conn| history(conn, &user)).await
    }

    async fn list_page(
        &self,
        user_id: &str,
        limit: u32,
        offset: u32,
    ) -> Result<TransactionPage, StoreError> {
        let user = user_id.to_string();
        let transactions = self
            .with_conn(move |conn| {
                use crate::schema::transactions::dsl as t;
                let rows = t::transactions
                    .filter(t::user_id.eq(user.as_str()))
                    .order(t::seq.desc())
                    .limit(i64::from(limit))
                    .offset(i64::from(offset))
                    .select(TransactionRow::as_select())
                    .load(conn)?;
                load(rows)
            })
            .await?;
        Ok(TransactionPage::new(transactions))
    }

    async fn append(&self, new: NewTransaction) -> Result<Transaction, StoreError> {
        let tx = new.into_transaction(Uuid::new_v4().to_string(), Utc::now());
        let stored = tx.clone();
        self.with_conn(move |conn| insert(conn, &tx)).await?;
        debug!(id = %stored.id, symbol = %stored.symbol, side = %stored.side, "ledger append");
        Ok(stored)
    }

    /// History read, check and insert share one `BEGIN IMMEDIATE`
    /// transaction, so concurrent writers queue on the SQLite write lock.
    async fn append_checked(&self, new: NewTransaction) -> Result<Transaction, StoreError> {
        let tx = new
            .clone()
            .into_transaction(Uuid::new_v4().to_string(), Utc::now());
        let stored = tx.clone();
        let verdict = self
            .with_conn(move |conn| {
                conn.immediate_transaction::<_, anyhow::Error, _>(|conn| {
                    let past = history(conn, &new.user_id)?;
                    if let Err(oversell) = check_append(&past, &new) {
                        return Ok(Err(oversell));
                    }
                    insert(conn, &tx)?;
                    Ok(Ok(()))
                })
            })
            .await?;
        verdict?;
        debug!(id = %stored.id, symbol = %stored.symbol, side = %stored.side, "ledger checked append");
        Ok(stored)
    }
}
