#![allow(dead_code)]

use axum::Router;
use chrono::{TimeZone, Utc};
use portfolio::{
    models::transaction::{NewTransaction, Side, Transaction},
    store::sqlite::SqliteLedger,
};
use tempfile::TempDir;
use tokio::net::TcpListener;

pub struct TestLedger {
    _dir: TempDir, // keep alive for the life of the test
    pub path: String,
    pub ledger: SqliteLedger,
}

pub fn setup_ledger() -> TestLedger {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("ledger.db").to_string_lossy().to_string();
    let ledger = SqliteLedger::open(&path).expect("open ledger");
    TestLedger {
        _dir: dir,
        path,
        ledger,
    }
}

pub fn new_tx(user: &str, symbol: &str, side: Side, quantity: f64, price: f64) -> NewTransaction {
    NewTransaction {
        user_id: user.into(),
        symbol: symbol.into(),
        side,
        quantity,
        price,
    }
}

pub fn tx(symbol: &str, side: Side, quantity: f64, price: f64) -> Transaction {
    new_tx("u1", symbol, side, quantity, price)
        .into_transaction(format!("{symbol}-{quantity}"), Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
}

pub async fn spawn_stub(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}
