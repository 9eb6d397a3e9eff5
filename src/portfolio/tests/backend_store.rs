use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use async_trait::async_trait;
use portfolio::{
    cost_basis::CostBasisError,
    ledger::{self, LedgerError},
    models::transaction::{NewTransaction, Side, Transaction},
    store::{
        PositionStore, StoreError, TransactionPage, backend::BackendStore,
        fallback::FallbackStore,
    },
};
use serde_json::{Value, json};

mod common;
use common::{new_tx, setup_ledger, spawn_stub, tx};

#[derive(Clone, Default)]
struct Backend {
    rows: Arc<Mutex<Vec<Value>>>,
}

fn stocks() -> HashMap<&'static str, &'static str> {
    HashMap::from([("AAPL", "stock-aapl"), ("MSFT", "stock-msft")])
}

async fn stock_by_symbol(Path(symbol): Path<String>) -> Result<Json<Value>, StatusCode> {
    let id = stocks().get(symbol.as_str()).copied().ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(json!({"id": id, "symbol": symbol, "name": symbol, "createdAt": "2024-01-01T00:00:00Z"})))
}

async fn stock_by_id(Path(id): Path<String>) -> Result<Json<Value>, StatusCode> {
    let (symbol, _) = stocks()
        .into_iter()
        .find(|(_, v)| *v == id)
        .ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(json!({"id": id, "symbol": symbol, "name": symbol, "createdAt": "2024-01-01T00:00:00Z"})))
}

async fn create(State(b): State<Backend>, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    let mut rows = b.rows.lock().unwrap();
    let n = rows.len();
    let row = json!({
        "id": format!("tx-{n}"),
        "userId": body["userId"],
        "stockId": body["stockId"],
        "transactionType": body["transactionType"],
        "quantity": body["quantity"],
        "price": body["price"],
        "transactionTime": format!("2024-02-01T10:00:{n:02}.123456789Z"),
    });
    rows.push(row.clone());
    (StatusCode::CREATED, Json(row))
}

async fn list(
    State(b): State<Backend>,
    Path(user): Path<String>,
    Query(q): Query<HashMap<String, usize>>,
) -> Json<Value> {
    let limit = q.get("limit").copied().unwrap_or(10);
    let offset = q.get("offset").copied().unwrap_or(0);
    let rows = b.rows.lock().unwrap();
    let page: Vec<Value> = rows
        .iter()
        .rev()
        .filter(|r| r["userId"] == user.as_str())
        .skip(offset)
        .take(limit)
        .cloned()
        .collect();
    if page.is_empty() {
        return Json(json!({"transactions": null, "count": 0}));
    }
    let count = page.len();
    Json(json!({"transactions": page, "count": count}))
}

async fn backend() -> (String, Backend) {
    let state = Backend::default();
    let router = Router::new()
        .route("/api/stocks/symbol/:symbol", get(stock_by_symbol))
        .route("/api/stocks/:id", get(stock_by_id))
        .route("/api/transactions", post(create))
        .route("/api/user/:user/transactions", get(list))
        .with_state(state.clone());
    (spawn_stub(router).await, state)
}

#[tokio::test]
async fn append_resolves_stock_id() {
    let (url, state) = backend().await;
    let store = BackendStore::new(&url, 2).unwrap();

    let stored = store
        .append(new_tx("u1", "AAPL", Side::Buy, 3.0, 150.0))
        .await
        .unwrap();
    assert_eq!(stored.symbol, "AAPL");
    assert_eq!(stored.side, Side::Buy);
    assert_eq!(state.rows.lock().unwrap()[0]["stockId"], "stock-aapl");
}

#[tokio::test]
async fn list_pages_through_history_oldest_first() {
    let (url, _state) = backend().await;
    let store = BackendStore::new(&url, 2).unwrap();
    for (symbol, q) in [("AAPL", 1.0), ("MSFT", 2.0), ("AAPL", 3.0), ("MSFT", 4.0), ("AAPL", 5.0)] {
        store.append(new_tx("u1", symbol, Side::Buy, q, 10.0)).await.unwrap();
    }
    store.append(new_tx("u2", "AAPL", Side::Buy, 9.0, 10.0)).await.unwrap();

    let all = store.list("u1").await.unwrap();
    let quantities: Vec<_> = all.iter().map(|t| t.quantity).collect();
    assert_eq!(quantities, [1.0, 2.0, 3.0, 4.0, 5.0]);
    assert_eq!(all[1].symbol, "MSFT");

    let page = store.list_page("u1", 2, 0).await.unwrap();
    assert_eq!(page.count, 2);
    assert_eq!(page.transactions[0].quantity, 5.0);

    assert!(store.list("nobody").await.unwrap().is_empty());
}

#[tokio::test]
async fn unknown_stock_is_not_found() {
    let (url, _state) = backend().await;
    let store = BackendStore::new(&url, 10).unwrap();
    let err = store
        .append(new_tx("u1", "ZZZZ", Side::Buy, 1.0, 1.0))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound(m) if m.contains("ZZZZ")));
}

#[tokio::test]
async fn unreachable_backend_is_unavailable() {
    let store = BackendStore::new("http://127.0.0.1:9", 10).unwrap();
    let err = store.list("u1").await.unwrap_err();
    assert!(matches!(err, StoreError::Unavailable(_)));
}

#[tokio::test]
async fn fallback_uses_local_ledger_when_remote_is_down() {
    let db = setup_ledger();
    let store = FallbackStore::new(
        Arc::new(BackendStore::new("http://127.0.0.1:9", 10).unwrap()),
        Arc::new(db.ledger),
    );

    let stored = store
        .append(new_tx("u1", "AAPL", Side::Buy, 1.0, 100.0))
        .await
        .unwrap();
    assert_eq!(stored.symbol, "AAPL");
    assert_eq!(store.list("u1").await.unwrap().len(), 1);
}

#[tokio::test]
async fn fallback_prefers_remote() {
    let (url, state) = backend().await;
    let db = setup_ledger();
    let store = FallbackStore::new(
        Arc::new(BackendStore::new(&url, 10).unwrap()),
        Arc::new(portfolio::store::sqlite::SqliteLedger::open(&db.path).unwrap()),
    );
    store.append(new_tx("u1", "MSFT", Side::Buy, 1.0, 1.0)).await.unwrap();
    assert_eq!(state.rows.lock().unwrap().len(), 1);
    assert!(db.ledger.list("u1").await.unwrap().is_empty());
}

#[tokio::test]
async fn checked_sell_through_backend() {
    let (url, state) = backend().await;
    let store = BackendStore::new(&url, 2).unwrap();
    ledger::record(&store, new_tx("u1", "AAPL", Side::Buy, 5.0, 100.0)).await.unwrap();

    ledger::record(&store, new_tx("u1", "AAPL", Side::Sell, 5.0, 110.0)).await.unwrap();
    let err = ledger::record(&store, new_tx("u1", "AAPL", Side::Sell, 1.0, 110.0))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::CostBasis(CostBasisError::OverSell { .. })));
    assert_eq!(state.rows.lock().unwrap().len(), 2);
}

async fn full_page(Path(user): Path<String>) -> Json<Value> {
    let row = |n: u32| {
        json!({
            "id": format!("tx-{n}"),
            "userId": user,
            "stockId": "stock-aapl",
            "transactionType": "BUY",
            "quantity": 1.0,
            "price": 1.0,
            "transactionTime": "2024-02-01T10:00:00Z",
        })
    };
    Json(json!({"transactions": [row(0), row(1)], "count": 2}))
}

#[tokio::test]
async fn history_paging_stops_when_backend_ignores_offset() {
    let router = Router::new()
        .route("/api/stocks/:id", get(stock_by_id))
        .route("/api/user/:user/transactions", get(full_page));
    let url = spawn_stub(router).await;
    let store = BackendStore::new(&url, 2).unwrap();

    let err = store.list("u1").await.unwrap_err();
    assert!(matches!(err, StoreError::Unavailable(m) if m.contains("pages")));
}

/// Answers history reads with one 5-share AAPL buy; every write is unavailable.
struct ReadOnlyRemote;

#[async_trait]
impl PositionStore for ReadOnlyRemote {
    async fn list(&self, _user_id: &str) -> Result<Vec<Transaction>, StoreError> {
        Ok(vec![tx("AAPL", Side::Buy, 5.0, 100.0)])
    }

    async fn list_page(
        &self,
        _user_id: &str,
        _limit: u32,
        _offset: u32,
    ) -> Result<TransactionPage, StoreError> {
        Ok(TransactionPage::new(vec![tx("AAPL", Side::Buy, 5.0, 100.0)]))
    }

    async fn append(&self, _new: NewTransaction) -> Result<Transaction, StoreError> {
        Err(StoreError::Unavailable("writes disabled".into()))
    }

    async fn append_checked(&self, _new: NewTransaction) -> Result<Transaction, StoreError> {
        Err(StoreError::Unavailable("writes disabled".into()))
    }
}

#[tokio::test]
async fn sell_checked_on_remote_never_lands_in_local_ledger() {
    let db = setup_ledger();
    let store = FallbackStore::new(
        Arc::new(ReadOnlyRemote),
        Arc::new(portfolio::store::sqlite::SqliteLedger::open(&db.path).unwrap()),
    );

    let err = ledger::record(&store, new_tx("u1", "AAPL", Side::Sell, 5.0, 120.0))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::Store(StoreError::Unavailable(_))));
    assert!(db.ledger.list("u1").await.unwrap().is_empty());
    assert!(ledger::positions(&db.ledger, "u1").await.unwrap().is_empty());

    let err = ledger::record(&store, new_tx("u1", "AAPL", Side::Sell, 6.0, 120.0))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::CostBasis(CostBasisError::OverSell { .. })));
}

#[tokio::test]
async fn sell_checked_on_local_ledger_while_remote_is_down() {
    let db = setup_ledger();
    db.ledger
        .append(new_tx("u1", "AAPL", Side::Buy, 5.0, 100.0))
        .await
        .unwrap();
    let store = FallbackStore::new(
        Arc::new(BackendStore::new("http://127.0.0.1:9", 10).unwrap()),
        Arc::new(portfolio::store::sqlite::SqliteLedger::open(&db.path).unwrap()),
    );

    ledger::record(&store, new_tx("u1", "AAPL", Side::Sell, 5.0, 120.0)).await.unwrap();
    let err = ledger::record(&store, new_tx("u1", "AAPL", Side::Sell, 1.0, 120.0))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::CostBasis(CostBasisError::OverSell { .. })));
    assert!(ledger::positions(&db.ledger, "u1").await.unwrap().is_empty());
}
