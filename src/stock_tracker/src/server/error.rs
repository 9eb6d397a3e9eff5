use axum::{Json, http::StatusCode};
use market_data::providers::ProviderError;
use portfolio::{ledger::LedgerError, store::StoreError};
use serde::Serialize;
use tracing::error;

#[derive(Clone, Debug, Serialize)]
pub struct ApiError {
    pub error: String,
}

pub(crate) type ApiResult<T> = Result<T, (StatusCode, Json<ApiError>)>;

pub(crate) fn api_err(status: StatusCode, message: &str) -> (StatusCode, Json<ApiError>) {
    (
        status,
        Json(ApiError {
            error: message.to_string(),
        }),
    )
}

/// Caller mistakes only; upstream failures arrive as a `FetchOutcome`.
pub(crate) fn provider_err(err: ProviderError) -> (StatusCode, Json<ApiError>) {
    let status = if err.is_validation() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::BAD_GATEWAY
    };
    api_err(status, &err.to_string())
}

pub(crate) fn ledger_err(err: LedgerError) -> (StatusCode, Json<ApiError>) {
    let status = match &err {
        LedgerError::Invalid(_) => StatusCode::BAD_REQUEST,
        LedgerError::CostBasis(_) | LedgerError::Store(StoreError::OverSell(_)) => {
            StatusCode::CONFLICT
        }
        LedgerError::Store(StoreError::NotFound(_)) => StatusCode::NOT_FOUND,
        LedgerError::Store(StoreError::Rejected { .. }) => StatusCode::UNPROCESSABLE_ENTITY,
        LedgerError::Store(StoreError::Unavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
        LedgerError::Store(StoreError::Database(_)) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        error!(error = %err, "transaction store failure");
    }
    api_err(status, &err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use portfolio::cost_basis::CostBasisError;

    fn oversell() -> CostBasisError {
        CostBasisError::OverSell {
            symbol: "AAPL".into(),
            index: 1,
            requested: 5.0,
            held: 0.0,
        }
    }

    #[test]
    fn ledger_statuses() {
        let cases = [
            (LedgerError::CostBasis(oversell()), StatusCode::CONFLICT),
            (LedgerError::from(StoreError::OverSell(oversell())), StatusCode::CONFLICT),
            (
                LedgerError::from(StoreError::NotFound("stock ZZZ".into())),
                StatusCode::NOT_FOUND,
            ),
            (
                LedgerError::from(StoreError::Unavailable("down".into())),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                LedgerError::from(StoreError::Database(anyhow::anyhow!("disk"))),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, expected) in cases {
            let (status, Json(body)) = ledger_err(err);
            assert_eq!(status, expected, "{}", body.error);
        }
    }

    #[test]
    fn store_oversell_becomes_cost_basis_error() {
        assert!(matches!(
            LedgerError::from(StoreError::OverSell(oversell())),
            LedgerError::CostBasis(_)
        ));
    }
}
