//! Result of a fetch from an upstream that may be down or have nothing.

use tracing::warn;

use crate::providers::ProviderError;

/// What a fetch produced. Neither `EmptyResult` nor `UpstreamUnavailable` is
/// an error for the caller; both render as "no data".
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome<T> {
    Ready(T),
    /// The vendor answered 2xx with nothing in it.
    EmptyResult,
    /// Transport failure or non-2xx answer. Never retried.
    UpstreamUnavailable { reason: String },
}

impl<T> FetchOutcome<T> {
    pub fn is_ready(&self) -> bool {
        matches!(self, FetchOutcome::Ready(_))
    }

    pub fn ready(self) -> Option<T> {
        match self {
            FetchOutcome::Ready(v) => Some(v),
            _ => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> FetchOutcome<U> {
        match self {
            FetchOutcome::Ready(v) => FetchOutcome::Ready(f(v)),
            FetchOutcome::EmptyResult => FetchOutcome::EmptyResult,
            FetchOutcome::UpstreamUnavailable { reason } => {
                FetchOutcome::UpstreamUnavailable { reason }
            }
        }
    }
}

/// Sorts a provider result into an outcome.
///
/// Validation errors stay errors: they are the caller's fault and the
/// caller should hear about it. Everything else is logged and folded into
/// [`FetchOutcome::UpstreamUnavailable`].
pub fn settle<T>(
    what: &str,
    result: Result<T, ProviderError>,
    is_empty: impl FnOnce(&T) -> bool,
) -> Result<FetchOutcome<T>, ProviderError> {
    match result {
        Ok(v) if is_empty(&v) => Ok(FetchOutcome::EmptyResult),
        Ok(v) => Ok(FetchOutcome::Ready(v)),
        Err(e) if e.is_validation() => Err(e),
        Err(e) => {
            warn!(error = %e, "{what}: upstream unavailable");
            Ok(FetchOutcome::UpstreamUnavailable {
                reason: e.to_string(),
            })
        }
    }
}
