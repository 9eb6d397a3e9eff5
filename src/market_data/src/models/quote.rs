//! Latest bid/ask snapshot for a symbol.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Top-of-book quote as last reported by the quote provider.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LatestQuote {
    pub symbol: String,
    pub timestamp: DateTime<Utc>,
    pub bid_price: f64,
    pub bid_size: f64,
    pub bid_exchange: String,
    pub ask_price: f64,
    pub ask_size: f64,
    pub ask_exchange: String,
    pub conditions: Vec<String>,
    pub tape: String,
}

impl LatestQuote {
    /// Price used to mark a holding: the bid, or the ask when no bid is posted.
    pub fn mark_price(&self) -> Option<f64> {
        [self.bid_price, self.ask_price]
            .into_iter()
            .find(|p| p.is_finite() && *p > 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn quote(bid: f64, ask: f64) -> LatestQuote {
        LatestQuote {
            symbol: "AAPL".into(),
            timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 14, 0, 0).unwrap(),
            bid_price: bid,
            bid_size: 1.0,
            bid_exchange: "V".into(),
            ask_price: ask,
            ask_size: 2.0,
            ask_exchange: "V".into(),
            conditions: vec!["R".into()],
            tape: "C".into(),
        }
    }

    #[test]
    fn mark_prefers_bid() {
        assert_eq!(quote(170.1, 170.3).mark_price(), Some(170.1));
    }

    #[test]
    fn mark_falls_back_to_ask() {
        assert_eq!(quote(0.0, 170.3).mark_price(), Some(170.3));
        assert_eq!(quote(0.0, 0.0).mark_price(), None);
    }
}
