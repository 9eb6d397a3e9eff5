//! Marks a position to market.

use market_data::models::quote::LatestQuote;
use serde::Serialize;

use crate::cost_basis::PortfolioPosition;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Valuation {
    pub symbol: String,
    pub quantity: f64,
    pub average_cost: Option<f64>,
    pub mark_price: f64,
    pub market_value: f64,
    pub unrealized_pnl: f64,
    /// `None` when the position has no cost to compare against.
    pub unrealized_pnl_pct: Option<f64>,
}

/// Values `position` at `price`.
pub fn value_at(position: &PortfolioPosition, price: f64) -> Valuation {
    let market_value = position.quantity * price;
    let unrealized_pnl = market_value - position.total_cost;
    let unrealized_pnl_pct =
        (position.total_cost > 0.0).then(|| unrealized_pnl / position.total_cost * 100.0);
    Valuation {
        symbol: position.symbol.clone(),
        quantity: position.quantity,
        average_cost: position.average_cost,
        mark_price: price,
        market_value,
        unrealized_pnl,
        unrealized_pnl_pct,
    }
}

/// Values `position` at the quote's bid, or its ask when no bid is posted.
pub fn value_position(position: &PortfolioPosition, quote: &LatestQuote) -> Option<Valuation> {
    quote.mark_price().map(|price| value_at(position, price))
}
