//! Alpaca Market Data v2 REST client.
//!
//! Bars come from `/v2/stocks/bars` (paginated through `next_page_token`) and
//! quotes from `/v2/stocks/{symbol}/quotes/latest`.

pub mod params;
pub mod provider;
pub mod response;
