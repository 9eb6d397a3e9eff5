pub mod cost_basis;
pub mod db;
pub mod ledger;
pub mod models;
pub mod schema;
pub mod store;
pub mod valuation;
