//! Yahoo Finance public endpoints: `/v8/finance/chart` for bars and
//! `/v1/finance/search` for ticker autocomplete. No credentials required.

pub mod provider;
pub mod response;
