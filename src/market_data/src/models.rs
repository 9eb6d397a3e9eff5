pub mod bar;
pub mod bar_series;
pub mod quote;
pub mod request_params;
pub mod symbol;
pub mod timeframe;
