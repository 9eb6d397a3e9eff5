pub mod chart;
pub mod lookup;
pub mod models;
pub mod normalize;
pub mod outcome;
pub mod providers;
pub mod range;
