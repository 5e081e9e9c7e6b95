pub mod aggregator;
pub mod period;
pub mod service;
