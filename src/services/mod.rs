// Services module - aggregation and caching logic

pub mod aggregator;
pub mod cache;
pub mod lookup;
pub mod normalize;

// Rating providers
pub mod sources;
