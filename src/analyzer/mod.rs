// Analyzer module: per-direction market statistics and the buy/sell comparison.

pub mod comparison;
pub mod market_stats;
pub mod statistics;

pub use market_stats::MarketAnalyzer;
