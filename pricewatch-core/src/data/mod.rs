//! Market-data boundary: provider trait, Yahoo implementation, circuit breaker.

pub mod circuit_breaker;
pub mod fixture;
pub mod provider;
pub mod yahoo;

pub use circuit_breaker::CircuitBreaker;
pub use fixture::StaticProvider;
pub use provider::{DataError, FetchResult, MarketDataProvider, RawBar};
pub use yahoo::{YahooProvider, YahooSettings};
