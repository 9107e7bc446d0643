//! PriceWatch Core — daily momentum/decline signals for a ticker roster.
//!
//! This crate contains everything up to the finished report table:
//! - Roster and price-series domain types
//! - Signal calculator (change ratios, constant-decline detection)
//! - Market-data boundary (provider trait, Yahoo Finance, circuit breaker)
//! - Ticker processor (one roster entry → one report row)
//! - Bounded retry policy
//! - Report aggregator with a lazily-initialized, column-reconciling table

pub mod aggregator;
pub mod data;
pub mod domain;
pub mod processor;
pub mod progress;
pub mod report;
pub mod retry;
pub mod signals;

pub use aggregator::{AggregateReport, ReportAggregator, ReportError, SkippedTicker};
pub use domain::{Roster, RosterEntry};
pub use processor::{TickerError, TickerProcessor, DEFAULT_WINDOW_DAYS, MAX_WINDOW_DAYS};
pub use report::{Cell, ReportRow, ReportTable};
pub use retry::RetryPolicy;
pub use signals::{constant_decline, price_change, SignalSet};
