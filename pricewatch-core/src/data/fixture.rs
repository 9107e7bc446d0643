//! Deterministic in-memory provider and bar builders.
//!
//! Used by tests and benches so ticker processing and aggregation can be
//! exercised without touching the network. Each symbol gets a script: a fixed
//! series, a permanent failure, or a number of transient failures followed by
//! a series.

use super::provider::{DataError, FetchResult, MarketDataProvider, RawBar};
use chrono::{Datelike, NaiveDate, Weekday};
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Debug, Clone)]
enum Script {
    Series(Vec<RawBar>),
    Failing(String),
    FlakyThen { failures: usize, bars: Vec<RawBar> },
}

/// Scripted provider keyed by symbol. Unknown symbols are `SymbolNotFound`.
#[derive(Debug, Default)]
pub struct StaticProvider {
    scripts: HashMap<String, Script>,
    calls: Mutex<HashMap<String, usize>>,
}

impl StaticProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Always return `bars` (clipped to the requested range).
    pub fn with_series(mut self, symbol: &str, bars: Vec<RawBar>) -> Self {
        self.scripts.insert(symbol.to_string(), Script::Series(bars));
        self
    }

    /// Fail every request for `symbol`.
    pub fn with_failure(mut self, symbol: &str, reason: &str) -> Self {
        self.scripts
            .insert(symbol.to_string(), Script::Failing(reason.to_string()));
        self
    }

    /// Fail the first `failures` requests for `symbol`, then return `bars`.
    pub fn with_flaky_series(mut self, symbol: &str, failures: usize, bars: Vec<RawBar>) -> Self {
        self.scripts
            .insert(symbol.to_string(), Script::FlakyThen { failures, bars });
        self
    }

    /// Number of fetches issued for `symbol` so far.
    pub fn calls(&self, symbol: &str) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(symbol)
            .copied()
            .unwrap_or(0)
    }

    fn record_call(&self, symbol: &str) -> usize {
        let mut calls = self.calls.lock().unwrap_or_else(|e| e.into_inner());
        let count = calls.entry(symbol.to_string()).or_insert(0);
        *count += 1;
        *count
    }

    fn clip(
        symbol: &str,
        bars: &[RawBar],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<FetchResult, DataError> {
        let bars: Vec<RawBar> = bars
            .iter()
            .filter(|b| b.date >= start && b.date <= end)
            .cloned()
            .collect();
        if bars.is_empty() {
            return Err(DataError::EmptySeries {
                symbol: symbol.to_string(),
                start,
                end,
            });
        }
        Ok(FetchResult {
            symbol: symbol.to_string(),
            bars,
        })
    }
}

impl MarketDataProvider for StaticProvider {
    fn name(&self) -> &str {
        "static"
    }

    fn fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<FetchResult, DataError> {
        let call = self.record_call(symbol);
        match self.scripts.get(symbol) {
            None => Err(DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            }),
            Some(Script::Failing(reason)) => Err(DataError::Other(reason.clone())),
            Some(Script::Series(bars)) => Self::clip(symbol, bars, start, end),
            Some(Script::FlakyThen { failures, bars }) => {
                if call <= *failures {
                    Err(DataError::NetworkUnreachable(format!(
                        "scripted transient failure {call} for {symbol}"
                    )))
                } else {
                    Self::clip(symbol, bars, start, end)
                }
            }
        }
    }
}

/// Build one bar per weekday ending on or before `last`, oldest first, with
/// the given closes.
pub fn weekday_bars(last: NaiveDate, closes: &[f64]) -> Vec<RawBar> {
    let mut dates = Vec::with_capacity(closes.len());
    let mut day = last;
    while dates.len() < closes.len() {
        if !matches!(day.weekday(), Weekday::Sat | Weekday::Sun) {
            dates.push(day);
        }
        match day.pred_opt() {
            Some(prev) => day = prev,
            None => break,
        }
    }
    dates.reverse();
    dates
        .into_iter()
        .zip(closes)
        .map(|(date, &close)| RawBar::flat(date, close))
        .collect()
}

/// `n` weekday bars ending at `last`, closes drifting gently upward from 100.
pub fn rising_bars(last: NaiveDate, n: usize) -> Vec<RawBar> {
    let closes: Vec<f64> = (0..n).map(|i| 100.0 + i as f64 * 0.5).collect();
    weekday_bars(last, &closes)
}
