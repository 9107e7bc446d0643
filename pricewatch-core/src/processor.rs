//! Ticker processor: one roster entry in, one complete report row out.

use crate::data::{DataError, MarketDataProvider};
use crate::domain::{PriceSeries, RosterEntry};
use crate::report::ReportRow;
use crate::signals::{SignalError, SignalSet};
use chrono::{Duration, NaiveDate};
use thiserror::Error;

/// Trailing window requested from the provider, in calendar days.
pub const DEFAULT_WINDOW_DAYS: i64 = 90;

/// Longest window a processor will request; larger values are clamped.
pub const MAX_WINDOW_DAYS: i64 = 3650;

/// Why a ticker produced no row. Never fatal to the run.
#[derive(Debug, Error)]
pub enum TickerError {
    #[error("{symbol}: data unavailable: {source}")]
    DataUnavailable {
        symbol: String,
        #[source]
        source: DataError,
    },

    #[error("{symbol}: insufficient history ({observations} observations, {required} required)")]
    InsufficientHistory {
        symbol: String,
        observations: usize,
        required: usize,
    },

    #[error("{symbol}: invalid price data: {source}")]
    InvalidPrice {
        symbol: String,
        #[source]
        source: SignalError,
    },
}

impl TickerError {
    pub fn symbol(&self) -> &str {
        match self {
            TickerError::DataUnavailable { symbol, .. }
            | TickerError::InsufficientHistory { symbol, .. }
            | TickerError::InvalidPrice { symbol, .. } => symbol,
        }
    }

    /// Short machine-friendly label for summaries.
    pub fn kind(&self) -> &'static str {
        match self {
            TickerError::DataUnavailable { .. } => "data_unavailable",
            TickerError::InsufficientHistory { .. } => "insufficient_history",
            TickerError::InvalidPrice { .. } => "invalid_price",
        }
    }

    fn from_signal(symbol: &str, err: SignalError) -> Self {
        match err {
            SignalError::TooShort {
                observations,
                required,
            } => TickerError::InsufficientHistory {
                symbol: symbol.to_string(),
                observations,
                required,
            },
            other => TickerError::InvalidPrice {
                symbol: symbol.to_string(),
                source: other,
            },
        }
    }
}

/// Fetches a ticker's window and turns it into a report row.
///
/// The current date is always passed in, so processing is reproducible.
#[derive(Clone, Copy)]
pub struct TickerProcessor<'a> {
    provider: &'a dyn MarketDataProvider,
    window_days: i64,
}

impl<'a> TickerProcessor<'a> {
    pub fn new(provider: &'a dyn MarketDataProvider, window_days: i64) -> Self {
        Self {
            provider,
            window_days,
        }
    }

    pub fn provider(&self) -> &'a dyn MarketDataProvider {
        self.provider
    }

    /// Inclusive `[today - window_days, today]` in calendar days, with
    /// `window_days` clamped to `0..=MAX_WINDOW_DAYS`.
    pub fn window(&self, today: NaiveDate) -> (NaiveDate, NaiveDate) {
        let days = self.window_days.clamp(0, MAX_WINDOW_DAYS);
        let start = today
            .checked_sub_signed(Duration::days(days))
            .unwrap_or(NaiveDate::MIN);
        (start, today)
    }

    pub fn process(&self, entry: &RosterEntry, today: NaiveDate) -> Result<ReportRow, TickerError> {
        let symbol = entry.symbol.as_str();
        let (start, end) = self.window(today);

        let fetched = self
            .provider
            .fetch(symbol, start, end)
            .map_err(|source| TickerError::DataUnavailable {
                symbol: symbol.to_string(),
                source,
            })?;

        let series = PriceSeries::from_bars(symbol, &fetched.bars);
        if series.is_empty() {
            return Err(TickerError::DataUnavailable {
                symbol: symbol.to_string(),
                source: DataError::EmptySeries {
                    symbol: symbol.to_string(),
                    start,
                    end,
                },
            });
        }

        let signals =
            SignalSet::compute(&series).map_err(|e| TickerError::from_signal(symbol, e))?;

        tracing::debug!(
            symbol,
            observations = series.len(),
            change_7d = signals.price_change_7_days,
            decline_7 = signals.constant_price_drop_7,
            "ticker processed"
        );

        Ok(ReportRow::new(entry, &series, signals))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::fixture::{rising_bars, weekday_bars, StaticProvider};
    use crate::data::RawBar;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 9, 30).unwrap()
    }

    fn entry(symbol: &str) -> RosterEntry {
        RosterEntry::new(symbol, format!("{symbol} Inc"))
    }

    #[test]
    fn window_is_ninety_calendar_days() {
        let provider = StaticProvider::new();
        let processor = TickerProcessor::new(&provider, DEFAULT_WINDOW_DAYS);
        let (start, end) = processor.window(today());
        assert_eq!(start, NaiveDate::from_ymd_opt(2024, 7, 2).unwrap());
        assert_eq!(end, today());
    }

    #[test]
    fn oversized_window_is_clamped() {
        let provider = StaticProvider::new();
        let processor = TickerProcessor::new(&provider, i64::MAX);
        let (start, end) = processor.window(today());
        assert_eq!(end - start, Duration::days(MAX_WINDOW_DAYS));

        let processor = TickerProcessor::new(&provider, -5);
        assert_eq!(processor.window(today()), (today(), today()));
    }

    #[test]
    fn thirty_observations_succeed() {
        let provider = StaticProvider::new().with_series("AAA", rising_bars(today(), 30));
        let processor = TickerProcessor::new(&provider, DEFAULT_WINDOW_DAYS);

        let row = processor.process(&entry("AAA"), today()).unwrap();
        assert_eq!(row.symbol, "AAA");
        assert_eq!(row.display_name, "AAA Inc");
        assert_eq!(row.closes.len(), 30);
        assert_eq!(row.signals.price_90_days_ago, 100.0);
        assert_eq!(row.signals.price_30_days_ago, 100.0);
    }

    #[test]
    fn twenty_nine_observations_are_insufficient() {
        let provider = StaticProvider::new().with_series("AAA", rising_bars(today(), 29));
        let processor = TickerProcessor::new(&provider, DEFAULT_WINDOW_DAYS);

        let err = processor.process(&entry("AAA"), today()).unwrap_err();
        assert!(matches!(
            err,
            TickerError::InsufficientHistory {
                observations: 29,
                required: 30,
                ..
            }
        ));
        assert_eq!(err.symbol(), "AAA");
    }

    #[test]
    fn provider_failure_is_data_unavailable() {
        let provider = StaticProvider::new().with_failure("AAA", "boom");
        let processor = TickerProcessor::new(&provider, DEFAULT_WINDOW_DAYS);
        let err = processor.process(&entry("AAA"), today()).unwrap_err();
        assert_eq!(err.kind(), "data_unavailable");
    }

    #[test]
    fn all_nan_series_is_data_unavailable() {
        let bars: Vec<RawBar> = weekday_bars(today(), &[f64::NAN; 40]);
        let provider = StaticProvider::new().with_series("AAA", bars);
        let processor = TickerProcessor::new(&provider, DEFAULT_WINDOW_DAYS);
        let err = processor.process(&entry("AAA"), today()).unwrap_err();
        assert!(matches!(err, TickerError::DataUnavailable { .. }));
    }

    #[test]
    fn bars_outside_the_window_are_not_requested() {
        // 120 weekdays reach back past the 90-calendar-day window.
        let provider = StaticProvider::new().with_series("AAA", rising_bars(today(), 120));
        let processor = TickerProcessor::new(&provider, DEFAULT_WINDOW_DAYS);
        let row = processor.process(&entry("AAA"), today()).unwrap();

        let (start, _) = processor.window(today());
        assert!(row.dates().all(|d| *d >= start));
        assert!(row.closes.len() < 120);
    }

    #[test]
    fn zero_latest_price_is_invalid() {
        let mut closes = vec![10.0; 35];
        closes[34] = 0.0;
        let provider = StaticProvider::new().with_series("AAA", weekday_bars(today(), &closes));
        let processor = TickerProcessor::new(&provider, DEFAULT_WINDOW_DAYS);
        let err = processor.process(&entry("AAA"), today()).unwrap_err();
        assert_eq!(err.kind(), "invalid_price");
    }
}
