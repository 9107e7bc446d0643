//! Integration tests for roster aggregation.
//!
//! All tests run against the scripted in-memory provider, so they cover the
//! retry budget, skip handling and column reconciliation without a network.

use chrono::NaiveDate;
use pricewatch_core::data::fixture::{rising_bars, weekday_bars};
use pricewatch_core::data::StaticProvider;
use pricewatch_core::progress::ProgressReporter;
use pricewatch_core::report::Cell;
use pricewatch_core::{
    ReportAggregator, ReportError, RetryPolicy, Roster, RosterEntry, TickerError, TickerProcessor,
    DEFAULT_WINDOW_DAYS,
};
use std::sync::Mutex;

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 10, 18).unwrap()
}

fn roster(symbols: &[&str]) -> Roster {
    Roster::new(
        symbols
            .iter()
            .map(|s| RosterEntry::new(*s, format!("{s} Holdings"))),
    )
}

#[derive(Default)]
struct RecordingProgress {
    started: Mutex<Vec<String>>,
    failed: Mutex<Vec<String>>,
    batch: Mutex<Option<(usize, usize, usize)>>,
}

impl ProgressReporter for RecordingProgress {
    fn on_start(&self, symbol: &str, _index: usize, _total: usize) {
        self.started.lock().unwrap().push(symbol.to_string());
    }

    fn on_complete(&self, symbol: &str, _index: usize, _total: usize, result: Result<(), &TickerError>) {
        if result.is_err() {
            self.failed.lock().unwrap().push(symbol.to_string());
        }
    }

    fn on_batch_complete(&self, succeeded: usize, skipped: usize, total: usize) {
        *self.batch.lock().unwrap() = Some((succeeded, skipped, total));
    }
}

fn five_ticker_provider() -> StaticProvider {
    StaticProvider::new()
        .with_series("AAA", rising_bars(today(), 50))
        .with_failure("BBB", "delisted")
        .with_series("CCC", rising_bars(today(), 45))
        .with_failure("DDD", "provider outage")
        .with_series("EEE", rising_bars(today(), 40))
}

#[test]
fn two_failing_tickers_out_of_five_leave_three_rows() {
    let provider = five_ticker_provider();
    let progress = RecordingProgress::default();
    let aggregator = ReportAggregator::new(TickerProcessor::new(&provider, DEFAULT_WINDOW_DAYS))
        .with_retry(RetryPolicy::immediate(2))
        .with_progress(&progress);

    let report = aggregator
        .build(&roster(&["AAA", "BBB", "CCC", "DDD", "EEE"]), today())
        .unwrap();

    assert_eq!(report.table.len(), 3);
    assert_eq!(report.attempted, 5);
    let symbols: Vec<&str> = report.table.rows().iter().map(|r| r.symbol.as_str()).collect();
    assert_eq!(symbols, vec!["AAA", "CCC", "EEE"]);

    let skipped: Vec<&str> = report.skipped.iter().map(|s| s.symbol.as_str()).collect();
    assert_eq!(skipped, vec!["BBB", "DDD"]);
    assert!(report.skipped.iter().all(|s| s.attempts == 2));
    assert!(report
        .skipped
        .iter()
        .all(|s| matches!(s.error, TickerError::DataUnavailable { .. })));

    // Each failing ticker was tried exactly twice, each good one once.
    assert_eq!(provider.calls("BBB"), 2);
    assert_eq!(provider.calls("DDD"), 2);
    assert_eq!(provider.calls("AAA"), 1);

    assert_eq!(*progress.failed.lock().unwrap(), vec!["BBB", "DDD"]);
    assert_eq!(*progress.batch.lock().unwrap(), Some((3, 2, 5)));
}

#[test]
fn all_failures_is_an_empty_report() {
    let provider = StaticProvider::new()
        .with_failure("AAA", "down")
        .with_series("BBB", rising_bars(today(), 10));
    let aggregator = ReportAggregator::new(TickerProcessor::new(&provider, DEFAULT_WINDOW_DAYS))
        .with_retry(RetryPolicy::immediate(2));

    let err = aggregator.build(&roster(&["AAA", "BBB"]), today()).unwrap_err();
    match err {
        ReportError::EmptyReport { attempted, skipped } => {
            assert_eq!(attempted, 2);
            assert_eq!(skipped.len(), 2);
            assert!(matches!(
                skipped[1].error,
                TickerError::InsufficientHistory { observations: 10, .. }
            ));
        }
    }
}

#[test]
fn empty_roster_is_an_empty_report() {
    let provider = StaticProvider::new();
    let aggregator = ReportAggregator::new(TickerProcessor::new(&provider, DEFAULT_WINDOW_DAYS));
    let err = aggregator.build(&Roster::default(), today()).unwrap_err();
    assert!(matches!(err, ReportError::EmptyReport { attempted: 0, .. }));
}

#[test]
fn transient_failure_is_absorbed_by_the_second_attempt() {
    let provider = StaticProvider::new().with_flaky_series("AAA", 1, rising_bars(today(), 40));
    let aggregator = ReportAggregator::new(TickerProcessor::new(&provider, DEFAULT_WINDOW_DAYS))
        .with_retry(RetryPolicy::immediate(2));

    let report = aggregator.build(&roster(&["AAA"]), today()).unwrap();
    assert_eq!(report.table.len(), 1);
    assert!(report.skipped.is_empty());
    assert_eq!(provider.calls("AAA"), 2);
}

#[test]
fn two_transient_failures_exhaust_the_default_budget() {
    let provider = StaticProvider::new().with_flaky_series("AAA", 2, rising_bars(today(), 40));
    let aggregator = ReportAggregator::new(TickerProcessor::new(&provider, DEFAULT_WINDOW_DAYS))
        .with_retry(RetryPolicy::immediate(RetryPolicy::DEFAULT_ATTEMPTS));

    assert!(aggregator.build(&roster(&["AAA"]), today()).is_err());
    assert_eq!(provider.calls("AAA"), 2);
}

#[test]
fn heterogeneous_windows_are_backfilled_with_no_data() {
    // BBB stopped trading five sessions ago; AAA is current.
    let bbb_last = NaiveDate::from_ymd_opt(2024, 10, 11).unwrap();
    let provider = StaticProvider::new()
        .with_series("AAA", rising_bars(today(), 40))
        .with_series("BBB", weekday_bars(bbb_last, &[50.0; 40]));
    let aggregator = ReportAggregator::new(TickerProcessor::new(&provider, DEFAULT_WINDOW_DAYS))
        .with_retry(RetryPolicy::immediate(1));

    let report = aggregator.build(&roster(&["AAA", "BBB"]), today()).unwrap();
    let table = &report.table;
    let columns = table.columns();
    let last_date_col = columns.iter().position(|c| c == "2024-10-18").unwrap();

    let records: Vec<Vec<Cell>> = table.records().collect();
    assert!(matches!(records[0][last_date_col], Cell::Number(_)));
    assert_eq!(records[1][last_date_col], Cell::Missing);
    assert_eq!(records[1][last_date_col].to_string(), "None");

    // BBB's earliest dates predate AAA's window start and are backfilled for AAA.
    let first_date_col = 2;
    assert!(matches!(records[1][first_date_col], Cell::Number(_)));
    assert_eq!(records[0][first_date_col], Cell::Missing);
}

#[test]
fn worker_pool_produces_the_same_table_as_sequential() {
    let provider = five_ticker_provider();
    let names = roster(&["AAA", "BBB", "CCC", "DDD", "EEE"]);
    let processor = TickerProcessor::new(&provider, DEFAULT_WINDOW_DAYS);

    let sequential = ReportAggregator::new(processor)
        .with_retry(RetryPolicy::immediate(2))
        .build(&names, today())
        .unwrap();
    let parallel = ReportAggregator::new(processor)
        .with_retry(RetryPolicy::immediate(2))
        .with_workers(4)
        .build(&names, today())
        .unwrap();

    assert_eq!(sequential.table, parallel.table);
    assert_eq!(sequential.table.columns(), parallel.table.columns());
}
