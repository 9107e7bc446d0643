//! Report aggregator — drives the roster and builds exactly one report table.
//!
//! Policy:
//! 1. Every roster entry gets up to `RetryPolicy::max_attempts` attempts.
//! 2. A ticker that still fails is logged with its symbol and skipped; one
//!    ticker never aborts the run.
//! 3. Successful rows are folded into a [`ReportAccumulator`] in roster order.
//! 4. If no ticker succeeds the run fails with [`ReportError::EmptyReport`].
//!
//! With `workers > 1` the tickers are fetched on a bounded rayon pool. The
//! outcomes are still folded in roster order and the date columns are a
//! sorted union, so the table is identical to the sequential one.

use crate::domain::{Roster, RosterEntry};
use crate::processor::{TickerError, TickerProcessor};
use crate::progress::{ProgressReporter, TracingProgress};
use crate::report::{ReportAccumulator, ReportRow, ReportTable};
use crate::retry::RetryPolicy;
use chrono::NaiveDate;
use rayon::prelude::*;
use thiserror::Error;

static TRACING_PROGRESS: TracingProgress = TracingProgress;

/// A roster entry that produced no row.
#[derive(Debug)]
pub struct SkippedTicker {
    pub symbol: String,
    pub attempts: u32,
    pub error: TickerError,
}

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("empty report: none of the {attempted} roster tickers produced a row")]
    EmptyReport {
        attempted: usize,
        skipped: Vec<SkippedTicker>,
    },
}

/// Finalized table plus the tickers left out of it.
#[derive(Debug)]
pub struct AggregateReport {
    pub table: ReportTable,
    pub skipped: Vec<SkippedTicker>,
    pub attempted: usize,
}

impl AggregateReport {
    pub fn succeeded(&self) -> usize {
        self.table.len()
    }
}

struct TickerOutcome {
    attempts: u32,
    result: Result<ReportRow, TickerError>,
}

pub struct ReportAggregator<'a> {
    processor: TickerProcessor<'a>,
    retry: RetryPolicy,
    workers: usize,
    progress: &'a dyn ProgressReporter,
}

impl<'a> ReportAggregator<'a> {
    /// Sequential, default retry budget, progress through `tracing`.
    pub fn new(processor: TickerProcessor<'a>) -> Self {
        Self {
            processor,
            retry: RetryPolicy::default(),
            workers: 1,
            progress: &TRACING_PROGRESS,
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Number of tickers fetched concurrently (clamped to at least one).
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn with_progress(mut self, progress: &'a dyn ProgressReporter) -> Self {
        self.progress = progress;
        self
    }

    fn run_entry(&self, index: usize, total: usize, entry: &RosterEntry, today: NaiveDate) -> TickerOutcome {
        self.progress.on_start(&entry.symbol, index, total);

        let mut attempts = 0;
        let result = self.retry.run(&entry.symbol, |attempt| {
            attempts = attempt;
            self.processor.process(entry, today)
        });

        self.progress
            .on_complete(&entry.symbol, index, total, result.as_ref().map(|_| ()));
        TickerOutcome { attempts, result }
    }

    fn run_sequential(&self, roster: &Roster, today: NaiveDate) -> Vec<TickerOutcome> {
        let total = roster.len();
        roster
            .iter()
            .enumerate()
            .map(|(i, entry)| self.run_entry(i, total, entry, today))
            .collect()
    }

    fn run_outcomes(&self, roster: &Roster, today: NaiveDate) -> Vec<TickerOutcome> {
        if self.workers <= 1 || roster.len() <= 1 {
            return self.run_sequential(roster, today);
        }

        let pool = match rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .build()
        {
            Ok(pool) => pool,
            Err(e) => {
                tracing::warn!(error = %e, "worker pool unavailable, fetching sequentially");
                return self.run_sequential(roster, today);
            }
        };

        let total = roster.len();
        pool.install(|| {
            roster
                .entries()
                .par_iter()
                .enumerate()
                .map(|(i, entry)| self.run_entry(i, total, entry, today))
                .collect()
        })
    }

    /// Process the whole roster as of `today`.
    pub fn build(&self, roster: &Roster, today: NaiveDate) -> Result<AggregateReport, ReportError> {
        let total = roster.len();
        tracing::info!(
            tickers = total,
            provider = self.processor.provider().name(),
            workers = self.workers,
            max_attempts = self.retry.max_attempts(),
            %today,
            "building report"
        );

        let outcomes = self.run_outcomes(roster, today);

        let mut accumulator = ReportAccumulator::new();
        let mut skipped = Vec::new();

        for (entry, outcome) in roster.iter().zip(outcomes) {
            match outcome.result {
                Ok(row) => {
                    let reconciliation = accumulator.push(row);
                    if !reconciliation.is_noop() {
                        tracing::debug!(
                            symbol = %entry.symbol,
                            added_columns = reconciliation.added_dates.len(),
                            backfilled = reconciliation.backfilled_in_new_row,
                            "reconciled date columns"
                        );
                    }
                }
                Err(error) => {
                    tracing::warn!(
                        symbol = %entry.symbol,
                        attempts = outcome.attempts,
                        reason = error.kind(),
                        "skipping ticker: {error}"
                    );
                    skipped.push(SkippedTicker {
                        symbol: entry.symbol.clone(),
                        attempts: outcome.attempts,
                        error,
                    });
                }
            }
        }

        let succeeded = accumulator.row_count();
        self.progress.on_batch_complete(succeeded, skipped.len(), total);

        match accumulator.finish() {
            Some(table) => Ok(AggregateReport {
                table,
                skipped,
                attempted: total,
            }),
            None => Err(ReportError::EmptyReport {
                attempted: total,
                skipped,
            }),
        }
    }
}
