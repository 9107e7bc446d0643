//! Progress callbacks for roster runs.

use crate::processor::TickerError;

/// Receives per-ticker and per-batch progress. Called from worker threads
/// when the aggregator runs with more than one worker.
pub trait ProgressReporter: Send + Sync {
    /// Called before the first attempt for a ticker.
    fn on_start(&self, symbol: &str, index: usize, total: usize);

    /// Called once a ticker has a row or has exhausted its attempts.
    fn on_complete(&self, symbol: &str, index: usize, total: usize, result: Result<(), &TickerError>);

    /// Called when the whole roster is done.
    fn on_batch_complete(&self, succeeded: usize, skipped: usize, total: usize);
}

/// Reports progress through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingProgress;

impl ProgressReporter for TracingProgress {
    fn on_start(&self, symbol: &str, index: usize, total: usize) {
        tracing::debug!("[{}/{}] fetching {symbol}", index + 1, total);
    }

    fn on_complete(&self, symbol: &str, index: usize, total: usize, result: Result<(), &TickerError>) {
        match result {
            Ok(()) => tracing::info!("[{}/{}] {symbol} ok", index + 1, total),
            Err(e) => tracing::debug!("[{}/{}] {symbol} failed: {e}", index + 1, total),
        }
    }

    fn on_batch_complete(&self, succeeded: usize, skipped: usize, total: usize) {
        tracing::info!(succeeded, skipped, total, "roster complete");
    }
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn on_start(&self, _symbol: &str, _index: usize, _total: usize) {}

    fn on_complete(&self, _symbol: &str, _index: usize, _total: usize, _result: Result<(), &TickerError>) {}

    fn on_batch_complete(&self, _succeeded: usize, _skipped: usize, _total: usize) {}
}
