//! The daily job end to end: roster → table → raw CSV → workbook → publish.
//!
//! An empty report stops the run before anything is written. A publish
//! failure does not: both local artifacts already exist at that point, and
//! the failure is reported in [`RunOutcome::publish`].

use chrono::NaiveDate;
use pricewatch_core::data::MarketDataProvider;
use pricewatch_core::progress::ProgressReporter;
use pricewatch_core::{ReportAggregator, ReportError, Roster, SkippedTicker, TickerProcessor};
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

use crate::artifacts::{write_raw_csv, ArtifactError};
use crate::config::RunConfig;
use crate::formatter::{FormatError, ReportFormatter};
use crate::publisher::{PublishReceipt, Publisher};

/// Failures that abort the run.
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Report(#[from] ReportError),

    #[error(transparent)]
    Artifact(#[from] ArtifactError),

    #[error(transparent)]
    Format(#[from] FormatError),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PublishStatus {
    Published {
        publisher: String,
        receipt: PublishReceipt,
    },
    Failed {
        publisher: String,
        error: String,
    },
    Skipped {
        reason: String,
    },
}

impl PublishStatus {
    pub fn is_failure(&self) -> bool {
        matches!(self, PublishStatus::Failed { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkipRecord {
    pub symbol: String,
    pub kind: String,
    pub reason: String,
    pub attempts: u32,
}

impl From<&SkippedTicker> for SkipRecord {
    fn from(s: &SkippedTicker) -> Self {
        Self {
            symbol: s.symbol.clone(),
            kind: s.error.kind().to_string(),
            reason: s.error.to_string(),
            attempts: s.attempts,
        }
    }
}

/// What a completed run did.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunOutcome {
    pub date: NaiveDate,
    pub attempted: usize,
    pub succeeded: usize,
    pub skipped: Vec<SkipRecord>,
    pub date_columns: usize,
    pub raw_path: PathBuf,
    pub formatted_path: PathBuf,
    pub publish: PublishStatus,
}

impl RunOutcome {
    pub fn summary_line(&self) -> String {
        format!(
            "{}: {}/{} tickers reported, {} skipped, {} date columns",
            self.date,
            self.succeeded,
            self.attempted,
            self.skipped.len(),
            self.date_columns
        )
    }
}

/// Collaborators for one run. `publisher: None` skips the publish step.
pub struct DailyRun<'a> {
    config: &'a RunConfig,
    provider: &'a dyn MarketDataProvider,
    publisher: Option<&'a dyn Publisher>,
    progress: Option<&'a dyn ProgressReporter>,
}

impl<'a> DailyRun<'a> {
    pub fn new(config: &'a RunConfig, provider: &'a dyn MarketDataProvider) -> Self {
        Self {
            config,
            provider,
            publisher: None,
            progress: None,
        }
    }

    pub fn with_publisher(mut self, publisher: &'a dyn Publisher) -> Self {
        self.publisher = Some(publisher);
        self
    }

    pub fn with_progress(mut self, progress: &'a dyn ProgressReporter) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn execute(&self, roster: &Roster, today: NaiveDate) -> Result<RunOutcome, RunError> {
        let config = self.config;
        tracing::info!(
            tickers = roster.len(),
            provider = self.provider.name(),
            %today,
            "starting daily run"
        );

        let processor = TickerProcessor::new(self.provider, config.report.window_days);
        let mut aggregator = ReportAggregator::new(processor)
            .with_retry(config.fetch.retry_policy())
            .with_workers(config.fetch.workers);
        if let Some(progress) = self.progress {
            aggregator = aggregator.with_progress(progress);
        }
        let report = aggregator.build(roster, today)?;

        let raw_path = config.report.raw_path();
        let formatted_path = config.report.formatted_path();
        write_raw_csv(&report.table, &raw_path)?;

        ReportFormatter::new(&config.report.sheet_name, config.report.column_width)
            .format_file(&raw_path, &formatted_path)?;

        let publish = self.publish(&formatted_path);

        let outcome = RunOutcome {
            date: today,
            attempted: report.attempted,
            succeeded: report.succeeded(),
            skipped: report.skipped.iter().map(SkipRecord::from).collect(),
            date_columns: report.table.dates().count(),
            raw_path,
            formatted_path,
            publish,
        };
        tracing::info!("{}", outcome.summary_line());
        Ok(outcome)
    }

    fn publish(&self, formatted: &std::path::Path) -> PublishStatus {
        let settings = &self.config.publish;
        let publisher = match self.publisher {
            Some(p) if settings.enabled => p,
            Some(_) => {
                return PublishStatus::Skipped {
                    reason: "publishing disabled".into(),
                }
            }
            None => {
                return PublishStatus::Skipped {
                    reason: "no publisher configured".into(),
                }
            }
        };

        match publisher.publish(formatted, &settings.destination) {
            Ok(receipt) => {
                tracing::info!(
                    publisher = publisher.name(),
                    destination = %receipt.destination,
                    bytes = receipt.bytes,
                    "published report"
                );
                PublishStatus::Published {
                    publisher: publisher.name().to_string(),
                    receipt,
                }
            }
            Err(e) => {
                tracing::error!(
                    publisher = publisher.name(),
                    destination = %settings.destination,
                    local = %formatted.display(),
                    "publish failed: {e}"
                );
                PublishStatus::Failed {
                    publisher: publisher.name().to_string(),
                    error: e.to_string(),
                }
            }
        }
    }
}

/// Run the daily job once.
pub fn run_daily(
    config: &RunConfig,
    roster: &Roster,
    provider: &dyn MarketDataProvider,
    publisher: Option<&dyn Publisher>,
    today: NaiveDate,
) -> Result<RunOutcome, RunError> {
    let mut run = DailyRun::new(config, provider);
    if let Some(p) = publisher {
        run = run.with_publisher(p);
    }
    run.execute(roster, today)
}
