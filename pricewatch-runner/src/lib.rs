//! PriceWatch Runner — everything after the report table exists.
//!
//! - TOML run configuration
//! - Raw CSV artifact
//! - xlsx formatter (hidden history columns, percent ratios, fixed widths)
//! - Publishers (Dropbox, local directory)
//! - The daily pipeline and its run summary

pub mod artifacts;
pub mod config;
pub mod formatter;
pub mod pipeline;
pub mod publisher;

pub use artifacts::{write_raw_csv, ArtifactError};
pub use config::{ConfigError, RunConfig};
pub use formatter::{FormatError, ReportFormatter, SheetLayout};
pub use pipeline::{run_daily, DailyRun, PublishStatus, RunError, RunOutcome, SkipRecord};
pub use publisher::{DropboxPublisher, LocalDirPublisher, PublishError, PublishReceipt, Publisher};
