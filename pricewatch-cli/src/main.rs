//! PriceWatch CLI — daily signal report and inspection commands.
//!
//! Commands:
//! - `run` — fetch the roster, build the report, format it and publish it
//! - `signals` — fetch one ticker and print its signal set
//! - `roster` — print the normalized roster
//! - `init-config` — write the default configuration as TOML
//!
//! Exit codes for `run`: 0 success, 1 fatal error, 2 report built but not published.

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use pricewatch_core::data::{CircuitBreaker, MarketDataProvider, YahooProvider, YahooSettings};
use pricewatch_core::{Roster, RosterEntry, SignalSet, TickerProcessor};
use pricewatch_runner::{
    DailyRun, DropboxPublisher, LocalDirPublisher, PublishStatus, Publisher, RunConfig, RunOutcome,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

const EXIT_FATAL: u8 = 1;
const EXIT_PUBLISH_FAILED: u8 = 2;

#[derive(Parser)]
#[command(
    name = "pricewatch",
    about = "PriceWatch — daily momentum/decline report for a ticker roster"
)]
struct Cli {
    /// Log as JSON lines (for unattended runs).
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build, format and publish today's report.
    Run {
        /// Path to a TOML config file. Defaults apply when omitted.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Report date (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        date: Option<String>,

        /// Publish into this directory instead of the configured store.
        #[arg(long)]
        local_dir: Option<PathBuf>,

        /// Build the artifacts but do not publish.
        #[arg(long, default_value_t = false)]
        no_publish: bool,

        /// Print the run summary as JSON.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Fetch one ticker and print its signals.
    Signals {
        /// Provider symbol (e.g., AAPL).
        symbol: String,

        /// Path to a TOML config file.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Report date (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        date: Option<String>,
    },
    /// Print the roster after suffix stripping and de-duplication.
    Roster {
        /// Path to a TOML config file.
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Write the default configuration.
    InitConfig {
        /// Output path. Prints to stdout when omitted.
        #[arg(long)]
        output: Option<PathBuf>,

        /// Overwrite an existing file.
        #[arg(long, default_value_t = false)]
        force: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.json_logs);

    let result = match cli.command {
        Commands::Run {
            config,
            date,
            local_dir,
            no_publish,
            json,
        } => run_report(config, date, local_dir, no_publish, json),
        Commands::Signals {
            symbol,
            config,
            date,
        } => run_signals(&symbol, config, date).map(|()| ExitCode::SUCCESS),
        Commands::Roster { config } => run_roster(config).map(|()| ExitCode::SUCCESS),
        Commands::InitConfig { output, force } => {
            run_init_config(output.as_deref(), force).map(|()| ExitCode::SUCCESS)
        }
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("Error: {e:#}");
            ExitCode::from(EXIT_FATAL)
        }
    }
}

fn init_logging(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.with_target(false).init();
    }
}

fn load_config(path: Option<PathBuf>) -> Result<RunConfig> {
    match path {
        Some(path) => RunConfig::from_file(&path)
            .with_context(|| format!("failed to load config {}", path.display())),
        None => Ok(RunConfig::default()),
    }
}

fn parse_date(date: Option<String>) -> Result<NaiveDate> {
    match date {
        Some(s) => NaiveDate::parse_from_str(&s, "%Y-%m-%d")
            .with_context(|| format!("invalid date '{s}', expected YYYY-MM-DD")),
        None => Ok(chrono::Local::now().date_naive()),
    }
}

fn build_provider(config: &RunConfig) -> Result<YahooProvider> {
    let fetch = &config.fetch;
    let breaker = Arc::new(CircuitBreaker::new(
        fetch.breaker_cooldown(),
        fetch.breaker_threshold,
    ));
    let settings = YahooSettings {
        timeout: fetch.request_timeout(),
        max_retries: fetch.http_retries,
        ..YahooSettings::default()
    };
    Ok(YahooProvider::new(breaker, settings)?)
}

fn build_publisher(config: &RunConfig, local_dir: Option<PathBuf>) -> Result<Box<dyn Publisher>> {
    if let Some(dir) = local_dir.or_else(|| config.publish.local_dir.clone()) {
        return Ok(Box::new(LocalDirPublisher::new(dir)));
    }
    // Resolved once here; the publisher never reads the environment itself.
    let token = std::env::var(&config.publish.token_env).ok();
    if token.is_none() && config.publish.enabled {
        tracing::warn!(
            var = %config.publish.token_env,
            "no Dropbox token in environment; publishing will fail"
        );
    }
    // Uploads get at least a minute.
    Ok(Box::new(DropboxPublisher::new(
        token,
        Duration::from_secs(config.fetch.request_timeout_secs.max(60)),
    )?))
}

/// `--no-publish` drops the publisher. A config with publishing disabled
/// still gets one, so the run summary reports the skip from the config.
fn select_publisher(
    config: &RunConfig,
    local_dir: Option<PathBuf>,
    no_publish: bool,
) -> Result<Option<Box<dyn Publisher>>> {
    if no_publish {
        return Ok(None);
    }
    build_publisher(config, local_dir).map(Some)
}

fn run_report(
    config_path: Option<PathBuf>,
    date: Option<String>,
    local_dir: Option<PathBuf>,
    no_publish: bool,
    json: bool,
) -> Result<ExitCode> {
    let config = load_config(config_path)?;
    let today = parse_date(date)?;
    let roster = Roster::from_csv_path(&config.roster.path, &config.roster.strip_suffixes)?;

    let provider = build_provider(&config)?;
    let publisher = select_publisher(&config, local_dir, no_publish)?;

    let mut run = DailyRun::new(&config, &provider);
    if let Some(p) = publisher.as_deref() {
        run = run.with_publisher(p);
    }
    let outcome = run.execute(&roster, today)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        print_outcome(&outcome);
    }

    Ok(if outcome.publish.is_failure() {
        ExitCode::from(EXIT_PUBLISH_FAILED)
    } else {
        ExitCode::SUCCESS
    })
}

fn print_outcome(outcome: &RunOutcome) {
    println!("Report date:   {}", outcome.date);
    println!(
        "Tickers:       {} reported / {} attempted",
        outcome.succeeded, outcome.attempted
    );
    println!("Date columns:  {}", outcome.date_columns);
    println!("Raw report:    {}", outcome.raw_path.display());
    println!("Formatted:     {}", outcome.formatted_path.display());
    match &outcome.publish {
        PublishStatus::Published { publisher, receipt } => {
            println!(
                "Published:     {} via {publisher} ({} bytes)",
                receipt.destination, receipt.bytes
            );
        }
        PublishStatus::Failed { publisher, error } => {
            println!("Publish FAILED via {publisher}: {error}");
        }
        PublishStatus::Skipped { reason } => println!("Publish:       skipped ({reason})"),
    }

    if !outcome.skipped.is_empty() {
        println!();
        println!("{:<10} {:<22} {:>8}  {}", "Symbol", "Reason", "Attempts", "Detail");
        println!("{}", "-".repeat(72));
        for s in &outcome.skipped {
            println!("{:<10} {:<22} {:>8}  {}", s.symbol, s.kind, s.attempts, s.reason);
        }
    }
}

fn run_signals(symbol: &str, config_path: Option<PathBuf>, date: Option<String>) -> Result<()> {
    let config = load_config(config_path)?;
    let today = parse_date(date)?;
    let provider = build_provider(&config)?;
    let processor = TickerProcessor::new(&provider, config.report.window_days);

    let entry = RosterEntry::new(symbol, symbol);
    let row = processor.process(&entry, today)?;
    println!(
        "{symbol} via {} ({} closes, {} to {})",
        provider.name(),
        row.closes.len(),
        row.closes.keys().next().map(|d| d.to_string()).unwrap_or_default(),
        row.closes.keys().last().map(|d| d.to_string()).unwrap_or_default(),
    );
    print_signals(&row.signals);
    Ok(())
}

fn print_signals(s: &SignalSet) {
    println!("{:<24} {:>12}", "price_90_days_ago", format!("{:.4}", s.price_90_days_ago));
    println!("{:<24} {:>12}", "price_30_days_ago", format!("{:.4}", s.price_30_days_ago));
    println!("{:<24} {:>12}", "price_21_days_ago", format!("{:.4}", s.price_21_days_ago));
    println!("{:<24} {:>12}", "price_7_days_ago", format!("{:.4}", s.price_7_days_ago));
    println!("{:<24} {:>12}", "price_most_recent", format!("{:.4}", s.price_most_recent));
    println!("{:<24} {:>11.2}%", "price_change_7_days", s.price_change_7_days * 100.0);
    println!("{:<24} {:>11.2}%", "price_change_21_days", s.price_change_21_days * 100.0);
    println!("{:<24} {:>11.2}%", "price_change_30_days", s.price_change_30_days * 100.0);
    println!("{:<24} {:>11.2}%", "price_change_90_days", s.price_change_90_days * 100.0);
    println!("{:<24} {:>12}", "constant_price_drop_7", s.constant_price_drop_7);
    println!("{:<24} {:>12}", "constant_price_drop_21", s.constant_price_drop_21);
}

fn run_roster(config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config(config_path)?;
    let roster = Roster::from_csv_path(&config.roster.path, &config.roster.strip_suffixes)?;

    println!("Roster: {} ({} tickers)", config.roster.path.display(), roster.len());
    println!("{:<10} {}", "Symbol", "Name");
    println!("{}", "-".repeat(40));
    for entry in roster.iter() {
        println!("{:<10} {}", entry.symbol, entry.display_name);
    }
    Ok(())
}

fn run_init_config(output: Option<&Path>, force: bool) -> Result<()> {
    let toml = RunConfig::default().to_toml()?;
    match output {
        None => print!("{toml}"),
        Some(path) => {
            if path.exists() && !force {
                bail!("{} already exists (use --force to overwrite)", path.display());
            }
            std::fs::write(path, toml)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("Wrote default config to {}", path.display());
        }
    }
    Ok(())
}
