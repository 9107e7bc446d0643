//! Ticker roster — the list of symbols processed on every run.
//!
//! The roster file is a headerless two-column CSV: `raw_symbol,display_name`.
//! Raw symbols may carry a broker market suffix (`AAPL.US`) that the market
//! data provider does not understand, so configured suffixes are stripped
//! from the end of each symbol while loading.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// One roster line after normalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub symbol: String,
    pub display_name: String,
}

impl RosterEntry {
    pub fn new(symbol: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            display_name: display_name.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum RosterError {
    #[error("failed to open roster {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed roster CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("roster line {line}: empty symbol")]
    EmptySymbol { line: u64 },

    #[error("roster line {line}: missing display name for '{symbol}'")]
    MissingDisplayName { line: u64, symbol: String },
}

/// Ordered, de-duplicated list of tickers. Immutable once loaded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Roster {
    entries: Vec<RosterEntry>,
}

impl Roster {
    /// Build a roster, keeping the first entry for any repeated symbol.
    pub fn new(entries: impl IntoIterator<Item = RosterEntry>) -> Self {
        let mut seen = HashSet::new();
        let mut kept = Vec::new();
        for entry in entries {
            if seen.insert(entry.symbol.clone()) {
                kept.push(entry);
            } else {
                tracing::warn!(symbol = %entry.symbol, "duplicate roster symbol ignored");
            }
        }
        Self { entries: kept }
    }

    pub fn from_csv_path(path: &Path, strip_suffixes: &[String]) -> Result<Self, RosterError> {
        let file = std::fs::File::open(path).map_err(|source| RosterError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_csv_reader(file, strip_suffixes)
    }

    pub fn from_csv_reader<R: Read>(reader: R, strip_suffixes: &[String]) -> Result<Self, RosterError> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut entries = Vec::new();
        for record in rdr.records() {
            let record = record?;
            let line = record.position().map(|p| p.line()).unwrap_or(0);

            // Blank lines come through as a single empty field.
            if record.iter().all(str::is_empty) {
                continue;
            }

            let raw_symbol = record.get(0).unwrap_or_default();
            let symbol = normalize_symbol(raw_symbol, strip_suffixes);
            if symbol.is_empty() {
                return Err(RosterError::EmptySymbol { line });
            }

            let display_name = match record.get(1) {
                Some(name) if !name.is_empty() => name.to_string(),
                _ => return Err(RosterError::MissingDisplayName { line, symbol }),
            };

            entries.push(RosterEntry {
                symbol,
                display_name,
            });
        }

        Ok(Self::new(entries))
    }

    pub fn entries(&self) -> &[RosterEntry] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &RosterEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, symbol: &str) -> Option<&RosterEntry> {
        self.entries.iter().find(|e| e.symbol == symbol)
    }
}

/// Trim whitespace and strip the first matching market suffix from the end.
pub fn normalize_symbol(raw: &str, strip_suffixes: &[String]) -> String {
    let trimmed = raw.trim();
    strip_suffixes
        .iter()
        .filter(|s| !s.is_empty())
        .find_map(|suffix| trimmed.strip_suffix(suffix.as_str()))
        .unwrap_or(trimmed)
        .to_string()
}
