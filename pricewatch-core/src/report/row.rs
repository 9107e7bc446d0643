//! One report row per successfully processed ticker.

use super::NO_DATA_MARKER;
use crate::domain::{PriceSeries, RosterEntry};
use crate::signals::SignalSet;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A rendered table cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Cell {
    Text(String),
    Number(f64),
    Flag(bool),
    /// No observation for this column; rendered as [`NO_DATA_MARKER`].
    Missing,
}

impl Cell {
    /// Numbers that are not finite are treated as missing data.
    pub fn number(value: f64) -> Self {
        if value.is_finite() {
            Cell::Number(value)
        } else {
            Cell::Missing
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Cell::Missing)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Text(s) => f.write_str(s),
            Cell::Number(v) => write!(f, "{v}"),
            Cell::Flag(b) => write!(f, "{b}"),
            Cell::Missing => f.write_str(NO_DATA_MARKER),
        }
    }
}

/// Fully populated row: identity, the whole close series, and the signals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRow {
    pub symbol: String,
    pub display_name: String,
    pub closes: BTreeMap<NaiveDate, f64>,
    pub signals: SignalSet,
}

impl ReportRow {
    pub fn new(entry: &RosterEntry, series: &PriceSeries, signals: SignalSet) -> Self {
        Self {
            symbol: entry.symbol.clone(),
            display_name: entry.display_name.clone(),
            closes: series
                .points()
                .iter()
                .map(|p| (p.date, p.adj_close))
                .collect(),
            signals,
        }
    }

    pub fn dates(&self) -> impl Iterator<Item = &NaiveDate> {
        self.closes.keys()
    }

    /// Close on `date`, or the no-data cell when the ticker has none.
    pub fn close_cell(&self, date: &NaiveDate) -> Cell {
        self.closes
            .get(date)
            .map_or(Cell::Missing, |&v| Cell::number(v))
    }

    /// Signal cells in `SIGNAL_COLUMNS` order.
    pub fn signal_cells(&self) -> [Cell; 11] {
        let s = &self.signals;
        [
            Cell::number(s.price_90_days_ago),
            Cell::number(s.price_30_days_ago),
            Cell::number(s.price_21_days_ago),
            Cell::number(s.price_7_days_ago),
            Cell::number(s.price_most_recent),
            Cell::number(s.price_change_7_days),
            Cell::number(s.price_change_21_days),
            Cell::number(s.price_change_30_days),
            Cell::number(s.price_change_90_days),
            Cell::Flag(s.constant_price_drop_7),
            Cell::Flag(s.constant_price_drop_21),
        ]
    }
}
