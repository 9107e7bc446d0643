//! Report table with explicit column reconciliation.
//!
//! Tickers can return different date windows (a listing mid-window, a
//! trading halt, a provider gap). The table's date columns are the union of
//! every row's dates; a row with no close for a date column gets the
//! no-data cell. The union is kept sorted, so the column set depends only on
//! which rows are in the table, never on the order they arrived in.

use super::row::{Cell, ReportRow};
use super::{DISPLAY_NAME_COLUMN, SIGNAL_COLUMNS, SYMBOL_COLUMN};
use chrono::NaiveDate;
use std::collections::BTreeSet;

/// What changed in the column set when a row was appended.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnReconciliation {
    /// Date columns the new row introduced; earlier rows are backfilled.
    pub added_dates: Vec<NaiveDate>,
    /// Existing date columns the new row has no close for.
    pub backfilled_in_new_row: usize,
}

impl ColumnReconciliation {
    pub fn is_noop(&self) -> bool {
        self.added_dates.is_empty() && self.backfilled_in_new_row == 0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportTable {
    dates: BTreeSet<NaiveDate>,
    rows: Vec<ReportRow>,
}

impl ReportTable {
    /// One-row table; the first row fixes the initial date columns.
    pub fn from_first_row(row: ReportRow) -> Self {
        Self {
            dates: row.dates().copied().collect(),
            rows: vec![row],
        }
    }

    /// Append a row, widening the date columns to the union.
    pub fn append(&mut self, row: ReportRow) -> ColumnReconciliation {
        let added_dates: Vec<NaiveDate> = row
            .dates()
            .filter(|d| !self.dates.contains(*d))
            .copied()
            .collect();
        let backfilled_in_new_row = self
            .dates
            .iter()
            .filter(|d| !row.closes.contains_key(*d))
            .count();

        self.dates.extend(added_dates.iter().copied());
        self.rows.push(row);

        ColumnReconciliation {
            added_dates,
            backfilled_in_new_row,
        }
    }

    pub fn rows(&self) -> &[ReportRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn dates(&self) -> impl Iterator<Item = &NaiveDate> {
        self.dates.iter()
    }

    /// Header row.
    pub fn columns(&self) -> Vec<String> {
        let mut cols = Vec::with_capacity(2 + self.dates.len() + SIGNAL_COLUMNS.len());
        cols.push(SYMBOL_COLUMN.to_string());
        cols.push(DISPLAY_NAME_COLUMN.to_string());
        cols.extend(self.dates.iter().map(|d| d.format("%Y-%m-%d").to_string()));
        cols.extend(SIGNAL_COLUMNS.iter().map(|c| c.to_string()));
        cols
    }

    /// Cells of one row, aligned with [`columns`](Self::columns).
    pub fn row_cells(&self, row: &ReportRow) -> Vec<Cell> {
        let mut cells = Vec::with_capacity(2 + self.dates.len() + SIGNAL_COLUMNS.len());
        cells.push(Cell::Text(row.symbol.clone()));
        cells.push(Cell::Text(row.display_name.clone()));
        cells.extend(self.dates.iter().map(|d| row.close_cell(d)));
        cells.extend(row.signal_cells());
        cells
    }

    /// Every row rendered against the full column set.
    pub fn records(&self) -> impl Iterator<Item = Vec<Cell>> + '_ {
        self.rows.iter().map(|row| self.row_cells(row))
    }
}
