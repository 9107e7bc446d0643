//! Lazily-initialized report builder.
//!
//! The table has no schema until a ticker succeeds, because its date columns
//! come from the rows themselves. The accumulator starts `Empty` and becomes
//! `Populated` on the first row; later rows merge into the existing table.

use super::row::ReportRow;
use super::table::{ColumnReconciliation, ReportTable};

#[derive(Debug, Clone, Default, PartialEq)]
pub enum ReportAccumulator {
    #[default]
    Empty,
    Populated(ReportTable),
}

impl ReportAccumulator {
    pub fn new() -> Self {
        Self::Empty
    }

    /// Add a row. The first row creates the table and reports no reconciliation.
    pub fn push(&mut self, row: ReportRow) -> ColumnReconciliation {
        match self {
            ReportAccumulator::Empty => {
                *self = ReportAccumulator::Populated(ReportTable::from_first_row(row));
                ColumnReconciliation::default()
            }
            ReportAccumulator::Populated(table) => table.append(row),
        }
    }

    pub fn row_count(&self) -> usize {
        match self {
            ReportAccumulator::Empty => 0,
            ReportAccumulator::Populated(table) => table.len(),
        }
    }

    /// Finalize; `None` when no row was ever pushed.
    pub fn finish(self) -> Option<ReportTable> {
        match self {
            ReportAccumulator::Empty => None,
            ReportAccumulator::Populated(table) => Some(table),
        }
    }
}
