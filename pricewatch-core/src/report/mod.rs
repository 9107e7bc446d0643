//! Report rows, the column-reconciling report table, and its accumulator.
//!
//! Column layout of the table, left to right:
//! `symbol`, `company_name`, one column per date (ascending), then the
//! eleven signal columns in [`SIGNAL_COLUMNS`] order.

pub mod accumulator;
pub mod row;
pub mod table;

pub use accumulator::ReportAccumulator;
pub use row::{Cell, ReportRow};
pub use table::{ColumnReconciliation, ReportTable};

/// Explicit marker for cells with no data (a date outside a ticker's window).
pub const NO_DATA_MARKER: &str = "None";

pub const SYMBOL_COLUMN: &str = "symbol";
pub const DISPLAY_NAME_COLUMN: &str = "company_name";

/// Signal columns, in table order.
pub const SIGNAL_COLUMNS: [&str; 11] = [
    "price_90_days_ago",
    "price_30_days_ago",
    "price_21_days_ago",
    "price_7_days_ago",
    "price_most_recent",
    "price_change_7_days",
    "price_change_21_days",
    "price_change_30_days",
    "price_change_90_days",
    "constant_price_drop_7",
    "constant_price_drop_21",
];

/// Change-ratio columns, rendered as percentages.
pub const PERCENT_COLUMNS: [&str; 4] = [
    "price_change_7_days",
    "price_change_21_days",
    "price_change_30_days",
    "price_change_90_days",
];

/// Columns shown by default in the formatted report; every other column
/// (the daily closes) is hidden but kept.
pub fn keep_visible_columns() -> Vec<&'static str> {
    let mut cols = vec![SYMBOL_COLUMN, DISPLAY_NAME_COLUMN];
    cols.extend(SIGNAL_COLUMNS);
    cols
}
