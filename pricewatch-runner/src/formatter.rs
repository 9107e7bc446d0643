//! Report formatter: raw CSV artifact in, presentation workbook out.
//!
//! The layout decision is a pure function of the header ([`SheetLayout`]);
//! writing the workbook is a thin pass over it. Columns outside the
//! keep-visible set are hidden, never dropped, so every raw value is still
//! in the published file.

use pricewatch_core::report::{
    keep_visible_columns, DISPLAY_NAME_COLUMN, NO_DATA_MARKER, PERCENT_COLUMNS, SYMBOL_COLUMN,
};
use rust_xlsxwriter::{Format, Workbook, XlsxError};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::artifacts::write_atomic;

/// Number format applied to the change-ratio columns.
pub const PERCENT_FORMAT: &str = "0.00%";

#[derive(Debug, Error)]
pub enum FormatError {
    #[error("failed to read raw report {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("raw report {0} has no header row")]
    MissingHeader(PathBuf),

    #[error("raw report has {0} columns, more than a worksheet can hold")]
    TooManyColumns(usize),

    #[error("refusing to format {0} in place")]
    SameInputOutput(PathBuf),

    #[error("workbook error: {0}")]
    Workbook(#[from] XlsxError),

    #[error("failed to write formatted report {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Presentation settings for one column.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnStyle {
    pub name: String,
    pub hidden: bool,
    pub width: Option<f64>,
    pub percent: bool,
}

/// Per-column presentation for a whole sheet, in header order.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetLayout {
    pub columns: Vec<ColumnStyle>,
}

impl SheetLayout {
    /// Visible columns get `width`; everything else is hidden. The four
    /// change ratios are percent-formatted.
    pub fn for_header<S: AsRef<str>>(header: &[S], width: f64) -> Self {
        let keep = keep_visible_columns();
        let columns = header
            .iter()
            .map(|name| {
                let name = name.as_ref();
                let visible = keep.iter().any(|k| *k == name);
                ColumnStyle {
                    name: name.to_string(),
                    hidden: !visible,
                    width: visible.then_some(width),
                    percent: PERCENT_COLUMNS.iter().any(|p| *p == name),
                }
            })
            .collect();
        Self { columns }
    }

    pub fn visible(&self) -> impl Iterator<Item = &ColumnStyle> {
        self.columns.iter().filter(|c| !c.hidden)
    }

    pub fn hidden_count(&self) -> usize {
        self.columns.iter().filter(|c| c.hidden).count()
    }
}

/// How a raw CSV field is written into the workbook.
#[derive(Debug, Clone, PartialEq)]
enum SheetValue<'a> {
    Text(&'a str),
    Number(f64),
    Flag(bool),
}

fn classify<'a>(column: &str, raw: &'a str) -> SheetValue<'a> {
    if column == SYMBOL_COLUMN || column == DISPLAY_NAME_COLUMN || raw == NO_DATA_MARKER {
        return SheetValue::Text(raw);
    }
    match raw {
        "true" => SheetValue::Flag(true),
        "false" => SheetValue::Flag(false),
        _ => match raw.parse::<f64>() {
            Ok(v) if v.is_finite() => SheetValue::Number(v),
            _ => SheetValue::Text(raw),
        },
    }
}

/// Turns the raw artifact into the formatted workbook.
#[derive(Debug, Clone)]
pub struct ReportFormatter {
    sheet_name: String,
    column_width: f64,
}

impl ReportFormatter {
    pub fn new(sheet_name: impl Into<String>, column_width: f64) -> Self {
        Self {
            sheet_name: sheet_name.into(),
            column_width,
        }
    }

    /// Read `input` (raw CSV) and write a distinct xlsx at `output`.
    pub fn format_file(&self, input: &Path, output: &Path) -> Result<SheetLayout, FormatError> {
        if input == output {
            return Err(FormatError::SameInputOutput(output.to_path_buf()));
        }

        let read_err = |source| FormatError::Read {
            path: input.to_path_buf(),
            source,
        };
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_path(input)
            .map_err(read_err)?;
        let header: Vec<String> = rdr
            .headers()
            .map_err(read_err)?
            .iter()
            .map(str::to_string)
            .collect();
        if header.is_empty() {
            return Err(FormatError::MissingHeader(input.to_path_buf()));
        }
        let records = rdr
            .records()
            .collect::<Result<Vec<_>, _>>()
            .map_err(read_err)?;

        let layout = SheetLayout::for_header(&header, self.column_width);
        let bytes = self.render(&layout, &records)?;
        write_atomic(output, &bytes).map_err(|source| FormatError::Write {
            path: output.to_path_buf(),
            source,
        })?;

        tracing::info!(
            path = %output.display(),
            rows = records.len(),
            hidden = layout.hidden_count(),
            "wrote formatted report"
        );
        Ok(layout)
    }

    fn render(&self, layout: &SheetLayout, records: &[csv::StringRecord]) -> Result<Vec<u8>, FormatError> {
        if layout.columns.len() > usize::from(u16::MAX) {
            return Err(FormatError::TooManyColumns(layout.columns.len()));
        }

        let percent = Format::new().set_num_format(PERCENT_FORMAT);
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.set_name(&self.sheet_name)?;

        for (col, style) in layout.columns.iter().enumerate() {
            let col = col as u16;
            sheet.write_string(0, col, &style.name)?;
            if style.hidden {
                sheet.set_column_hidden(col)?;
            } else if let Some(width) = style.width {
                sheet.set_column_width(col, width)?;
            }
        }

        for (i, record) in records.iter().enumerate() {
            let row = i as u32 + 1;
            for (col, (style, raw)) in layout.columns.iter().zip(record.iter()).enumerate() {
                let col = col as u16;
                match classify(&style.name, raw) {
                    SheetValue::Number(v) if style.percent => {
                        sheet.write_number_with_format(row, col, v, &percent)?;
                    }
                    SheetValue::Number(v) => {
                        sheet.write_number(row, col, v)?;
                    }
                    SheetValue::Flag(b) => {
                        sheet.write_boolean(row, col, b)?;
                    }
                    SheetValue::Text(s) => {
                        sheet.write_string(row, col, s)?;
                    }
                }
            }
        }

        Ok(workbook.save_to_buffer()?)
    }
}
