//! Reads the formatted workbook back and checks what a reader of the
//! published file sees.

use calamine::{open_workbook, Data, Range, Reader, Xlsx};
use chrono::NaiveDate;
use pricewatch_core::data::fixture::{rising_bars, weekday_bars};
use pricewatch_core::data::StaticProvider;
use pricewatch_core::report::PERCENT_COLUMNS;
use pricewatch_core::{ReportAggregator, RetryPolicy, Roster, RosterEntry, TickerProcessor};
use pricewatch_runner::{write_raw_csv, FormatError, ReportFormatter};
use std::path::Path;

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 8, 30).unwrap()
}

/// AAA is current; BBB's last session was the day before, so its row has
/// one `None` date cell.
fn write_raw(dir: &Path) -> std::path::PathBuf {
    let provider = StaticProvider::new()
        .with_series("AAA", rising_bars(today(), 40))
        .with_series(
            "BBB",
            weekday_bars(NaiveDate::from_ymd_opt(2024, 8, 29).unwrap(), &[10.0; 35]),
        );
    let roster = Roster::new([
        RosterEntry::new("AAA", "Alpha"),
        RosterEntry::new("BBB", "Beta"),
    ]);
    let report = ReportAggregator::new(TickerProcessor::new(&provider, 90))
        .with_retry(RetryPolicy::immediate(1))
        .build(&roster, today())
        .unwrap();

    let raw = dir.join("stocks.csv");
    write_raw_csv(&report.table, &raw).unwrap();
    raw
}

fn read_sheet(path: &Path) -> Range<Data> {
    let mut wb: Xlsx<_> = open_workbook(path).unwrap();
    wb.worksheet_range("stocks").unwrap()
}

fn column(range: &Range<Data>, name: &str) -> usize {
    range
        .rows()
        .next()
        .unwrap()
        .iter()
        .position(|c| c == &Data::String(name.to_string()))
        .unwrap_or_else(|| panic!("no column {name}"))
}

#[test]
fn ratios_are_numbers_and_marked_percent() {
    let dir = tempfile::tempdir().unwrap();
    let raw = write_raw(dir.path());
    let out = dir.path().join("stocks_formatted.xlsx");

    let layout = ReportFormatter::new("stocks", 20.0)
        .format_file(&raw, &out)
        .unwrap();

    for name in PERCENT_COLUMNS {
        let style = layout.columns.iter().find(|c| c.name == name).unwrap();
        assert!(style.percent);
        assert!(!style.hidden);
        assert_eq!(style.width, Some(20.0));
    }

    let range = read_sheet(&out);
    let col = column(&range, "price_change_7_days");
    // AAA closes are 100.0, 100.5, ..., 119.5.
    let expected = (119.5 - 116.5) / 119.5;
    match range.get((1, col)) {
        Some(Data::Float(v)) => assert!((v - expected).abs() < 1e-12),
        other => panic!("expected a number, got {other:?}"),
    }
    // Every data row carries a number in the ratio column, the last one included.
    assert!(matches!(range.get((2, col)), Some(Data::Float(_))));
}

#[test]
fn hidden_history_is_still_readable() {
    let dir = tempfile::tempdir().unwrap();
    let raw = write_raw(dir.path());
    let out = dir.path().join("stocks_formatted.xlsx");

    let layout = ReportFormatter::new("stocks", 20.0)
        .format_file(&raw, &out)
        .unwrap();

    let last_date = layout
        .columns
        .iter()
        .position(|c| c.name == "2024-08-30")
        .unwrap();
    assert!(layout.columns[last_date].hidden);
    assert_eq!(layout.visible().count(), 13);

    let range = read_sheet(&out);
    assert_eq!(range.get((1, last_date)), Some(&Data::Float(119.5)));
    assert_eq!(range.get((2, last_date)), Some(&Data::String("None".into())));

    let drop7 = column(&range, "constant_price_drop_7");
    assert_eq!(range.get((1, drop7)), Some(&Data::Bool(false)));
    assert_eq!(range.get((2, drop7)), Some(&Data::Bool(true)));
}

#[test]
fn raw_artifact_is_left_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let raw = write_raw(dir.path());
    let before = std::fs::read(&raw).unwrap();

    ReportFormatter::new("stocks", 20.0)
        .format_file(&raw, &dir.path().join("stocks_formatted.xlsx"))
        .unwrap();

    assert_eq!(std::fs::read(&raw).unwrap(), before);
    assert!(matches!(
        ReportFormatter::new("stocks", 20.0).format_file(&raw, &raw),
        Err(FormatError::SameInputOutput(_))
    ));
}
