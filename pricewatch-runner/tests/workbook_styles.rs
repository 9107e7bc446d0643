//! Inspects the workbook XML directly: calamine reads values, but column
//! visibility and number formats only show up in the sheet and style parts.

use chrono::NaiveDate;
use pricewatch_core::data::fixture::{rising_bars, weekday_bars};
use pricewatch_core::data::StaticProvider;
use pricewatch_core::report::PERCENT_COLUMNS;
use pricewatch_core::{ReportAggregator, RetryPolicy, Roster, RosterEntry, TickerProcessor};
use pricewatch_runner::formatter::PERCENT_FORMAT;
use pricewatch_runner::{write_raw_csv, ReportFormatter, SheetLayout};
use std::io::Read;
use std::path::Path;

const DATA_ROWS: usize = 2;

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 8, 30).unwrap()
}

fn format_workbook(dir: &Path) -> (SheetLayout, std::path::PathBuf) {
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
    assert_eq!(report.table.len(), DATA_ROWS);

    let raw = dir.join("stocks.csv");
    let out = dir.join("stocks_formatted.xlsx");
    write_raw_csv(&report.table, &raw).unwrap();
    let layout = ReportFormatter::new("stocks", 20.0)
        .format_file(&raw, &out)
        .unwrap();
    (layout, out)
}

fn read_part(xlsx: &Path, name: &str) -> String {
    let file = std::fs::File::open(xlsx).unwrap();
    let mut archive = zip::ZipArchive::new(file).unwrap();
    let mut part = archive.by_name(name).unwrap();
    let mut xml = String::new();
    part.read_to_string(&mut xml).unwrap();
    xml
}

/// Opening tags of every `<{name} ...>` element.
fn elements<'a>(xml: &'a str, name: &str) -> Vec<&'a str> {
    let open = format!("<{name} ");
    xml.match_indices(&open)
        .map(|(start, _)| {
            let end = xml[start..].find('>').unwrap();
            &xml[start..start + end]
        })
        .collect()
}

fn attr<'a>(tag: &'a str, name: &str) -> Option<&'a str> {
    let key = format!(" {name}=\"");
    let start = tag.find(&key)? + key.len();
    let len = tag[start..].find('"')?;
    Some(&tag[start..start + len])
}

/// Zero-based column index to spreadsheet letters (0 → A, 26 → AA).
fn column_letters(mut index: usize) -> String {
    let mut letters = Vec::new();
    loop {
        letters.push(b'A' + (index % 26) as u8);
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap()
}

/// `true` when a `<col>` range covering the one-based column is hidden.
fn column_hidden(sheet: &str, one_based: usize) -> bool {
    elements(sheet, "col").into_iter().any(|tag| {
        let min: usize = attr(tag, "min").unwrap().parse().unwrap();
        let max: usize = attr(tag, "max").unwrap().parse().unwrap();
        (min..=max).contains(&one_based) && attr(tag, "hidden") == Some("1")
    })
}

#[test]
fn column_letters_roll_over() {
    assert_eq!(column_letters(0), "A");
    assert_eq!(column_letters(25), "Z");
    assert_eq!(column_letters(26), "AA");
    assert_eq!(column_letters(47), "AV");
}

#[test]
fn only_columns_outside_keep_visible_are_hidden() {
    let dir = tempfile::tempdir().unwrap();
    let (layout, xlsx) = format_workbook(dir.path());
    let sheet = read_part(&xlsx, "xl/worksheets/sheet1.xml");

    assert!(layout.hidden_count() > 0);
    for (i, style) in layout.columns.iter().enumerate() {
        assert_eq!(
            column_hidden(&sheet, i + 1),
            style.hidden,
            "column {} ({})",
            column_letters(i),
            style.name
        );
    }
}

#[test]
fn every_ratio_cell_uses_the_percent_format() {
    let dir = tempfile::tempdir().unwrap();
    let (layout, xlsx) = format_workbook(dir.path());
    let sheet = read_part(&xlsx, "xl/worksheets/sheet1.xml");
    let styles = read_part(&xlsx, "xl/styles.xml");

    let format_id = elements(&styles, "numFmt")
        .into_iter()
        .find(|tag| attr(tag, "formatCode") == Some(PERCENT_FORMAT))
        .and_then(|tag| attr(tag, "numFmtId"))
        .expect("percent number format registered")
        .to_string();

    let xfs_start = styles.find("<cellXfs").unwrap();
    let xfs_end = styles[xfs_start..].find("</cellXfs>").unwrap() + xfs_start;
    let percent_styles: Vec<String> = elements(&styles[xfs_start..xfs_end], "xf")
        .into_iter()
        .enumerate()
        .filter(|(_, tag)| attr(tag, "numFmtId") == Some(format_id.as_str()))
        .map(|(i, _)| i.to_string())
        .collect();
    assert!(!percent_styles.is_empty());

    let cells = elements(&sheet, "c");
    for name in PERCENT_COLUMNS {
        let col = layout.columns.iter().position(|c| c.name == name).unwrap();
        for row in 2..=DATA_ROWS + 1 {
            let cell_ref = format!("{}{row}", column_letters(col));
            let tag = cells
                .iter()
                .find(|tag| attr(tag, "r") == Some(cell_ref.as_str()))
                .unwrap_or_else(|| panic!("no cell {cell_ref}"));
            let style = attr(tag, "s").unwrap_or("0");
            assert!(
                percent_styles.iter().any(|s| s == style),
                "{cell_ref} ({name}) has style {style}"
            );
        }
    }

    // A neighbouring price column is not percent-formatted.
    let price_col = layout
        .columns
        .iter()
        .position(|c| c.name == "price_most_recent")
        .unwrap();
    let price_ref = format!("{}2", column_letters(price_col));
    let price_tag = cells
        .iter()
        .find(|tag| attr(tag, "r") == Some(price_ref.as_str()))
        .unwrap();
    let price_style = attr(price_tag, "s").unwrap_or("0");
    assert!(!percent_styles.iter().any(|s| s == price_style));
}
