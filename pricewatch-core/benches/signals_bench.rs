//! Criterion benchmarks for the per-run hot paths.
//!
//! Benchmarks:
//! 1. Signal computation over a 90-day series
//! 2. Roster aggregation against the in-memory provider (table reconciliation)

use chrono::NaiveDate;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use pricewatch_core::data::fixture::{rising_bars, weekday_bars};
use pricewatch_core::data::StaticProvider;
use pricewatch_core::domain::PriceSeries;
use pricewatch_core::progress::SilentProgress;
use pricewatch_core::{
    ReportAggregator, RetryPolicy, Roster, RosterEntry, SignalSet, TickerProcessor,
    DEFAULT_WINDOW_DAYS,
};

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 14).unwrap()
}

fn bench_signals(c: &mut Criterion) {
    let closes: Vec<f64> = (0..63).map(|i| 100.0 + (i as f64 * 0.3).sin() * 5.0).collect();
    let series = PriceSeries::from_bars("BENCH", &weekday_bars(today(), &closes));

    c.bench_function("signal_set_63_bars", |b| {
        b.iter(|| SignalSet::compute(black_box(&series)))
    });
}

fn bench_aggregation(c: &mut Criterion) {
    let mut provider = StaticProvider::new();
    let mut entries = Vec::new();
    for i in 0..200 {
        let symbol = format!("T{i:03}");
        // Stagger the series ends so the table has to widen its columns.
        let last = today() - chrono::Duration::days(i % 5);
        provider = provider.with_series(&symbol, rising_bars(last, 60));
        entries.push(RosterEntry::new(symbol, "Bench Co"));
    }
    let roster = Roster::new(entries);
    let progress = SilentProgress;

    c.bench_function("aggregate_200_tickers", |b| {
        b.iter(|| {
            ReportAggregator::new(TickerProcessor::new(&provider, DEFAULT_WINDOW_DAYS))
                .with_retry(RetryPolicy::immediate(1))
                .with_progress(&progress)
                .build(black_box(&roster), today())
        })
    });
}

criterion_group!(benches, bench_signals, bench_aggregation);
criterion_main!(benches);
