//! Adjusted-close price series for one symbol.

use crate::data::RawBar;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub adj_close: f64,
}

/// Date-ordered adjusted closes, one point per trading day.
///
/// Invariants: strictly increasing dates, finite prices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    symbol: String,
    points: Vec<PricePoint>,
}

impl PriceSeries {
    /// Build from provider bars. Bars without a finite adjusted close are
    /// dropped; for a repeated date the later bar wins.
    pub fn from_bars(symbol: &str, bars: &[RawBar]) -> Self {
        let mut points: Vec<PricePoint> = bars
            .iter()
            .filter(|b| b.adj_close.is_finite())
            .map(|b| PricePoint {
                date: b.date,
                adj_close: b.adj_close,
            })
            .collect();
        points.sort_by_key(|p| p.date);

        let mut deduped: Vec<PricePoint> = Vec::with_capacity(points.len());
        for point in points {
            match deduped.last_mut() {
                Some(last) if last.date == point.date => *last = point,
                _ => deduped.push(point),
            }
        }

        Self {
            symbol: symbol.to_string(),
            points: deduped,
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<&PricePoint> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&PricePoint> {
        self.points.last()
    }

    /// Positional lookback: `nth_from_end(1)` is the most recent point,
    /// `nth_from_end(7)` the seventh-to-last.
    pub fn nth_from_end(&self, n: usize) -> Option<&PricePoint> {
        if n == 0 || n > self.points.len() {
            return None;
        }
        self.points.get(self.points.len() - n)
    }

    /// Adjusted closes in chronological order.
    pub fn closes(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.adj_close).collect()
    }
}
