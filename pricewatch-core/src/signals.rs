//! Signal calculator: price-change ratios and constant-decline detection.
//!
//! All lookbacks are positional. "7 days ago" is the seventh-to-last
//! observation of the series, not the close seven calendar days before the
//! most recent one; the series only contains trading days, so calendar
//! offsets would land on weekends and holidays.
//!
//! Change ratios are normalized by the *current* price:
//! `(current - past) / current`.

use crate::domain::PriceSeries;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Short decline window (observations).
pub const DECLINE_SHORT: usize = 7;
/// Long decline window (observations), only checked after a short decline.
pub const DECLINE_LONG: usize = 21;
/// Positions back from the end used for the 7/21/30 "days ago" prices.
pub const LOOKBACK_7: usize = 7;
pub const LOOKBACK_21: usize = 21;
pub const LOOKBACK_30: usize = 30;
/// Shortest series for which every change ratio is computable.
pub const MIN_OBSERVATIONS: usize = LOOKBACK_30;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SignalError {
    #[error("current price is zero; change ratio is undefined")]
    ZeroCurrentPrice,

    #[error("series has {observations} observations, {required} required")]
    TooShort { observations: usize, required: usize },
}

/// Signed change ratio `(current - past) / current`.
///
/// A zero current price is an error, never a silent infinity.
pub fn price_change(current: f64, past: f64) -> Result<f64, SignalError> {
    if current == 0.0 {
        return Err(SignalError::ZeroCurrentPrice);
    }
    Ok((current - past) / current)
}

/// True iff the last `n` values (chronological) never increase.
///
/// Equivalent to "sorting the window descending leaves it unchanged": equal
/// neighbours keep the streak alive, a single uptick breaks it. Windows
/// longer than `values` use every available value; `n == 0` is never a
/// decline.
pub fn constant_decline(values: &[f64], n: usize) -> bool {
    if n == 0 || values.is_empty() {
        return false;
    }
    let window = &values[values.len().saturating_sub(n)..];
    window.windows(2).all(|w| w[0] >= w[1])
}

/// Derived per-ticker signals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalSet {
    pub price_most_recent: f64,
    pub price_7_days_ago: f64,
    pub price_21_days_ago: f64,
    pub price_30_days_ago: f64,
    pub price_90_days_ago: f64,
    pub price_change_7_days: f64,
    pub price_change_21_days: f64,
    pub price_change_30_days: f64,
    pub price_change_90_days: f64,
    pub constant_price_drop_7: bool,
    /// Always false unless `constant_price_drop_7` is true.
    pub constant_price_drop_21: bool,
}

impl SignalSet {
    /// Compute every signal from a series of at least [`MIN_OBSERVATIONS`] points.
    pub fn compute(series: &PriceSeries) -> Result<Self, SignalError> {
        let too_short = || SignalError::TooShort {
            observations: series.len(),
            required: MIN_OBSERVATIONS,
        };
        if series.len() < MIN_OBSERVATIONS {
            return Err(too_short());
        }

        let at = |n: usize| series.nth_from_end(n).map(|p| p.adj_close).ok_or_else(too_short);
        let price_most_recent = at(1)?;
        let price_7_days_ago = at(LOOKBACK_7)?;
        let price_21_days_ago = at(LOOKBACK_21)?;
        let price_30_days_ago = at(LOOKBACK_30)?;
        let price_90_days_ago = series.first().map(|p| p.adj_close).ok_or_else(too_short)?;

        let closes = series.closes();
        let constant_price_drop_7 = constant_decline(&closes, DECLINE_SHORT);
        let constant_price_drop_21 =
            constant_price_drop_7 && constant_decline(&closes, DECLINE_LONG);

        Ok(Self {
            price_most_recent,
            price_7_days_ago,
            price_21_days_ago,
            price_30_days_ago,
            price_90_days_ago,
            price_change_7_days: price_change(price_most_recent, price_7_days_ago)?,
            price_change_21_days: price_change(price_most_recent, price_21_days_ago)?,
            price_change_30_days: price_change(price_most_recent, price_30_days_ago)?,
            price_change_90_days: price_change(price_most_recent, price_90_days_ago)?,
            constant_price_drop_7,
            constant_price_drop_21,
        })
    }
}
