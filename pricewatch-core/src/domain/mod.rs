//! Domain types: roster entries and price series.

pub mod roster;
pub mod series;

pub use roster::{normalize_symbol, Roster, RosterEntry, RosterError};
pub use series::{PricePoint, PriceSeries};
