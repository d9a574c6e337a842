//! Domain types: canonical fields and instrument series.

pub mod field;
pub mod series;

pub use field::Field;
pub use series::{format_timestamp, Column, InstrumentSeries, SeriesError};

/// Instrument identifier (ticker / symbol).
pub type Symbol = String;
