//! RateWatch Common Types
//!
//! This crate contains the types shared by the fetchers, the aggregator and
//! the dashboard: currencies, the per-refresh rate snapshot, the selected
//! primary rate and the derived forecast.

pub mod monetary;
pub mod snapshot;
pub mod time;

pub use monetary::*;
pub use snapshot::*;
pub use time::*;
