//! Market data alignment

pub mod align;

pub use align::{align_records, MarketRecord};
