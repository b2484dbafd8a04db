//! Market data produced by providers

mod bar;
mod tick;

pub use bar::{Bar, HistoricBarData, HistoricBarRequest};
pub use tick::Tick;
