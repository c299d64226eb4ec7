//! Price charts and historical data module
//!
//! Provides:
//! - Instrument, time range and series types
//! - Normalization of provider payloads into one series shape
//! - Summary metrics and their display formatting

pub mod calculator;
pub mod format;
pub mod normalizer;
pub mod types;

pub use calculator::*;
pub use format::*;
pub use normalizer::*;
pub use types::*;
