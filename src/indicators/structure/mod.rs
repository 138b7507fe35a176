//! Market structure indicators: Fibonacci retracement

pub mod fibonacci;

pub use fibonacci::*;
