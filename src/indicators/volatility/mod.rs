//! Volatility indicators: annualized realized volatility, simple rolling volatility

pub mod realized;
pub mod rolling;

pub use realized::*;
pub use rolling::*;
