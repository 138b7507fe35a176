pub mod common;
pub mod config;
pub mod core;
pub mod error;
pub mod evaluation;
pub mod forecasting;
pub mod indicators;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod preprocessing;
pub mod services;
pub mod signals;
