//! Periodic cloud cost sampling exported as a textfile-collector gauge.

pub mod config;
pub mod core;
pub mod debug;
pub mod domain;
pub mod errors;
pub mod logging;
pub mod scheduler;

pub const EXPORTER_VERSION: &str = env!("CARGO_PKG_VERSION");
