#![doc = include_str!("../README.md")]
#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

/// Tile sources
pub mod tiles;

/// Metric quantile sources
pub mod metrics;
