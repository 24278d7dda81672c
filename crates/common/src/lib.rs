//! Common types and utilities for Review Latency

pub mod config;
pub mod error;
pub mod models;

pub use config::{CalendarConfig, Config, LatencyPolicy, RequestAttribution};
pub use error::{Error, Result};
