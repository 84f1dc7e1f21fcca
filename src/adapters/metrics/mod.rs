//! Metrics Adapter
//!
//! Prometheus counters and gauges for a single run, exported as a
//! textfile-collector file.

pub mod prometheus;

pub use prometheus::RunMetrics;
