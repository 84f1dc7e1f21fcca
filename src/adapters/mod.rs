//! Adapters Layer - Hexagonal Architecture Outer Ring
//!
//! Implements the port traits defined in `crate::ports` with concrete
//! infrastructure. Each sub-module groups adapters by concern.
//!
//! Adapter categories:
//! - `bookmaker`: Simulated wagering service with failure injection
//! - `metrics`: Prometheus textfile export
//! - `persistence`: JSONL bet log and run lock

pub mod bookmaker;
pub mod metrics;
pub mod persistence;
