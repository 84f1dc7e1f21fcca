//! Ports Layer - Hexagonal Architecture Boundaries
//!
//! Defines the interfaces (traits) that the usecases layer requires
//! from the outside world. Adapters implement these traits.
//!
//! Port categories:
//! - `WageringService`: Remote bookmaker (login, feed, placement, lookup)
//! - `BetRepository`: Confirmed bet persistence (JSONL-based)

pub mod repository;
pub mod wagering;
