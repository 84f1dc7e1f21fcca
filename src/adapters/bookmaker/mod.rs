//! Bookmaker Adapters
//!
//! Implementations of the `WageringService` port. Only the simulated
//! bookmaker exists; a real HTTP client would live alongside it.

pub mod simulated;

pub use simulated::SimulatedBookmaker;
