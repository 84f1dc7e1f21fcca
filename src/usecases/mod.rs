//! Use Cases Layer - Application Business Logic
//!
//! Orchestrates domain logic with port interfaces to implement the
//! bot's single workflow: place and confirm one accumulator.
//!
//! Use cases:
//! - `RetryExecutor`: Bounded retries with backoff for every remote call
//! - `BettingSession`: Login → build → submit → confirm state machine

pub mod betting_session;
pub mod retry;

pub use betting_session::BettingSession;
pub use retry::{AttemptOutcome, RetryExecutor, RetryObserver, RetryPolicy};
