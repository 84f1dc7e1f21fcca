//! Persistence Adapters - File-based Storage
//!
//! Confirmed bets go to an append-only JSONL log; a PID lock file keeps
//! two runs from sharing one data directory. No database dependency.

pub mod bet_log;
pub mod lock;

pub use bet_log::BetLog;
pub use lock::RunLock;
