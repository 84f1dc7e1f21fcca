//! Domain layer - Core betting types and pure logic.
//!
//! Events, legs, wagers, session states, the error taxonomy and the
//! leg selector. Nothing in here performs I/O; randomness is injected
//! through `RandomSource`.

pub mod error;
pub mod event;
pub mod random;
pub mod selection;
pub mod session;
pub mod wager;

// Re-export core types for convenience
pub use error::{OrchestrationError, PlacementRejection, Retryable, WagerError};
pub use event::{BetId, Event, EventId, Leg};
pub use random::{RandomSource, SeededRandom};
pub use selection::{MatchSelector, SelectionMode};
pub use session::{Session, SessionState, SessionToken};
pub use wager::{BetStatus, WagerRequest, WagerResult};
