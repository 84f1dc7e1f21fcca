//! Error taxonomy for remote wagering calls and local orchestration.
//!
//! Remote failures (`WagerError`) travel through the retry executor
//! unchanged. Local precondition violations (`OrchestrationError`) are
//! raised immediately and never retried.

use rust_decimal::Decimal;
use thiserror::Error;

use super::event::{BetId, EventId};
use super::session::SessionState;
use super::wager::BetStatus;

/// Decides whether a failure may be retried.
///
/// The retry loop consults this and nothing else about the error.
pub trait Retryable {
    /// `true` if another attempt may succeed.
    fn is_retryable(&self) -> bool;
}

/// Why the bookmaker refused a placement.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlacementRejection {
    /// A leg was suspended at placement time.
    #[error("leg {event_id} unavailable at placement")]
    LegUnavailable {
        /// Offending leg.
        event_id: EventId,
    },

    /// A leg's odds dropped below the bookmaker's minimum.
    #[error("leg {event_id} odds {odds} below minimum {minimum}")]
    OddsBelowMinimum {
        /// Offending leg.
        event_id: EventId,
        /// Odds presented.
        odds: Decimal,
        /// Required minimum.
        minimum: Decimal,
    },

    /// Prices moved during placement and the bookmaker declined them.
    #[error("odds changed during placement")]
    OddsChanged,

    /// The session token was not recognised.
    #[error("invalid session")]
    InvalidSession,
}

/// Failures reported by the remote wagering service.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WagerError {
    /// Network or service hiccup.
    #[error("transient service error: {0}")]
    Transient(String),

    /// Credentials refused.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Placement refused.
    #[error("placement rejected: {0}")]
    Placement(#[from] PlacementRejection),

    /// Unknown bet identifier.
    #[error("bet {0} not found")]
    NotFound(String),
}

impl Retryable for WagerError {
    /// Every remote failure is retried; auth and placement rejections
    /// are not distinguished from transient ones.
    fn is_retryable(&self) -> bool {
        true
    }
}

/// Failures of the placement state machine.
#[derive(Error, Debug)]
pub enum OrchestrationError {
    /// Username or password empty.
    #[error("credentials must not be empty")]
    EmptyCredentials,

    /// An operation requiring a token ran before login.
    #[error("not authenticated")]
    NotAuthenticated,

    /// Too few eligible legs to form an accumulator.
    #[error("not enough valid legs to form an accumulator: found {found}, need {required}")]
    InsufficientLegs {
        /// Legs that survived selection.
        found: usize,
        /// Minimum legs required.
        required: usize,
    },

    /// Stake was zero or negative.
    #[error("stake must be positive, got {0}")]
    NonPositiveStake(Decimal),

    /// Placement succeeded without a usable bet id.
    #[error("no bet id returned from placement")]
    MissingBetId,

    /// Confirmation requested for a bet this session did not place.
    #[error("bet {got} was not placed by this session (expected {expected})")]
    UnexpectedBetId {
        /// Bet id returned by placement.
        expected: BetId,
        /// Bet id passed to confirmation.
        got: BetId,
    },

    /// The bookmaker's canonical record shows the bet was not accepted.
    #[error("bet {bet_id} not accepted: {status}")]
    BetNotAccepted {
        /// Bet in question.
        bet_id: BetId,
        /// Status reported on confirmation.
        status: BetStatus,
    },

    /// Operation not allowed in the current state.
    #[error("cannot {action} while {state}")]
    InvalidTransition {
        /// Current state.
        state: SessionState,
        /// Attempted operation.
        action: &'static str,
    },

    /// The session already failed; it accepts no further operations.
    #[error("session has failed and accepts no further operations")]
    SessionFailed,

    /// A remote call failed after retries were exhausted.
    #[error(transparent)]
    Remote(#[from] WagerError),

    /// The confirmed bet could not be persisted.
    #[error("failed to persist confirmed bet: {0}")]
    Persistence(String),
}

impl Retryable for OrchestrationError {
    fn is_retryable(&self) -> bool {
        false
    }
}
