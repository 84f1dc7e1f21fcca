//! Accumulator wager types.
//!
//! A `WagerRequest` is built by the engine for one run and discarded
//! afterwards. A `WagerResult` is owned by the bookmaker; the engine
//! only ever holds a read-only copy of it.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::event::{BetId, Leg};

/// Minimum number of legs for an accumulator.
pub const MIN_LEGS: usize = 2;

/// Decimal places used for currency amounts and reported odds.
pub const CURRENCY_DP: u32 = 2;

/// Acceptance status reported by the bookmaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BetStatus {
    /// Bet accepted at the reported odds.
    Accepted,
    /// Bet recorded but not yet settled by the bookmaker.
    Pending,
    /// Bet rejected after being recorded.
    Rejected,
}

impl std::fmt::Display for BetStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Accepted => write!(f, "ACCEPTED"),
            Self::Pending => write!(f, "PENDING"),
            Self::Rejected => write!(f, "REJECTED"),
        }
    }
}

/// Ordered legs plus stake, ready for placement.
///
/// `client_ref` is generated once per request and reused on every
/// placement retry so the bookmaker can deduplicate submissions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WagerRequest {
    /// Legs in placement order.
    pub legs: Vec<Leg>,
    /// Stake in account currency.
    pub stake: Decimal,
    /// Idempotency key for this request.
    pub client_ref: Uuid,
}

impl WagerRequest {
    /// Create a request with a fresh client reference.
    pub fn new(legs: Vec<Leg>, stake: Decimal) -> Self {
        Self {
            legs,
            stake,
            client_ref: Uuid::new_v4(),
        }
    }

    /// Product of the leg odds as selected (unrounded).
    pub fn combined_odds(&self) -> Decimal {
        combined_odds(&self.legs)
    }

    /// Return the request would pay at the selected odds.
    pub fn expected_return(&self) -> Decimal {
        potential_return(self.stake, self.combined_odds())
    }
}

/// Canonical bet record returned by placement and confirmation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WagerResult {
    /// Bookmaker bet identifier.
    pub bet_id: BetId,
    /// Acceptance status.
    pub status: BetStatus,
    /// Legs as recorded by the bookmaker (odds may have moved).
    pub legs: Vec<Leg>,
    /// Stake placed.
    pub stake: Decimal,
    /// Combined odds rounded to currency precision.
    pub combined_odds: Decimal,
    /// Stake × combined odds, rounded to currency precision.
    pub potential_return: Decimal,
    /// When the bookmaker recorded the bet.
    pub placed_at: DateTime<Utc>,
}

impl WagerResult {
    /// Whether the bookmaker accepted the bet.
    pub fn is_accepted(&self) -> bool {
        self.status == BetStatus::Accepted
    }
}

/// Product of leg odds in leg order.
pub fn combined_odds(legs: &[Leg]) -> Decimal {
    legs.iter().fold(Decimal::ONE, |acc, leg| acc * leg.odds)
}

/// `stake × combined_odds` rounded to currency precision.
pub fn potential_return(stake: Decimal, combined_odds: Decimal) -> Decimal {
    (stake * combined_odds).round_dp(CURRENCY_DP)
}
