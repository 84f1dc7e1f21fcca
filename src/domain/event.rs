//! Sporting events offered by the bookmaker and the legs derived from them.
//!
//! An `Event` is an immutable snapshot as observed at fetch time; odds
//! may legitimately move before placement. A `Leg` freezes the odds and
//! availability seen at selection time.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ────────────────────────────────────────────
// Type aliases consumed by ports and adapters
// ────────────────────────────────────────────

/// Bookmaker-assigned event identifier.
pub type EventId = String;

/// Bookmaker-assigned bet identifier.
pub type BetId = String;

/// A fixture offered by the bookmaker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Unique event identifier (e.g. `M001`).
    pub id: EventId,
    /// Home participant.
    pub home: String,
    /// Away participant.
    pub away: String,
    /// Scheduled kick-off.
    pub starts_at: DateTime<Utc>,
    /// Current decimal odds (>= 1.0).
    pub odds: Decimal,
    /// Whether the event currently accepts wagers.
    pub available: bool,
}

impl Event {
    /// Human-readable selection text, e.g. `Team1A vs Team1B`.
    pub fn selection(&self) -> String {
        format!("{} vs {}", self.home, self.away)
    }

    /// Whether this event may be used as a leg under `min_odds`.
    pub fn is_eligible(&self, min_odds: Decimal) -> bool {
        self.available && self.odds >= min_odds
    }
}

/// One selection within an accumulator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Leg {
    /// Source event identifier.
    pub event_id: EventId,
    /// Human-readable selection.
    pub selection: String,
    /// Odds at selection time (may differ at placement).
    pub odds: Decimal,
    /// Availability at selection time.
    pub available: bool,
}

impl From<&Event> for Leg {
    fn from(event: &Event) -> Self {
        Self {
            event_id: event.id.clone(),
            selection: event.selection(),
            odds: event.odds,
            available: event.available,
        }
    }
}
