//! Repository Port - Confirmed Bet Persistence Interface
//!
//! Confirmed wagers are appended to a JSONL log. No database
//! dependency; each line is a self-contained record for auditing.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::event::{BetId, Leg};
use crate::domain::wager::{BetStatus, WagerResult};

/// One confirmed wager as written to the bet log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BetRecord {
  /// Bookmaker bet identifier.
  pub bet_id: BetId,
  /// Stake placed.
  pub stake: Decimal,
  /// Combined odds as confirmed.
  pub combined_odds: Decimal,
  /// Potential return as confirmed.
  pub potential_return: Decimal,
  /// Status at confirmation.
  pub status: BetStatus,
  /// Legs as confirmed by the bookmaker.
  pub legs: Vec<Leg>,
  /// When the bookmaker recorded the bet.
  pub placed_at: DateTime<Utc>,
  /// When the record was written.
  pub recorded_at: DateTime<Utc>,
}

impl BetRecord {
  /// Build a record from a confirmed result, stamped now.
  pub fn from_confirmed(result: &WagerResult) -> Self {
    Self {
      bet_id: result.bet_id.clone(),
      stake: result.stake,
      combined_odds: result.combined_odds,
      potential_return: result.potential_return,
      status: result.status,
      legs: result.legs.clone(),
      placed_at: result.placed_at,
      recorded_at: Utc::now(),
    }
  }
}

/// Trait for bet persistence providers.
///
/// Append-only: records are never rewritten or removed.
#[async_trait]
pub trait BetRepository: Send + Sync + 'static {
  /// Append a confirmed bet.
  async fn append(&self, record: &BetRecord) -> anyhow::Result<()>;

  /// Load every recorded bet in write order.
  async fn load_all(&self) -> anyhow::Result<Vec<BetRecord>>;
}
