//! Simulated Bookmaker - In-memory WageringService
//!
//! Stands in for a real bookmaker API. Behaviour is driven by
//! `SimulationConfig` and a seeded RNG so runs are reproducible:
//!
//! - any call may fail with a transient error (`network_failure_rate`)
//! - the feed lists `event_count` fixtures with random odds, a few of
//!   them suspended (`unavailable_rate`)
//! - placement rejects suspended legs and legs below the minimum odds
//! - placement may move every leg's odds (`odds_change_rate`) and then
//!   either accept at the new price or reject (`odds_change_reject_rate`)
//! - a recorded bet's response may be lost (`lost_response_rate`)
//!
//! Submissions are deduplicated by `WagerRequest::client_ref`: a retry
//! of a request that was already recorded returns the original bet.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::SimulationConfig;
use crate::domain::error::{PlacementRejection, WagerError};
use crate::domain::event::{BetId, Event, Leg};
use crate::domain::random::{RandomSource, SeededRandom};
use crate::domain::session::SessionToken;
use crate::domain::wager::{
    BetStatus, CURRENCY_DP, WagerRequest, WagerResult, combined_odds, potential_return,
};
use crate::ports::wagering::WageringService;

/// First bet id issued.
const FIRST_BET_ID: u64 = 1000;

/// Odds never move below this floor.
const ODDS_FLOOR: Decimal = Decimal::from_parts(105, 0, 0, false, 2);

/// Mutable bookmaker state.
struct BookState {
    /// RNG for failures, odds and tokens.
    rng: SeededRandom,
    /// Issued tokens → username.
    sessions: HashMap<SessionToken, String>,
    /// Recorded bets.
    bets: HashMap<BetId, WagerResult>,
    /// Client reference → bet id, for deduplication.
    by_client_ref: HashMap<Uuid, BetId>,
    /// Next numeric bet id.
    next_bet_id: u64,
}

/// In-memory bookmaker with seeded failure injection.
pub struct SimulatedBookmaker {
    /// Behaviour knobs.
    config: SimulationConfig,
    /// Minimum odds accepted at placement.
    min_odds: Decimal,
    /// Fixed event feed overriding generation.
    fixed_feed: Option<Vec<Event>>,
    /// Shared mutable state.
    state: Mutex<BookState>,
}

impl SimulatedBookmaker {
    /// Create a bookmaker enforcing `min_odds` on placement.
    pub fn new(config: SimulationConfig, min_odds: Decimal) -> Self {
        let rng = SeededRandom::new(config.seed);
        Self {
            config,
            min_odds,
            fixed_feed: None,
            state: Mutex::new(BookState {
                rng,
                sessions: HashMap::new(),
                bets: HashMap::new(),
                by_client_ref: HashMap::new(),
                next_bet_id: FIRST_BET_ID,
            }),
        }
    }

    /// Serve `events` from the feed instead of generating fixtures.
    #[must_use]
    pub fn with_fixed_feed(mut self, events: Vec<Event>) -> Self {
        self.fixed_feed = Some(events);
        self
    }

    /// Number of distinct bets recorded so far.
    pub async fn bet_count(&self) -> usize {
        self.state.lock().await.bets.len()
    }

    /// Roll for a simulated network failure.
    fn maybe_network_failure(&self, state: &mut BookState) -> Result<(), WagerError> {
        if state.rng.next_f64() < self.config.network_failure_rate {
            return Err(WagerError::Transient(
                "simulated transient network error".to_string(),
            ));
        }
        Ok(())
    }

    /// Generate the fixture list.
    fn generate_feed(&self, state: &mut BookState) -> Vec<Event> {
        let now = Utc::now();
        (1..=self.config.event_count)
            .map(|i| {
                let raw = state
                    .rng
                    .next_range(self.config.min_event_odds, self.config.max_event_odds);
                let odds = Decimal::from_f64(raw)
                    .unwrap_or(Decimal::ONE)
                    .round_dp(CURRENCY_DP);
                #[allow(clippy::cast_possible_wrap)]
                let offset = 30 + 10 * i as i64;
                Event {
                    id: format!("M{i:03}"),
                    home: format!("Team{i}A"),
                    away: format!("Team{i}B"),
                    starts_at: now + Duration::minutes(offset),
                    odds,
                    available: state.rng.next_f64() > self.config.unavailable_rate,
                }
            })
            .collect()
    }

    /// Reject legs that are suspended or below the minimum.
    fn validate_legs(&self, legs: &[Leg]) -> Result<(), PlacementRejection> {
        for leg in legs {
            if !leg.available {
                return Err(PlacementRejection::LegUnavailable {
                    event_id: leg.event_id.clone(),
                });
            }
            if leg.odds < self.min_odds {
                return Err(PlacementRejection::OddsBelowMinimum {
                    event_id: leg.event_id.clone(),
                    odds: leg.odds,
                    minimum: self.min_odds,
                });
            }
        }
        Ok(())
    }

    /// Move every leg's odds by a factor in `[0.90, 1.12)`.
    fn drift_odds(state: &mut BookState, legs: &mut [Leg]) {
        for leg in legs {
            let factor = Decimal::from_f64(state.rng.next_range(0.90, 1.12)).unwrap_or(Decimal::ONE);
            leg.odds = (leg.odds * factor).round_dp(CURRENCY_DP).max(ODDS_FLOOR);
        }
    }
}

#[async_trait]
impl WageringService for SimulatedBookmaker {
    async fn authenticate(&self, username: &str, password: &str) -> Result<SessionToken, WagerError> {
        let mut state = self.state.lock().await;
        self.maybe_network_failure(&mut state)?;

        if username.is_empty() || password.is_empty() {
            return Err(WagerError::Auth("Invalid credentials".to_string()));
        }

        let token = format!("session-{}", 10_000 + state.rng.next_index(90_000));
        state.sessions.insert(token.clone(), username.to_string());
        debug!(user = username, "Session issued");
        Ok(token)
    }

    async fn list_available_events(&self) -> Result<Vec<Event>, WagerError> {
        let mut state = self.state.lock().await;
        self.maybe_network_failure(&mut state)?;

        Ok(match &self.fixed_feed {
            Some(events) => events.clone(),
            None => self.generate_feed(&mut state),
        })
    }

    async fn place_wager(
        &self,
        token: &SessionToken,
        request: &WagerRequest,
    ) -> Result<WagerResult, WagerError> {
        let mut state = self.state.lock().await;
        self.maybe_network_failure(&mut state)?;

        if !state.sessions.contains_key(token) {
            return Err(PlacementRejection::InvalidSession.into());
        }

        if let Some(existing) = state
            .by_client_ref
            .get(&request.client_ref)
            .and_then(|id| state.bets.get(id))
        {
            info!(
                bet_id = %existing.bet_id,
                client_ref = %request.client_ref,
                "Duplicate submission, returning recorded bet"
            );
            return Ok(existing.clone());
        }

        self.validate_legs(&request.legs)?;

        let mut legs = request.legs.clone();
        if state.rng.next_f64() < self.config.odds_change_rate {
            Self::drift_odds(&mut state, &mut legs);
            if state.rng.next_f64() < self.config.odds_change_reject_rate {
                return Err(PlacementRejection::OddsChanged.into());
            }
        }

        let bet_id = format!("B{}", state.next_bet_id);
        state.next_bet_id += 1;

        let combined = combined_odds(&legs);
        let result = WagerResult {
            bet_id: bet_id.clone(),
            status: BetStatus::Accepted,
            legs,
            stake: request.stake,
            combined_odds: combined.round_dp(CURRENCY_DP),
            potential_return: potential_return(request.stake, combined),
            placed_at: Utc::now(),
        };

        state.bets.insert(bet_id.clone(), result.clone());
        state.by_client_ref.insert(request.client_ref, bet_id);

        if state.rng.next_f64() < self.config.lost_response_rate {
            return Err(WagerError::Transient(
                "simulated response lost after placement".to_string(),
            ));
        }

        Ok(result)
    }

    async fn get_wager(&self, bet_id: &str) -> Result<WagerResult, WagerError> {
        let mut state = self.state.lock().await;
        self.maybe_network_failure(&mut state)?;

        state
            .bets
            .get(bet_id)
            .cloned()
            .ok_or_else(|| WagerError::NotFound(bet_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn quiet() -> SimulationConfig {
        SimulationConfig {
            network_failure_rate: 0.0,
            unavailable_rate: 0.0,
            odds_change_rate: 0.0,
            odds_change_reject_rate: 0.0,
            lost_response_rate: 0.0,
            seed: Some(42),
            ..SimulationConfig::default()
        }
    }

    fn leg(id: &str, odds: Decimal, available: bool) -> Leg {
        Leg {
            event_id: id.to_string(),
            selection: format!("{id}A vs {id}B"),
            odds,
            available,
        }
    }

    async fn login(book: &SimulatedBookmaker) -> SessionToken {
        book.authenticate("test_user", "test_pass").await.unwrap()
    }

    #[tokio::test]
    async fn test_feed_matches_configuration() {
        let book = SimulatedBookmaker::new(quiet(), dec!(1.20));
        let events = book.list_available_events().await.unwrap();
        assert_eq!(events.len(), 20);
        assert_eq!(events[0].id, "M001");
        assert_eq!(events[19].id, "M020");
        for e in &events {
            assert!(e.odds >= dec!(1.15) && e.odds <= dec!(3.50), "{}", e.odds);
            assert!(e.available);
        }
        assert!(events.windows(2).all(|w| w[0].starts_at < w[1].starts_at));
    }

    #[tokio::test]
    async fn test_empty_credentials_rejected() {
        let book = SimulatedBookmaker::new(quiet(), dec!(1.20));
        let err = book.authenticate("", "x").await.unwrap_err();
        assert_eq!(err, WagerError::Auth("Invalid credentials".to_string()));
        let token = login(&book).await;
        assert!(token.starts_with("session-"));
    }

    #[tokio::test]
    async fn test_placement_rejects_bad_legs() {
        let book = SimulatedBookmaker::new(quiet(), dec!(1.20));
        let token = login(&book).await;

        let suspended = WagerRequest::new(
            vec![leg("M001", dec!(1.5), true), leg("M002", dec!(2.0), false)],
            dec!(5),
        );
        assert_eq!(
            book.place_wager(&token, &suspended).await.unwrap_err(),
            WagerError::Placement(PlacementRejection::LegUnavailable {
                event_id: "M002".to_string()
            })
        );

        let too_short = WagerRequest::new(
            vec![leg("M001", dec!(1.10), true), leg("M002", dec!(2.0), true)],
            dec!(5),
        );
        assert!(matches!(
            book.place_wager(&token, &too_short).await,
            Err(WagerError::Placement(PlacementRejection::OddsBelowMinimum { .. }))
        ));
        assert_eq!(book.bet_count().await, 0);
    }

    #[tokio::test]
    async fn test_unknown_session_rejected() {
        let book = SimulatedBookmaker::new(quiet(), dec!(1.20));
        let request = WagerRequest::new(vec![leg("M001", dec!(1.5), true)], dec!(5));
        assert_eq!(
            book.place_wager(&"session-0".to_string(), &request).await.unwrap_err(),
            WagerError::Placement(PlacementRejection::InvalidSession)
        );
    }

    #[tokio::test]
    async fn test_accepts_and_confirms() {
        let book = SimulatedBookmaker::new(quiet(), dec!(1.20));
        let token = login(&book).await;
        let request = WagerRequest::new(
            vec![leg("M001", dec!(1.50), true), leg("M002", dec!(2.25), true)],
            dec!(5),
        );

        let placed = book.place_wager(&token, &request).await.unwrap();
        assert_eq!(placed.bet_id, "B1000");
        assert_eq!(placed.combined_odds, dec!(3.38));
        assert_eq!(placed.potential_return, dec!(16.88));

        let confirmed = book.get_wager("B1000").await.unwrap();
        assert_eq!(confirmed, placed);
        assert_eq!(
            book.get_wager("B4242").await.unwrap_err(),
            WagerError::NotFound("B4242".to_string())
        );
    }

    #[tokio::test]
    async fn test_duplicate_client_ref_returns_original_bet() {
        let config = SimulationConfig {
            lost_response_rate: 1.0,
            ..quiet()
        };
        let book = SimulatedBookmaker::new(config, dec!(1.20));
        let token = login(&book).await;
        let request = WagerRequest::new(
            vec![leg("M001", dec!(1.50), true), leg("M002", dec!(2.00), true)],
            dec!(5),
        );

        // first response is lost, the retry finds the recorded bet
        assert!(matches!(
            book.place_wager(&token, &request).await,
            Err(WagerError::Transient(_))
        ));
        let retried = book.place_wager(&token, &request).await.unwrap();
        assert_eq!(retried.bet_id, "B1000");
        assert_eq!(book.bet_count().await, 1);
    }

    #[tokio::test]
    async fn test_odds_drift_accepts_at_new_price() {
        let config = SimulationConfig {
            odds_change_rate: 1.0,
            odds_change_reject_rate: 0.0,
            ..quiet()
        };
        let book = SimulatedBookmaker::new(config, dec!(1.20));
        let token = login(&book).await;
        let request = WagerRequest::new(
            vec![leg("M001", dec!(2.00), true), leg("M002", dec!(2.00), true)],
            dec!(5),
        );

        let placed = book.place_wager(&token, &request).await.unwrap();
        for (before, after) in request.legs.iter().zip(&placed.legs) {
            assert!(after.odds >= dec!(1.80) && after.odds <= dec!(2.24), "{}", after.odds);
            assert_eq!(before.event_id, after.event_id);
        }
        // the request snapshot itself is never mutated
        assert_eq!(request.legs[0].odds, dec!(2.00));
    }

    #[tokio::test]
    async fn test_odds_drift_rejection() {
        let config = SimulationConfig {
            odds_change_rate: 1.0,
            odds_change_reject_rate: 1.0,
            ..quiet()
        };
        let book = SimulatedBookmaker::new(config, dec!(1.20));
        let token = login(&book).await;
        let request = WagerRequest::new(
            vec![leg("M001", dec!(2.00), true), leg("M002", dec!(2.00), true)],
            dec!(5),
        );
        assert_eq!(
            book.place_wager(&token, &request).await.unwrap_err(),
            WagerError::Placement(PlacementRejection::OddsChanged)
        );
    }

    #[tokio::test]
    async fn test_network_failures_are_transient() {
        let config = SimulationConfig {
            network_failure_rate: 1.0,
            ..quiet()
        };
        let book = SimulatedBookmaker::new(config, dec!(1.20));
        assert!(matches!(
            book.list_available_events().await,
            Err(WagerError::Transient(_))
        ));
    }
}
