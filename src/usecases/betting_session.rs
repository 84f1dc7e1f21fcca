//! Betting Session - Accumulator Placement State Machine
//!
//! Drives one run from login to a confirmed bet:
//!
//! ```text
//! Unauthenticated -> Authenticated -> LegsBuilt -> Placed -> Confirmed
//!        \________________\_______________\__________\____-> Failed
//! ```
//!
//! Every remote call goes through the session's `RetryExecutor`; leg
//! selection is local and never retried. Placement retries always
//! resubmit the original leg snapshot (selection is not re-run), so a
//! retried placement may be accepted at odds that differ from those
//! selected. Each request carries a client reference that stays the
//! same across retries so the bookmaker can drop duplicates.
//!
//! Any error moves the session to `Failed`, which is absorbing. Calls
//! made out of sequence are refused without changing state.

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{error, info, instrument, warn};

use crate::config::{AppConfig, Credentials};
use crate::domain::error::OrchestrationError;
use crate::domain::event::Leg;
use crate::domain::random::{RandomSource, SeededRandom};
use crate::domain::selection::{MatchSelector, SelectionMode};
use crate::domain::session::{Session, SessionState};
use crate::domain::wager::{BetStatus, MIN_LEGS, WagerRequest, WagerResult};
use crate::ports::repository::{BetRecord, BetRepository};
use crate::ports::wagering::WageringService;
use crate::usecases::retry::{RetryExecutor, RetryPolicy};

type Result<T> = std::result::Result<T, OrchestrationError>;

/// One accumulator placement against one bookmaker session.
///
/// Owns its session token, retry executor and random sources; nothing
/// is shared with other sessions.
pub struct BettingSession<S: WageringService> {
  /// Remote bookmaker.
  service: Arc<S>,
  /// Sink for confirmed bets.
  repository: Option<Arc<dyn BetRepository>>,
  /// Login used by `run_once`.
  credentials: Credentials,
  /// Retry policy for every remote call.
  retry: RetryExecutor,
  /// Leg selector (holds the odds floor).
  selector: MatchSelector,
  /// Randomness for `SelectionMode::Random`.
  selection_rng: Box<dyn RandomSource>,
  /// Legs per accumulator used by `run_once`.
  max_legs: usize,
  /// Ordering used by `run_once`.
  selection_mode: SelectionMode,
  /// Current lifecycle state.
  state: SessionState,
  /// Token once authenticated.
  session: Option<Session>,
  /// Request once legs are built.
  request: Option<WagerRequest>,
  /// Placement result.
  placed: Option<WagerResult>,
  /// Canonical record after confirmation.
  confirmed: Option<WagerResult>,
}

impl<S: WageringService> BettingSession<S> {
  /// Create a session from configuration.
  ///
  /// Selection and jitter use OS-seeded randomness; override with
  /// `with_selection_rng` / `with_retry` for reproducible runs.
  pub fn new(service: Arc<S>, credentials: Credentials, config: &AppConfig) -> Self {
    Self {
      service,
      repository: None,
      credentials,
      retry: RetryExecutor::new(
        RetryPolicy::from(&config.retry),
        Box::new(SeededRandom::from_entropy()),
      ),
      selector: MatchSelector::new(config.wager.min_odds),
      selection_rng: Box::new(SeededRandom::from_entropy()),
      max_legs: config.wager.max_legs,
      selection_mode: config.wager.selection_mode,
      state: SessionState::Unauthenticated,
      session: None,
      request: None,
      placed: None,
      confirmed: None,
    }
  }

  /// Persist confirmed bets to `repository`.
  #[must_use]
  pub fn with_repository(mut self, repository: Arc<dyn BetRepository>) -> Self {
    self.repository = Some(repository);
    self
  }

  /// Replace the retry executor.
  #[must_use]
  pub fn with_retry(mut self, retry: RetryExecutor) -> Self {
    self.retry = retry;
    self
  }

  /// Replace the selection random source.
  #[must_use]
  pub fn with_selection_rng(mut self, rng: Box<dyn RandomSource>) -> Self {
    self.selection_rng = rng;
    self
  }

  /// Current lifecycle state.
  pub fn state(&self) -> SessionState {
    self.state
  }

  /// Authenticated session, if any.
  pub fn session(&self) -> Option<&Session> {
    self.session.as_ref()
  }

  /// Built wager request, if any.
  pub fn request(&self) -> Option<&WagerRequest> {
    self.request.as_ref()
  }

  /// Placement result, if any.
  pub fn placed(&self) -> Option<&WagerResult> {
    self.placed.as_ref()
  }

  /// Confirmed record, if any.
  pub fn confirmed(&self) -> Option<&WagerResult> {
    self.confirmed.as_ref()
  }

  /// `Unauthenticated -> Authenticated`.
  ///
  /// # Errors
  /// `EmptyCredentials` before any remote call, or the remote error
  /// once retries are exhausted.
  #[instrument(skip(self, password))]
  pub async fn authenticate(&mut self, username: &str, password: &str) -> Result<&Session> {
    self.expect_state(SessionState::Unauthenticated, "authenticate")?;

    if username.is_empty() || password.is_empty() {
      return Err(self.fail(OrchestrationError::EmptyCredentials));
    }

    info!(user = %username, "Logging in");
    let service = &self.service;
    let outcome = self
      .retry
      .execute("authenticate", || service.authenticate(username, password))
      .await;
    let token = match outcome {
      Ok(token) => token,
      Err(e) => return Err(self.fail(e.into())),
    };

    info!(user = %username, "Authenticated");
    self.state = SessionState::Authenticated;
    Ok(self.session.insert(Session {
      token,
      principal: username.to_string(),
    }))
  }

  /// `Authenticated -> LegsBuilt`.
  ///
  /// Fetches the event feed (retried), selects up to `leg_count` legs
  /// under `mode`, and freezes them into a `WagerRequest`. The stake is
  /// checked on submission, not here.
  ///
  /// # Errors
  /// `NotAuthenticated`, the remote error from the feed, or
  /// `InsufficientLegs` when fewer than two legs survive selection.
  #[instrument(skip(self))]
  pub async fn build_wager(
    &mut self,
    stake: Decimal,
    mode: SelectionMode,
    leg_count: usize,
  ) -> Result<&WagerRequest> {
    self.expect_state(SessionState::Authenticated, "build wager")?;
    if self.session.is_none() {
      return Err(self.fail(OrchestrationError::NotAuthenticated));
    }

    info!(%mode, legs = leg_count, "Fetching events for accumulator build");
    let service = &self.service;
    let outcome = self
      .retry
      .execute("list_available_events", || service.list_available_events())
      .await;
    let events = match outcome {
      Ok(events) => events,
      Err(e) => return Err(self.fail(e.into())),
    };

    let selected = self
      .selector
      .select(&events, mode, leg_count, self.selection_rng.as_mut());

    if selected.len() < MIN_LEGS {
      warn!(
        feed = events.len(),
        eligible = selected.len(),
        min_odds = %self.selector.min_odds(),
        "Not enough valid legs"
      );
      return Err(self.fail(OrchestrationError::InsufficientLegs {
        found: selected.len(),
        required: MIN_LEGS,
      }));
    }

    let legs: Vec<Leg> = selected.iter().map(Leg::from).collect();
    let request = WagerRequest::new(legs, stake);

    info!(
      legs = ?request.legs.iter().map(|l| l.event_id.as_str()).collect::<Vec<_>>(),
      combined_odds = %request.combined_odds().round_dp(2),
      expected_return = %request.expected_return(),
      client_ref = %request.client_ref,
      "Selected legs"
    );

    self.state = SessionState::LegsBuilt;
    Ok(self.request.insert(request))
  }

  /// `LegsBuilt -> Placed`.
  ///
  /// Guards run before any remote call. Placement is retried with the
  /// original leg snapshot and client reference.
  ///
  /// # Errors
  /// `InsufficientLegs`, `NonPositiveStake`, `NotAuthenticated`,
  /// `MissingBetId`, or the last placement error.
  #[instrument(skip(self))]
  pub async fn submit_wager(&mut self) -> Result<&WagerResult> {
    self.expect_state(SessionState::LegsBuilt, "submit wager")?;

    let guard = match (&self.request, &self.session) {
      (None, _) => Some(OrchestrationError::InsufficientLegs {
        found: 0,
        required: MIN_LEGS,
      }),
      (Some(r), _) if r.legs.len() < MIN_LEGS => Some(OrchestrationError::InsufficientLegs {
        found: r.legs.len(),
        required: MIN_LEGS,
      }),
      (Some(r), _) if r.stake <= Decimal::ZERO => Some(OrchestrationError::NonPositiveStake(r.stake)),
      (_, None) => Some(OrchestrationError::NotAuthenticated),
      _ => None,
    };
    if let Some(err) = guard {
      return Err(self.fail(err));
    }

    let (Some(request), Some(session)) = (&self.request, &self.session) else {
      return Err(self.fail(OrchestrationError::NotAuthenticated));
    };

    info!(
      stake = %request.stake,
      legs = request.legs.len(),
      client_ref = %request.client_ref,
      "Placing accumulator"
    );

    let service = &self.service;
    let token = &session.token;
    let mut submissions = 0u32;
    let outcome = self
      .retry
      .execute("place_wager", || {
        submissions += 1;
        if submissions > 1 {
          // Placement is not idempotent on the bookmaker side unless it
          // honours client_ref; a lost response here can double-submit.
          warn!(
            client_ref = %request.client_ref,
            submission = submissions,
            "Resubmitting placement with original leg snapshot"
          );
        }
        service.place_wager(token, request)
      })
      .await;
    let expected_odds = request.combined_odds().round_dp(2);

    let placed = match outcome {
      Ok(placed) => placed,
      Err(e) => return Err(self.fail(e.into())),
    };

    if placed.bet_id.is_empty() {
      return Err(self.fail(OrchestrationError::MissingBetId));
    }

    if !placed.is_accepted() {
      warn!(bet_id = %placed.bet_id, status = %placed.status, "Placement not yet accepted");
    }

    if placed.combined_odds != expected_odds {
      warn!(
        bet_id = %placed.bet_id,
        selected = %expected_odds,
        placed = %placed.combined_odds,
        "Accepted at different odds than selected"
      );
    }

    info!(
      bet_id = %placed.bet_id,
      status = %placed.status,
      combined_odds = %placed.combined_odds,
      potential_return = %placed.potential_return,
      "Placement result"
    );

    self.state = SessionState::Placed;
    Ok(self.placed.insert(placed))
  }

  /// `Placed -> Confirmed`.
  ///
  /// # Errors
  /// `UnexpectedBetId` if `bet_id` is not the one placed or the
  /// service answers with a different bet,
  /// `BetNotAccepted` if the canonical record is rejected, or the last
  /// lookup error.
  #[instrument(skip(self))]
  pub async fn confirm_wager(&mut self, bet_id: &str) -> Result<&WagerResult> {
    self.expect_state(SessionState::Placed, "confirm wager")?;

    let placed_id = self
      .placed
      .as_ref()
      .map(|p| p.bet_id.clone())
      .filter(|id| !id.is_empty());
    let Some(expected) = placed_id else {
      return Err(self.fail(OrchestrationError::MissingBetId));
    };
    if bet_id != expected {
      return Err(self.fail(OrchestrationError::UnexpectedBetId {
        expected,
        got: bet_id.to_string(),
      }));
    }

    info!(bet_id, "Confirming bet");
    let service = &self.service;
    let outcome = self
      .retry
      .execute("get_wager", || service.get_wager(bet_id))
      .await;
    let record = match outcome {
      Ok(record) => record,
      Err(e) => return Err(self.fail(e.into())),
    };

    if record.bet_id != bet_id {
      return Err(self.fail(OrchestrationError::UnexpectedBetId {
        expected: bet_id.to_string(),
        got: record.bet_id,
      }));
    }

    match record.status {
      BetStatus::Rejected => {
        return Err(self.fail(OrchestrationError::BetNotAccepted {
          bet_id: record.bet_id,
          status: record.status,
        }));
      }
      BetStatus::Pending => warn!(bet_id, "Bet confirmed but still pending"),
      BetStatus::Accepted => {}
    }

    info!(
      bet_id = %record.bet_id,
      status = %record.status,
      combined_odds = %record.combined_odds,
      "Bet confirmed"
    );

    self.state = SessionState::Confirmed;
    Ok(self.confirmed.insert(record))
  }

  /// Drive the whole state machine to `Confirmed` or `Failed`.
  ///
  /// Uses the configured credentials, selection mode and leg count.
  /// On success the confirmed bet is handed to the repository (if one
  /// is attached); on failure nothing is persisted.
  ///
  /// # Errors
  /// The error that moved the session to `Failed`, or `Persistence` if
  /// the confirmed bet could not be recorded.
  #[instrument(skip(self))]
  pub async fn run_once(&mut self, stake: Decimal) -> Result<WagerResult> {
    let credentials = self.credentials.clone();
    let mode = self.selection_mode;
    let max_legs = self.max_legs;

    info!(
      user = %credentials.username,
      %mode,
      max_legs,
      max_attempts = self.retry.policy().max_attempts,
      "Starting placement run"
    );

    self.authenticate(&credentials.username, &credentials.password).await?;
    self.build_wager(stake, mode, max_legs).await?;
    let bet_id = self.submit_wager().await?.bet_id.clone();
    let confirmed = self.confirm_wager(&bet_id).await?.clone();

    info!(
      bet_id = %confirmed.bet_id,
      stake = %confirmed.stake,
      combined_odds = %confirmed.combined_odds,
      potential_return = %confirmed.potential_return,
      "FINAL"
    );

    if let Some(repository) = &self.repository {
      let record = BetRecord::from_confirmed(&confirmed);
      if let Err(e) = repository.append(&record).await {
        error!(bet_id = %confirmed.bet_id, error = %e, "Failed to persist confirmed bet");
        return Err(OrchestrationError::Persistence(format!("{e:#}")));
      }
    }

    Ok(confirmed)
  }

  /// Refuse operations out of sequence without touching state.
  fn expect_state(&self, expected: SessionState, action: &'static str) -> Result<()> {
    match self.state {
      SessionState::Failed => Err(OrchestrationError::SessionFailed),
      state if state == expected => Ok(()),
      state => {
        if state.is_terminal() {
          warn!(%state, action, "Session already finished");
        }
        Err(OrchestrationError::InvalidTransition { state, action })
      }
    }
  }

  /// Move to `Failed`, discarding partial state.
  fn fail(&mut self, err: OrchestrationError) -> OrchestrationError {
    error!(from = %self.state, error = %err, "Session failed");
    self.state = SessionState::Failed;
    self.session = None;
    self.request = None;
    err
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::error::{PlacementRejection, WagerError};
  use crate::domain::event::Event;
  use crate::domain::session::SessionToken;
  use crate::domain::wager::{combined_odds, potential_return};
  use async_trait::async_trait;
  use chrono::{Duration, Utc};
  use rust_decimal_macros::dec;
  use std::sync::Mutex;
  use uuid::Uuid;

  /// Scripted bookmaker: accepts everything unless told otherwise.
  #[derive(Default)]
  struct Scripted {
    events: Vec<Event>,
    place_failures: Mutex<u32>,
    odds_changed_rejections: Mutex<u32>,
    odds_bump: Decimal,
    place_calls: Mutex<u32>,
    submissions: Mutex<Vec<(Uuid, Vec<Leg>)>>,
    auth_calls: Mutex<u32>,
    placed: Mutex<Option<WagerResult>>,
    reject_on_confirm: bool,
    confirm_other_bet: bool,
  }

  #[async_trait]
  impl WageringService for Scripted {
    async fn authenticate(&self, _u: &str, _p: &str) -> std::result::Result<SessionToken, WagerError> {
      *self.auth_calls.lock().unwrap() += 1;
      Ok("session-12345".to_string())
    }

    async fn list_available_events(&self) -> std::result::Result<Vec<Event>, WagerError> {
      Ok(self.events.clone())
    }

    async fn place_wager(
      &self,
      _token: &SessionToken,
      request: &WagerRequest,
    ) -> std::result::Result<WagerResult, WagerError> {
      *self.place_calls.lock().unwrap() += 1;
      self
        .submissions
        .lock()
        .unwrap()
        .push((request.client_ref, request.legs.clone()));
      {
        let mut failures = self.place_failures.lock().unwrap();
        if *failures > 0 {
          *failures -= 1;
          return Err(WagerError::Transient("connection reset".to_string()));
        }
      }
      {
        let mut rejections = self.odds_changed_rejections.lock().unwrap();
        if *rejections > 0 {
          *rejections -= 1;
          return Err(PlacementRejection::OddsChanged.into());
        }
      }
      let legs: Vec<Leg> = request
        .legs
        .iter()
        .map(|l| Leg {
          odds: l.odds + self.odds_bump,
          ..l.clone()
        })
        .collect();
      let combined = combined_odds(&legs);
      let result = WagerResult {
        bet_id: "B1000".to_string(),
        status: BetStatus::Accepted,
        legs,
        stake: request.stake,
        combined_odds: combined.round_dp(2),
        potential_return: potential_return(request.stake, combined),
        placed_at: Utc::now(),
      };
      *self.placed.lock().unwrap() = Some(result.clone());
      Ok(result)
    }

    async fn get_wager(&self, bet_id: &str) -> std::result::Result<WagerResult, WagerError> {
      let placed = self.placed.lock().unwrap().clone();
      match placed {
        Some(mut p) if p.bet_id == bet_id => {
          if self.reject_on_confirm {
            p.status = BetStatus::Rejected;
          }
          if self.confirm_other_bet {
            p.bet_id = "B2000".to_string();
          }
          Ok(p)
        }
        _ => Err(WagerError::NotFound(bet_id.to_string())),
      }
    }
  }

  fn events(odds: &[Decimal]) -> Vec<Event> {
    odds
      .iter()
      .enumerate()
      .map(|(i, o)| Event {
        id: format!("M{:03}", i + 1),
        home: format!("Team{}A", i + 1),
        away: format!("Team{}B", i + 1),
        starts_at: Utc::now() + Duration::minutes(30 + 10 * i as i64),
        odds: *o,
        available: true,
      })
      .collect()
  }

  fn session(service: Scripted) -> BettingSession<Scripted> {
    let mut config = AppConfig::default();
    config.retry.max_attempts = 3;
    BettingSession::new(Arc::new(service), Credentials::new("test_user", "test_pass"), &config)
      .with_selection_rng(Box::new(SeededRandom::from_seed(1)))
      .with_retry(RetryExecutor::new(
        RetryPolicy::from(&config.retry),
        Box::new(SeededRandom::from_seed(2)),
      ))
  }

  #[tokio::test(start_paused = true)]
  async fn test_run_once_reaches_confirmed() {
    let mut s = session(Scripted {
      events: events(&[dec!(1.50), dec!(2.00), dec!(1.80), dec!(1.30), dec!(2.50)]),
      ..Default::default()
    });

    let result = s.run_once(dec!(5)).await.unwrap();
    assert_eq!(s.state(), SessionState::Confirmed);
    assert_eq!(result.bet_id, "B1000");
    // top 4 of the feed: 2.50 * 2.00 * 1.80 * 1.50
    assert_eq!(result.combined_odds, dec!(13.50));
    assert_eq!(result.potential_return, dec!(67.50));
  }

  #[tokio::test]
  async fn test_empty_credentials_fail_without_remote_call() {
    let mut s = session(Scripted::default());
    let err = s.authenticate("", "secret").await.unwrap_err();
    assert!(matches!(err, OrchestrationError::EmptyCredentials));
    assert_eq!(s.state(), SessionState::Failed);
    assert_eq!(*s.service.auth_calls.lock().unwrap(), 0);
  }

  #[tokio::test]
  async fn test_build_requires_two_legs() {
    let mut s = session(Scripted {
      events: events(&[dec!(1.50), dec!(1.10), dec!(1.05)]),
      ..Default::default()
    });
    s.authenticate("test_user", "test_pass").await.unwrap();
    let err = s.build_wager(dec!(5), SelectionMode::Top, 4).await.unwrap_err();
    assert!(matches!(
      err,
      OrchestrationError::InsufficientLegs { found: 1, required: 2 }
    ));
    assert_eq!(s.state(), SessionState::Failed);
    assert!(s.session().is_none());
  }

  #[tokio::test]
  async fn test_non_positive_stake_rejected_before_placement() {
    let mut s = session(Scripted {
      events: events(&[dec!(1.50), dec!(2.00)]),
      ..Default::default()
    });
    s.authenticate("test_user", "test_pass").await.unwrap();
    s.build_wager(dec!(0), SelectionMode::Top, 4).await.unwrap();
    let err = s.submit_wager().await.unwrap_err();
    assert!(matches!(err, OrchestrationError::NonPositiveStake(_)));
    assert_eq!(*s.service.place_calls.lock().unwrap(), 0);
  }

  #[tokio::test(start_paused = true)]
  async fn test_placement_retries_reuse_client_ref_and_legs() {
    let mut s = session(Scripted {
      events: events(&[dec!(1.50), dec!(2.00), dec!(3.00)]),
      place_failures: Mutex::new(2),
      ..Default::default()
    });
    s.authenticate("test_user", "test_pass").await.unwrap();
    let request = s.build_wager(dec!(10), SelectionMode::Top, 3).await.unwrap().clone();
    let placed = s.submit_wager().await.unwrap().clone();

    assert_eq!(*s.service.place_calls.lock().unwrap(), 3);
    assert_eq!(placed.legs, request.legs);
    assert_eq!(s.state(), SessionState::Placed);

    let submissions = s.service.submissions.lock().unwrap().clone();
    assert_eq!(submissions.len(), 3);
    for (client_ref, legs) in &submissions {
      assert_eq!(*client_ref, request.client_ref);
      assert_eq!(legs, &request.legs);
    }
  }

  #[tokio::test(start_paused = true)]
  async fn test_odds_changed_retry_confirms_at_bookmaker_odds() {
    let mut s = session(Scripted {
      events: events(&[dec!(1.50), dec!(2.00), dec!(1.80), dec!(2.50)]),
      odds_changed_rejections: Mutex::new(1),
      odds_bump: dec!(0.10),
      ..Default::default()
    });

    s.authenticate("test_user", "test_pass").await.unwrap();
    let request = s.build_wager(dec!(5), SelectionMode::Top, 4).await.unwrap().clone();
    let bet_id = s.submit_wager().await.unwrap().bet_id.clone();
    let confirmed = s.confirm_wager(&bet_id).await.unwrap().clone();

    // both attempts carried the selection-time snapshot
    let submissions = s.service.submissions.lock().unwrap().clone();
    assert_eq!(submissions.len(), 2);
    assert!(submissions
      .iter()
      .all(|(r, legs)| *r == request.client_ref && legs == &request.legs));

    // 2.60 * 2.10 * 1.90 * 1.60 = 16.5984
    assert_eq!(s.state(), SessionState::Confirmed);
    assert_eq!(confirmed.combined_odds, dec!(16.60));
    assert_ne!(confirmed.combined_odds, request.combined_odds().round_dp(2));
    assert_eq!(request.legs[0].odds, dec!(2.50));
  }

  #[tokio::test]
  async fn test_confirm_rejects_record_for_another_bet() {
    let mut s = session(Scripted {
      events: events(&[dec!(1.50), dec!(2.00)]),
      confirm_other_bet: true,
      ..Default::default()
    });

    let err = s.run_once(dec!(5)).await.unwrap_err();
    assert!(matches!(
      err,
      OrchestrationError::UnexpectedBetId { ref expected, ref got }
        if expected == "B1000" && got == "B2000"
    ));
    assert_eq!(s.state(), SessionState::Failed);
    assert!(s.confirmed().is_none());
  }

  #[tokio::test(start_paused = true)]
  async fn test_placement_exhaustion_fails_session() {
    let mut s = session(Scripted {
      events: events(&[dec!(1.50), dec!(2.00)]),
      place_failures: Mutex::new(10),
      ..Default::default()
    });
    s.authenticate("test_user", "test_pass").await.unwrap();
    s.build_wager(dec!(5), SelectionMode::Top, 4).await.unwrap();
    let err = s.submit_wager().await.unwrap_err();

    assert!(matches!(err, OrchestrationError::Remote(WagerError::Transient(_))));
    assert_eq!(*s.service.place_calls.lock().unwrap(), 3);
    assert_eq!(s.state(), SessionState::Failed);

    // absorbing
    let again = s.confirm_wager("B1000").await.unwrap_err();
    assert!(matches!(again, OrchestrationError::SessionFailed));
  }

  #[tokio::test]
  async fn test_out_of_sequence_call_keeps_state() {
    let mut s = session(Scripted::default());
    let err = s.submit_wager().await.unwrap_err();
    assert!(matches!(
      err,
      OrchestrationError::InvalidTransition {
        state: SessionState::Unauthenticated,
        ..
      }
    ));
    assert_eq!(s.state(), SessionState::Unauthenticated);
  }

  #[tokio::test]
  async fn test_confirmed_session_refuses_further_calls() {
    let mut s = session(Scripted {
      events: events(&[dec!(1.50), dec!(2.00)]),
      ..Default::default()
    });
    s.run_once(dec!(5)).await.unwrap();
    assert!(s.state().is_terminal());

    let err = s.authenticate("test_user", "test_pass").await.unwrap_err();
    assert!(matches!(
      err,
      OrchestrationError::InvalidTransition {
        state: SessionState::Confirmed,
        ..
      }
    ));
    assert_eq!(s.state(), SessionState::Confirmed);
    assert_eq!(*s.service.auth_calls.lock().unwrap(), 1);
  }

  #[tokio::test]
  async fn test_confirm_rejects_foreign_bet_id() {
    let mut s = session(Scripted {
      events: events(&[dec!(1.50), dec!(2.00)]),
      ..Default::default()
    });
    s.authenticate("test_user", "test_pass").await.unwrap();
    s.build_wager(dec!(5), SelectionMode::Top, 4).await.unwrap();
    s.submit_wager().await.unwrap();
    let err = s.confirm_wager("B9999").await.unwrap_err();
    assert!(matches!(err, OrchestrationError::UnexpectedBetId { .. }));
    assert_eq!(s.state(), SessionState::Failed);
  }

  #[tokio::test]
  async fn test_rejected_record_fails_confirmation() {
    let mut s = session(Scripted {
      events: events(&[dec!(1.50), dec!(2.00)]),
      reject_on_confirm: true,
      ..Default::default()
    });
    let err = s.run_once(dec!(5)).await.unwrap_err();
    assert!(matches!(err, OrchestrationError::BetNotAccepted { .. }));
    assert!(s.confirmed().is_none());
  }
}
