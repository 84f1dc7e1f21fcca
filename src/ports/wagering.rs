//! Wagering Service Port - Remote Bookmaker Interface
//!
//! Defines the trait the betting session requires from the bookmaker.
//! Every call is fallible and may have side effects that land even
//! when the response is lost, so callers wrap each one in the retry
//! executor individually.

use async_trait::async_trait;

use crate::domain::error::WagerError;
use crate::domain::event::Event;
use crate::domain::session::SessionToken;
use crate::domain::wager::{WagerRequest, WagerResult};

/// Remote wagering service.
///
/// Implementors own all bookmaker state. The engine only reads
/// `Event` and `WagerResult` snapshots.
#[async_trait]
pub trait WageringService: Send + Sync + 'static {
  /// Log in and obtain a session token.
  ///
  /// # Errors
  /// `WagerError::Auth` for refused credentials, `Transient` otherwise.
  async fn authenticate(&self, username: &str, password: &str) -> Result<SessionToken, WagerError>;

  /// Fetch the current event feed with live odds.
  async fn list_available_events(&self) -> Result<Vec<Event>, WagerError>;

  /// Submit an accumulator.
  ///
  /// The bookmaker may reject individual legs, move odds and accept
  /// at the new price, or reject the whole request after moving odds.
  /// `request.client_ref` identifies the submission across retries.
  async fn place_wager(
    &self,
    token: &SessionToken,
    request: &WagerRequest,
  ) -> Result<WagerResult, WagerError>;

  /// Fetch the canonical record of a placed bet.
  async fn get_wager(&self, bet_id: &str) -> Result<WagerResult, WagerError>;
}
