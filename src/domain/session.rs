//! Authenticated session and the placement lifecycle states.

use serde::{Deserialize, Serialize};

/// Opaque token issued by the bookmaker on login.
pub type SessionToken = String;

/// Authenticated principal for one run.
///
/// Valid until process exit; never shared between runs or sessions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Token to present on placement.
    pub token: SessionToken,
    /// Username the token was issued to.
    pub principal: String,
}

/// Lifecycle of a single accumulator placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionState {
    /// No token yet.
    Unauthenticated,
    /// Token obtained.
    Authenticated,
    /// Wager request assembled from selected legs.
    LegsBuilt,
    /// Bookmaker returned a bet id.
    Placed,
    /// Canonical bet record fetched.
    Confirmed,
    /// Absorbing failure state.
    Failed,
}

impl SessionState {
    /// Whether no further transitions are possible.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Confirmed | Self::Failed)
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Unauthenticated => "unauthenticated",
            Self::Authenticated => "authenticated",
            Self::LegsBuilt => "legs_built",
            Self::Placed => "placed",
            Self::Confirmed => "confirmed",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(SessionState::Confirmed.is_terminal());
        assert!(SessionState::Failed.is_terminal());
        assert!(!SessionState::Placed.is_terminal());
        assert!(!SessionState::Unauthenticated.is_terminal());
    }

    #[test]
    fn test_state_display() {
        assert_eq!(SessionState::LegsBuilt.to_string(), "legs_built");
    }
}
