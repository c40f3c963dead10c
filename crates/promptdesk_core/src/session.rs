use crate::Principal;

/// Counts session transitions. Replies to requests issued under an older
/// epoch are dropped.
pub type SessionEpoch = u64;

/// Why a session attempt is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthAttempt {
    /// Restoring from a persisted credential at startup.
    Restore,
    Login,
}

/// Either fully absent or fully populated; `Authenticating` never carries a
/// partial principal.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Unauthenticated,
    Authenticating(AuthAttempt),
    Authenticated {
        principal: Principal,
        token: String,
    },
}

impl SessionState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated { .. })
    }

    pub fn is_authenticating(&self) -> bool {
        matches!(self, SessionState::Authenticating(_))
    }

    pub fn principal(&self) -> Option<&Principal> {
        match self {
            SessionState::Authenticated { principal, .. } => Some(principal),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SessionState::Unauthenticated => "Signed out",
            SessionState::Authenticating(AuthAttempt::Restore) => "Restoring session",
            SessionState::Authenticating(AuthAttempt::Login) => "Signing in",
            SessionState::Authenticated { .. } => "Signed in",
        }
    }
}
