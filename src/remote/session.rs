//! Session credentials supplied by the identity provider.
//!
//! The gateway only ever asks for an opaque bearer token. It never refreshes or inspects it;
//! a rejected token comes back as an auth error for the caller to resolve.

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

/// Opaque bearer credential. `Debug` output is redacted.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    /// Wrap a raw token.
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Borrow the raw token for the `Authorization` header.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Whether the token is empty or whitespace.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken(***)")
    }
}

/// Source of the current session token.
pub trait SessionProvider: Send + Sync {
    /// Current token, or `None` when no session is established.
    fn session_token(&self) -> Option<SessionToken>;
}

/// Fixed token (or none), set once at construction.
#[derive(Clone, Debug, Default)]
pub struct StaticSession(Option<SessionToken>);

impl StaticSession {
    /// Session with a fixed token.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(Some(SessionToken::new(token)))
    }

    /// Session without credentials; every request fails with an auth error.
    #[must_use]
    pub const fn anonymous() -> Self {
        Self(None)
    }
}

impl SessionProvider for StaticSession {
    fn session_token(&self) -> Option<SessionToken> {
        self.0.clone()
    }
}

/// Session updated in place as the wallet connects and disconnects.
///
/// Clones share the same slot.
#[derive(Clone, Debug, Default)]
pub struct SharedSession {
    slot: Arc<RwLock<Option<SessionToken>>>,
}

impl SharedSession {
    /// Create a disconnected session.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a fresh token.
    pub fn connect(&self, token: SessionToken) {
        let mut slot = self.slot.write().unwrap_or_else(PoisonError::into_inner);
        *slot = Some(token);
    }

    /// Drop the current token.
    pub fn disconnect(&self) {
        let mut slot = self.slot.write().unwrap_or_else(PoisonError::into_inner);
        *slot = None;
    }

    /// Whether a token is currently held.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.session_token().is_some()
    }
}

impl SessionProvider for SharedSession {
    fn session_token(&self) -> Option<SessionToken> {
        self.slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_is_redacted() {
        let token = SessionToken::new("secret-value");
        assert_eq!(format!("{token:?}"), "SessionToken(***)");
        assert_eq!(token.expose(), "secret-value");
    }

    #[test]
    fn test_static_session() {
        assert!(StaticSession::anonymous().session_token().is_none());
        assert_eq!(
            StaticSession::new("abc").session_token(),
            Some(SessionToken::new("abc"))
        );
    }

    #[test]
    fn test_shared_session_clones_share_state() {
        let session = SharedSession::new();
        let view = session.clone();
        assert!(!view.is_connected());

        session.connect(SessionToken::new("wallet-sig"));
        assert_eq!(view.session_token(), Some(SessionToken::new("wallet-sig")));

        session.disconnect();
        assert!(!view.is_connected());
    }
}
