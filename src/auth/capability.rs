//! Proof-of-calling-rights abstraction
//!
//! A `Capability` is what callers hand to gated operations. It comes in two
//! deployment variants behind the one type:
//! - `Token`: the bearer token is drawn from the local session store at each
//!   use, so a logout or lazy expiry is picked up immediately; the resolved
//!   role is cached per token
//! - `Identity`: an ambient principal fixed for the process, with the
//!   resolved role cached for the identity session
//!
//! Business logic never branches on the variant; it sees only the produced
//! [`CallerProof`] and the access level the gateway derives from it.

use std::sync::{Arc, RwLock};

use crate::error::CoreError;
use crate::models::Role;
use crate::remote::CallerProof;
use crate::session::SessionStore;

/// Proof of calling rights presented to gated operations.
#[derive(Debug, Clone)]
pub enum Capability {
    /// Bearer-token deployment
    Token(TokenCapability),
    /// Ambient-identity deployment
    Identity(IdentityCapability),
}

impl Capability {
    /// Capability drawing its token from the given session store
    pub fn token(sessions: Arc<SessionStore>) -> Self {
        Capability::Token(TokenCapability {
            sessions,
            cached_role: Arc::new(RwLock::new(None)),
        })
    }

    /// Capability for a fixed ambient principal
    pub fn identity(principal: impl Into<String>) -> Self {
        Capability::Identity(IdentityCapability {
            principal: Some(principal.into()),
            cached_role: Arc::new(RwLock::new(None)),
        })
    }

    /// The unauthenticated caller
    pub fn anonymous() -> Self {
        Capability::Identity(IdentityCapability {
            principal: None,
            cached_role: Arc::new(RwLock::new(None)),
        })
    }

    /// Produce the proof this capability presents right now.
    ///
    /// A token capability with no live session, and an identity capability
    /// without a principal, both present [`CallerProof::Anonymous`].
    pub fn proof(&self) -> Result<CallerProof, CoreError> {
        match self {
            Capability::Token(cap) => Ok(match cap.sessions.current()? {
                Some(session) => CallerProof::Token(session.token),
                None => CallerProof::Anonymous,
            }),
            Capability::Identity(cap) => Ok(match &cap.principal {
                Some(principal) => CallerProof::Identity(principal.clone()),
                None => CallerProof::Anonymous,
            }),
        }
    }
}

/// Capability backed by the local session store.
///
/// The cached role is keyed by the token it was resolved for, so a later
/// login under a different account starts from a fresh verdict.
#[derive(Debug, Clone)]
pub struct TokenCapability {
    sessions: Arc<SessionStore>,
    cached_role: Arc<RwLock<Option<(String, Role)>>>,
}

impl TokenCapability {
    pub(crate) fn cached_role(&self, token: &str) -> Option<Role> {
        match &*self.cached_role.read().unwrap_or_else(|e| e.into_inner()) {
            Some((cached_token, role)) if cached_token == token => Some(*role),
            _ => None,
        }
    }

    pub(crate) fn cache_role(&self, token: &str, role: Role) {
        *self.cached_role.write().unwrap_or_else(|e| e.into_inner()) =
            Some((token.to_string(), role));
    }
}

/// Capability backed by an ambient principal.
///
/// The cached role is shared across clones so one resolution serves the whole
/// identity session.
#[derive(Debug, Clone)]
pub struct IdentityCapability {
    principal: Option<String>,
    cached_role: Arc<RwLock<Option<Role>>>,
}

impl IdentityCapability {
    /// The ambient principal, if any
    pub fn principal(&self) -> Option<&str> {
        self.principal.as_deref()
    }

    pub(crate) fn cached_role(&self) -> Option<Role> {
        *self.cached_role.read().unwrap_or_else(|e| e.into_inner())
    }

    pub(crate) fn cache_role(&self, role: Role) {
        *self.cached_role.write().unwrap_or_else(|e| e.into_inner()) = Some(role);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use tempfile::TempDir;

    #[test]
    fn test_token_capability_without_session_is_anonymous() {
        let dir = TempDir::new().unwrap();
        let sessions = Arc::new(SessionStore::open(dir.path().join("s.json")).unwrap());
        let cap = Capability::token(sessions);

        assert_eq!(cap.proof().unwrap(), CallerProof::Anonymous);
    }

    #[test]
    fn test_token_capability_presents_stored_token() {
        let dir = TempDir::new().unwrap();
        let sessions = Arc::new(SessionStore::open(dir.path().join("s.json")).unwrap());
        sessions.create("tok-1", Duration::hours(8)).unwrap();

        let cap = Capability::token(sessions);
        assert_eq!(
            cap.proof().unwrap(),
            CallerProof::Token("tok-1".to_string())
        );
    }

    #[test]
    fn test_token_capability_turns_anonymous_after_expiry() {
        let dir = TempDir::new().unwrap();
        let sessions = Arc::new(SessionStore::open(dir.path().join("s.json")).unwrap());
        sessions.create("tok-1", Duration::seconds(-1)).unwrap();

        let cap = Capability::token(sessions);
        assert_eq!(cap.proof().unwrap(), CallerProof::Anonymous);
    }

    #[test]
    fn test_identity_capability_presents_principal() {
        let cap = Capability::identity("svc-publisher");
        assert_eq!(
            cap.proof().unwrap(),
            CallerProof::Identity("svc-publisher".to_string())
        );
    }

    #[test]
    fn test_anonymous_capability_presents_nothing() {
        assert_eq!(
            Capability::anonymous().proof().unwrap(),
            CallerProof::Anonymous
        );
    }

    #[test]
    fn test_cached_role_is_shared_across_clones() {
        let cap = Capability::identity("svc-publisher");
        let clone = cap.clone();

        if let Capability::Identity(identity) = &cap {
            assert_eq!(identity.cached_role(), None);
            identity.cache_role(Role::Admin);
        }
        if let Capability::Identity(identity) = &clone {
            assert_eq!(identity.cached_role(), Some(Role::Admin));
        }
    }

    #[test]
    fn test_token_role_cache_is_keyed_by_token() {
        let dir = TempDir::new().unwrap();
        let sessions = Arc::new(SessionStore::open(dir.path().join("s.json")).unwrap());
        let cap = Capability::token(sessions);

        if let Capability::Token(token_cap) = &cap {
            assert_eq!(token_cap.cached_role("tok-1"), None);
            token_cap.cache_role("tok-1", Role::Admin);
            assert_eq!(token_cap.cached_role("tok-1"), Some(Role::Admin));

            // A different token never inherits the verdict
            assert_eq!(token_cap.cached_role("tok-2"), None);
            token_cap.cache_role("tok-2", Role::User);
            assert_eq!(token_cap.cached_role("tok-2"), Some(Role::User));
            assert_eq!(token_cap.cached_role("tok-1"), None);
        }
    }
}
