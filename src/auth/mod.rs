//! Authorization gateway
//!
//! `AuthGateway` is the single chokepoint between the client core and the
//! remote content service:
//! - `login`/`logout` manage both sides of the session
//! - `authorize` fails fast on anonymous callers, before any round trip
//! - every remote result is translated into the [`CoreError`] taxonomy
//!
//! The translation performs exactly one local side effect: when the remote
//! reports `Unauthorized`, the locally stored session is cleared, because a
//! token the remote no longer honors cannot self-heal. `Forbidden` and every
//! other kind leave local state untouched.

mod capability;

pub use capability::{Capability, IdentityCapability, TokenCapability};

use chrono::Duration;
use std::sync::Arc;

use crate::error::CoreError;
use crate::models::{Article, ArticleId, ArticleInput, Role, Session};
use crate::remote::{CallerProof, RemoteError, RemoteStore};
use crate::session::SessionStore;

/// Gateway wrapping every call to the remote content service.
pub struct AuthGateway {
    remote: Arc<dyn RemoteStore>,
    sessions: Arc<SessionStore>,
    session_ttl: Duration,
}

impl AuthGateway {
    /// Create a gateway over the given remote binding and session store.
    ///
    /// `session_ttl` mirrors the remote side's session lifetime so local and
    /// remote expiry stay approximately aligned.
    pub fn new(
        remote: Arc<dyn RemoteStore>,
        sessions: Arc<SessionStore>,
        session_ttl: Duration,
    ) -> Self {
        Self {
            remote,
            sessions,
            session_ttl,
        }
    }

    /// Exchange credentials for a session, storing it before returning.
    ///
    /// A rejected login surfaces `InvalidCredentials` and leaves the session
    /// store exactly as it was.
    pub async fn login(&self, username: &str, password: &str) -> Result<Session, CoreError> {
        let token = self
            .remote
            .login(username, password)
            .await
            .map_err(translate)?;

        let session = self.sessions.create(token, self.session_ttl)?;
        tracing::info!(expires_at = %session.expires_at, "Login succeeded, session stored");
        Ok(session)
    }

    /// Log out: best-effort remote invalidation, unconditional local clear.
    ///
    /// A failed remote call is logged and swallowed; local logout always
    /// succeeds.
    pub async fn logout(&self) -> Result<(), CoreError> {
        if let Some(session) = self.sessions.current()? {
            if let Err(e) = self.remote.logout(&session.token).await {
                tracing::warn!(error = %e, "Remote logout failed, clearing local session anyway");
            }
        }
        self.sessions.clear()?;
        tracing::info!("Logged out");
        Ok(())
    }

    /// Require a non-anonymous proof, without any network round trip.
    pub fn authorize(&self, cap: &Capability) -> Result<CallerProof, CoreError> {
        let proof = cap.proof()?;
        if proof.is_anonymous() {
            return Err(CoreError::Unauthorized("Not logged in".to_string()));
        }
        Ok(proof)
    }

    /// Resolve the capability to one of the three access levels.
    ///
    /// Anonymous proofs are guests without a round trip. Everything else is
    /// settled by one remote admin check, cached on the capability: per token
    /// for the token variant, for the process lifetime for the identity
    /// variant. A live local session alone proves nothing about the role.
    pub async fn access_level(&self, cap: &Capability) -> Result<Role, CoreError> {
        match cap {
            Capability::Token(token_cap) => {
                let proof = cap.proof()?;
                let token = match &proof {
                    CallerProof::Token(token) => token.clone(),
                    _ => return Ok(Role::Guest),
                };
                if let Some(role) = token_cap.cached_role(&token) {
                    return Ok(role);
                }

                let is_admin = self
                    .remote
                    .is_caller_admin(&proof)
                    .await
                    .map_err(|e| self.translate_gated(e))?;
                let role = if is_admin { Role::Admin } else { Role::User };
                token_cap.cache_role(&token, role);
                tracing::debug!(role = %role, "Resolved token role");
                Ok(role)
            }
            Capability::Identity(identity) => {
                if identity.principal().is_none() {
                    return Ok(Role::Guest);
                }
                if let Some(role) = identity.cached_role() {
                    return Ok(role);
                }

                let proof = cap.proof()?;
                let is_admin = self
                    .remote
                    .is_caller_admin(&proof)
                    .await
                    .map_err(|e| self.translate_gated(e))?;
                let role = if is_admin { Role::Admin } else { Role::User };
                identity.cache_role(role);
                tracing::debug!(role = %role, "Resolved identity role");
                Ok(role)
            }
        }
    }

    /// Create an article through the gate
    pub async fn create_article(
        &self,
        cap: &Capability,
        input: &ArticleInput,
    ) -> Result<Article, CoreError> {
        let proof = self.authorize(cap)?;
        self.remote
            .create(input, &proof)
            .await
            .map_err(|e| self.translate_gated(e))
    }

    /// Replace an article's editable fields through the gate
    pub async fn update_article(
        &self,
        cap: &Capability,
        id: &ArticleId,
        input: &ArticleInput,
    ) -> Result<Article, CoreError> {
        let proof = self.authorize(cap)?;
        self.remote
            .update(id, input, &proof)
            .await
            .map_err(|e| self.translate_gated(e))
    }

    /// Transition an article to published through the gate
    pub async fn publish_article(
        &self,
        cap: &Capability,
        id: &ArticleId,
    ) -> Result<Article, CoreError> {
        let proof = self.authorize(cap)?;
        self.remote
            .publish(id, &proof)
            .await
            .map_err(|e| self.translate_gated(e))
    }

    /// Transition an article back to draft through the gate
    pub async fn unpublish_article(
        &self,
        cap: &Capability,
        id: &ArticleId,
    ) -> Result<Article, CoreError> {
        let proof = self.authorize(cap)?;
        self.remote
            .unpublish(id, &proof)
            .await
            .map_err(|e| self.translate_gated(e))
    }

    /// Fetch one article with the caller's visibility; anonymous is allowed
    pub async fn article_by_id(
        &self,
        cap: &Capability,
        id: &ArticleId,
    ) -> Result<Option<Article>, CoreError> {
        let proof = cap.proof()?;
        self.remote
            .get_by_id(id, &proof)
            .await
            .map_err(|e| self.translate_gated(e))
    }

    /// The public listing; no capability involved
    pub async fn published_articles(&self) -> Result<Vec<Article>, CoreError> {
        self.remote
            .list_published()
            .await
            .map_err(|e| self.translate_gated(e))
    }

    /// The admin listing through the gate
    pub async fn all_articles(&self, cap: &Capability) -> Result<Vec<Article>, CoreError> {
        let proof = self.authorize(cap)?;
        self.remote
            .list_all(&proof)
            .await
            .map_err(|e| self.translate_gated(e))
    }

    /// Translate a remote failure, clearing the stale local session when the
    /// remote no longer honors it.
    fn translate_gated(&self, err: RemoteError) -> CoreError {
        if matches!(err, RemoteError::Unauthorized(_)) {
            tracing::debug!("Remote rejected the session, clearing local copy");
            if let Err(clear_err) = self.sessions.clear() {
                tracing::warn!(error = %clear_err, "Failed to clear stale session");
            }
        }
        translate(err)
    }
}

/// Map remote failure kinds 1:1 onto the core taxonomy
fn translate(err: RemoteError) -> CoreError {
    match err {
        RemoteError::InvalidCredentials => CoreError::InvalidCredentials,
        RemoteError::Unauthorized(m) => CoreError::Unauthorized(m),
        RemoteError::Forbidden(m) => CoreError::Forbidden(m),
        RemoteError::NotFound(m) => CoreError::NotFound(m),
        RemoteError::Validation(m) => CoreError::Validation(m),
        RemoteError::Transport(e) => CoreError::Internal(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::MemoryRemote;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    struct Harness {
        remote: Arc<MemoryRemote>,
        sessions: Arc<SessionStore>,
        gateway: AuthGateway,
        _dir: TempDir,
    }

    fn harness() -> Harness {
        let dir = TempDir::new().unwrap();
        let sessions = Arc::new(SessionStore::open(dir.path().join("session.json")).unwrap());
        let remote = Arc::new(
            MemoryRemote::new()
                .with_user("owner", "pw", Role::Admin)
                .unwrap()
                .with_user("reader", "pw2", Role::User)
                .unwrap()
                .with_principal("svc-publisher", Role::Admin)
                .with_principal("svc-mirror", Role::User),
        );
        let gateway = AuthGateway::new(remote.clone(), sessions.clone(), Duration::hours(8));
        Harness {
            remote,
            sessions,
            gateway,
            _dir: dir,
        }
    }

    /// Remote that fails every operation at the transport level
    struct OfflineRemote;

    #[async_trait]
    impl RemoteStore for OfflineRemote {
        async fn login(&self, _: &str, _: &str) -> Result<String, RemoteError> {
            Err(RemoteError::Transport(anyhow::anyhow!("remote offline")))
        }
        async fn logout(&self, _: &str) -> Result<(), RemoteError> {
            Err(RemoteError::Transport(anyhow::anyhow!("remote offline")))
        }
        async fn create(
            &self,
            _: &ArticleInput,
            _: &CallerProof,
        ) -> Result<Article, RemoteError> {
            Err(RemoteError::Transport(anyhow::anyhow!("remote offline")))
        }
        async fn update(
            &self,
            _: &ArticleId,
            _: &ArticleInput,
            _: &CallerProof,
        ) -> Result<Article, RemoteError> {
            Err(RemoteError::Transport(anyhow::anyhow!("remote offline")))
        }
        async fn publish(&self, _: &ArticleId, _: &CallerProof) -> Result<Article, RemoteError> {
            Err(RemoteError::Transport(anyhow::anyhow!("remote offline")))
        }
        async fn unpublish(&self, _: &ArticleId, _: &CallerProof) -> Result<Article, RemoteError> {
            Err(RemoteError::Transport(anyhow::anyhow!("remote offline")))
        }
        async fn get_by_id(
            &self,
            _: &ArticleId,
            _: &CallerProof,
        ) -> Result<Option<Article>, RemoteError> {
            Err(RemoteError::Transport(anyhow::anyhow!("remote offline")))
        }
        async fn list_published(&self) -> Result<Vec<Article>, RemoteError> {
            Err(RemoteError::Transport(anyhow::anyhow!("remote offline")))
        }
        async fn list_all(&self, _: &CallerProof) -> Result<Vec<Article>, RemoteError> {
            Err(RemoteError::Transport(anyhow::anyhow!("remote offline")))
        }
        async fn is_caller_admin(&self, _: &CallerProof) -> Result<bool, RemoteError> {
            Err(RemoteError::Transport(anyhow::anyhow!("remote offline")))
        }
    }

    /// Remote that counts admin checks and answers a fixed verdict
    struct VerdictCountingRemote {
        verdict: bool,
        checks: AtomicUsize,
    }

    #[async_trait]
    impl RemoteStore for VerdictCountingRemote {
        async fn login(&self, _: &str, _: &str) -> Result<String, RemoteError> {
            unimplemented!("not used in these tests")
        }
        async fn logout(&self, _: &str) -> Result<(), RemoteError> {
            unimplemented!("not used in these tests")
        }
        async fn create(
            &self,
            _: &ArticleInput,
            _: &CallerProof,
        ) -> Result<Article, RemoteError> {
            unimplemented!("not used in these tests")
        }
        async fn update(
            &self,
            _: &ArticleId,
            _: &ArticleInput,
            _: &CallerProof,
        ) -> Result<Article, RemoteError> {
            unimplemented!("not used in these tests")
        }
        async fn publish(&self, _: &ArticleId, _: &CallerProof) -> Result<Article, RemoteError> {
            unimplemented!("not used in these tests")
        }
        async fn unpublish(&self, _: &ArticleId, _: &CallerProof) -> Result<Article, RemoteError> {
            unimplemented!("not used in these tests")
        }
        async fn get_by_id(
            &self,
            _: &ArticleId,
            _: &CallerProof,
        ) -> Result<Option<Article>, RemoteError> {
            unimplemented!("not used in these tests")
        }
        async fn list_published(&self) -> Result<Vec<Article>, RemoteError> {
            unimplemented!("not used in these tests")
        }
        async fn list_all(&self, _: &CallerProof) -> Result<Vec<Article>, RemoteError> {
            unimplemented!("not used in these tests")
        }
        async fn is_caller_admin(&self, _: &CallerProof) -> Result<bool, RemoteError> {
            self.checks.fetch_add(1, Ordering::SeqCst);
            Ok(self.verdict)
        }
    }

    #[tokio::test]
    async fn test_login_stores_session_before_returning() {
        let h = harness();
        let session = h.gateway.login("owner", "pw").await.unwrap();

        let stored = h.sessions.current().unwrap().unwrap();
        assert_eq!(stored, session);
        assert!(h
            .remote
            .is_caller_admin(&CallerProof::Token(stored.token))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_failed_login_never_mutates_session_store() {
        let h = harness();

        let err = h.gateway.login("owner", "wrong").await.unwrap_err();
        assert!(matches!(err, CoreError::InvalidCredentials));
        assert!(h.sessions.current().unwrap().is_none());

        // An existing session also survives a later failed login
        h.gateway.login("owner", "pw").await.unwrap();
        let before = h.sessions.current().unwrap().unwrap();
        let err = h.gateway.login("owner", "wrong").await.unwrap_err();
        assert!(matches!(err, CoreError::InvalidCredentials));
        assert_eq!(h.sessions.current().unwrap().unwrap(), before);
    }

    #[tokio::test]
    async fn test_logout_clears_local_session_and_invalidates_token() {
        let h = harness();
        let session = h.gateway.login("owner", "pw").await.unwrap();

        h.gateway.logout().await.unwrap();

        assert!(h.sessions.current().unwrap().is_none());
        let err = h
            .remote
            .is_caller_admin(&CallerProof::Token(session.token))
            .await
            .unwrap_err();
        assert!(matches!(err, RemoteError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_logout_succeeds_locally_when_remote_is_down() {
        let dir = TempDir::new().unwrap();
        let sessions = Arc::new(SessionStore::open(dir.path().join("session.json")).unwrap());
        sessions.create("tok-1", Duration::hours(8)).unwrap();

        let gateway = AuthGateway::new(Arc::new(OfflineRemote), sessions.clone(), Duration::hours(8));
        gateway.logout().await.unwrap();

        assert!(sessions.current().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_logout_without_session_is_ok() {
        let h = harness();
        h.gateway.logout().await.unwrap();
        assert!(h.sessions.current().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_authorize_rejects_anonymous_without_round_trip() {
        let dir = TempDir::new().unwrap();
        let sessions = Arc::new(SessionStore::open(dir.path().join("session.json")).unwrap());

        // An offline remote proves no network call is attempted
        let gateway = AuthGateway::new(Arc::new(OfflineRemote), sessions.clone(), Duration::hours(8));
        let cap = Capability::token(sessions);

        let err = gateway.authorize(&cap).unwrap_err();
        assert!(matches!(err, CoreError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_stale_local_session_is_cleared_on_remote_rejection() {
        let h = harness();
        let session = h.gateway.login("owner", "pw").await.unwrap();

        // The remote side drops the session; locally it still looks live
        h.remote.logout(&session.token).await.unwrap();
        assert!(h.sessions.current().unwrap().is_some());

        let cap = Capability::token(h.sessions.clone());
        let err = h
            .gateway
            .create_article(&cap, &ArticleInput::new("Hello", "World"))
            .await
            .unwrap_err();

        assert!(matches!(err, CoreError::Unauthorized(_)));
        assert!(h.sessions.current().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_forbidden_leaves_session_in_place() {
        let h = harness();
        h.gateway.login("reader", "pw2").await.unwrap();

        let cap = Capability::token(h.sessions.clone());
        let err = h
            .gateway
            .create_article(&cap, &ArticleInput::new("Hello", "World"))
            .await
            .unwrap_err();

        assert!(matches!(err, CoreError::Forbidden(_)));
        assert!(h.sessions.current().unwrap().is_some());
    }

    #[tokio::test]
    async fn test_access_level_token_variant() {
        let h = harness();
        let cap = Capability::token(h.sessions.clone());

        assert_eq!(h.gateway.access_level(&cap).await.unwrap(), Role::Guest);

        h.gateway.login("owner", "pw").await.unwrap();
        assert_eq!(h.gateway.access_level(&cap).await.unwrap(), Role::Admin);

        // A later non-admin login on the same store is resolved on its own
        // merits, not from the earlier verdict
        h.gateway.login("reader", "pw2").await.unwrap();
        assert_eq!(h.gateway.access_level(&cap).await.unwrap(), Role::User);

        h.gateway.logout().await.unwrap();
        assert_eq!(h.gateway.access_level(&cap).await.unwrap(), Role::Guest);
    }

    #[tokio::test]
    async fn test_token_role_is_resolved_once_per_token() {
        let dir = TempDir::new().unwrap();
        let sessions = Arc::new(SessionStore::open(dir.path().join("session.json")).unwrap());
        let remote = Arc::new(VerdictCountingRemote {
            verdict: true,
            checks: AtomicUsize::new(0),
        });
        let gateway = AuthGateway::new(remote.clone(), sessions.clone(), Duration::hours(8));

        sessions.create("tok-1", Duration::hours(8)).unwrap();
        let cap = Capability::token(sessions.clone());
        assert_eq!(gateway.access_level(&cap).await.unwrap(), Role::Admin);
        assert_eq!(gateway.access_level(&cap).await.unwrap(), Role::Admin);
        assert_eq!(remote.checks.load(Ordering::SeqCst), 1);

        // A replacement token invalidates the cached verdict
        sessions.create("tok-2", Duration::hours(8)).unwrap();
        assert_eq!(gateway.access_level(&cap).await.unwrap(), Role::Admin);
        assert_eq!(remote.checks.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_access_level_clears_stale_session_on_remote_rejection() {
        let h = harness();
        let session = h.gateway.login("owner", "pw").await.unwrap();

        // The remote side drops the session; locally it still looks live
        h.remote.logout(&session.token).await.unwrap();

        let cap = Capability::token(h.sessions.clone());
        let err = h.gateway.access_level(&cap).await.unwrap_err();
        assert!(matches!(err, CoreError::Unauthorized(_)));
        assert!(h.sessions.current().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_access_level_identity_variant() {
        let h = harness();

        let admin = Capability::identity("svc-publisher");
        assert_eq!(h.gateway.access_level(&admin).await.unwrap(), Role::Admin);

        let mirror = Capability::identity("svc-mirror");
        assert_eq!(h.gateway.access_level(&mirror).await.unwrap(), Role::User);

        let anon = Capability::anonymous();
        assert_eq!(h.gateway.access_level(&anon).await.unwrap(), Role::Guest);
    }

    #[tokio::test]
    async fn test_identity_role_is_resolved_once_per_session() {
        let dir = TempDir::new().unwrap();
        let sessions = Arc::new(SessionStore::open(dir.path().join("session.json")).unwrap());
        let remote = Arc::new(VerdictCountingRemote {
            verdict: true,
            checks: AtomicUsize::new(0),
        });
        let gateway = AuthGateway::new(remote.clone(), sessions, Duration::hours(8));

        let cap = Capability::identity("svc-publisher");
        assert_eq!(gateway.access_level(&cap).await.unwrap(), Role::Admin);
        assert_eq!(gateway.access_level(&cap).await.unwrap(), Role::Admin);
        assert_eq!(gateway.access_level(&cap.clone()).await.unwrap(), Role::Admin);

        assert_eq!(remote.checks.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_reads_pass_anonymous_proof_through() {
        let h = harness();
        let admin = Capability::identity("svc-publisher");
        let article = h
            .gateway
            .create_article(&admin, &ArticleInput::new("Hello", "World"))
            .await
            .unwrap();
        h.gateway.publish_article(&admin, &article.id).await.unwrap();

        let anon = Capability::anonymous();
        let seen = h
            .gateway
            .article_by_id(&anon, &article.id)
            .await
            .unwrap()
            .expect("published article visible anonymously");
        assert_eq!(seen.title, "Hello");

        let listed = h.gateway.published_articles().await.unwrap();
        assert_eq!(listed.len(), 1);
    }

    #[tokio::test]
    async fn test_transport_failures_surface_as_internal() {
        let dir = TempDir::new().unwrap();
        let sessions = Arc::new(SessionStore::open(dir.path().join("session.json")).unwrap());
        sessions.create("tok-1", Duration::hours(8)).unwrap();

        let gateway = AuthGateway::new(Arc::new(OfflineRemote), sessions.clone(), Duration::hours(8));
        let cap = Capability::token(sessions.clone());

        let err = gateway
            .create_article(&cap, &ArticleInput::new("Hello", "World"))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Internal(_)));

        // Transport trouble is not an authorization signal
        assert!(sessions.current().unwrap().is_some());
    }
}
