//! Remote content service boundary
//!
//! This module defines the abstract interface to the remote data service that
//! owns article storage and the server side of sessions:
//! - `RemoteStore` trait - the operation set the client core requires
//! - `CallerProof` - the proof of calling rights attached to each operation
//! - `RemoteError` - structured failure kinds returned by the boundary
//!
//! Two bindings are provided: `HttpRemote` speaks JSON over HTTP with bearer
//! tokens, `MemoryRemote` is a complete in-process source of truth used by
//! tests and the demo walkthrough.

mod http;
mod memory;

pub use http::HttpRemote;
pub use memory::MemoryRemote;

use async_trait::async_trait;

use crate::models::{Article, ArticleId, ArticleInput};

/// Proof of calling rights presented to the remote service.
///
/// Produced by a capability at call time; the remote side resolves it to a
/// role. Business logic never inspects which variant it carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallerProof {
    /// Opaque bearer token obtained through login
    Token(String),
    /// Ambient principal authenticated by the deployment's infrastructure
    Identity(String),
    /// No proof at all
    Anonymous,
}

impl CallerProof {
    /// Whether this proof asserts nothing about the caller
    pub fn is_anonymous(&self) -> bool {
        matches!(self, CallerProof::Anonymous)
    }
}

/// Structured failure kinds at the remote boundary.
///
/// The kinds are carried explicitly rather than recovered from message text,
/// so the gateway can translate them without guessing.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    /// Login rejected
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Missing, invalid or expired proof on a gated operation
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Valid proof with insufficient role
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Unknown article id
    #[error("Article not found: {0}")]
    NotFound(String),

    /// Input rejected by the remote service
    #[error("Validation error: {0}")]
    Validation(String),

    /// Transport-level failure
    #[error(transparent)]
    Transport(#[from] anyhow::Error),
}

/// Operations the client core requires from the remote content service.
///
/// Reads are total for stale proofs: an invalid or expired token degrades to
/// anonymous visibility instead of erroring, while mutations and the admin
/// listing report `Unauthorized`/`Forbidden`. `get_by_id` reports an unknown
/// id as `Ok(None)`, never as an error.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Exchange credentials for a bearer token
    async fn login(&self, username: &str, password: &str) -> Result<String, RemoteError>;

    /// Invalidate a token server-side; unknown tokens are not an error
    async fn logout(&self, token: &str) -> Result<(), RemoteError>;

    /// Create a new article in draft state
    async fn create(
        &self,
        input: &ArticleInput,
        proof: &CallerProof,
    ) -> Result<Article, RemoteError>;

    /// Replace an article's editable fields, preserving its status
    async fn update(
        &self,
        id: &ArticleId,
        input: &ArticleInput,
        proof: &CallerProof,
    ) -> Result<Article, RemoteError>;

    /// Transition draft -> published; already-published is an idempotent success
    async fn publish(&self, id: &ArticleId, proof: &CallerProof) -> Result<Article, RemoteError>;

    /// Transition published -> draft; already-draft is an idempotent success
    async fn unpublish(&self, id: &ArticleId, proof: &CallerProof)
        -> Result<Article, RemoteError>;

    /// Fetch one article, applying the caller's visibility
    async fn get_by_id(
        &self,
        id: &ArticleId,
        proof: &CallerProof,
    ) -> Result<Option<Article>, RemoteError>;

    /// All published articles in the service's natural order; no proof needed
    async fn list_published(&self) -> Result<Vec<Article>, RemoteError>;

    /// Every article regardless of status; admin only
    async fn list_all(&self, proof: &CallerProof) -> Result<Vec<Article>, RemoteError>;

    /// Whether the proof resolves to the admin role
    async fn is_caller_admin(&self, proof: &CallerProof) -> Result<bool, RemoteError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_anonymous_proof_is_anonymous() {
        assert!(CallerProof::Anonymous.is_anonymous());
        assert!(!CallerProof::Token("t".to_string()).is_anonymous());
        assert!(!CallerProof::Identity("p".to_string()).is_anonymous());
    }
}
