//! Core error taxonomy
//!
//! Every component of the crate reports failures through [`CoreError`] so that
//! callers see one uniform set of kinds regardless of which layer produced the
//! failure:
//! - `InvalidCredentials` - a login attempt was rejected
//! - `Unauthorized` - no session (or an invalid/expired one) was presented to
//!   a gated operation
//! - `Forbidden` - a live session with an insufficient role
//! - `NotFound` - an unknown article id was referenced
//! - `Validation` - malformed input, e.g. an empty title
//! - `Internal` - transport or IO trouble, carried with its cause chain
//!
//! None of these are fatal to the process; each is scoped to the single
//! operation that produced it.

/// Error type shared by the session store, the auth gateway and the content
/// lifecycle.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Login rejected by the remote service
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// No session, or an invalid/expired session, presented to a gated operation
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Valid session but insufficient role
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Unknown article id
    #[error("Article not found: {0}")]
    NotFound(String),

    /// Malformed input
    #[error("Validation error: {0}")]
    Validation(String),

    /// Transport or IO failure
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl CoreError {
    /// Stable machine-readable code for this error kind.
    pub fn code(&self) -> &'static str {
        match self {
            CoreError::InvalidCredentials => "INVALID_CREDENTIALS",
            CoreError::Unauthorized(_) => "UNAUTHORIZED",
            CoreError::Forbidden(_) => "FORBIDDEN",
            CoreError::NotFound(_) => "NOT_FOUND",
            CoreError::Validation(_) => "VALIDATION_ERROR",
            CoreError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_are_stable() {
        assert_eq!(CoreError::InvalidCredentials.code(), "INVALID_CREDENTIALS");
        assert_eq!(
            CoreError::Unauthorized("no session".to_string()).code(),
            "UNAUTHORIZED"
        );
        assert_eq!(
            CoreError::Forbidden("admin required".to_string()).code(),
            "FORBIDDEN"
        );
        assert_eq!(CoreError::NotFound("abc".to_string()).code(), "NOT_FOUND");
        assert_eq!(
            CoreError::Validation("empty title".to_string()).code(),
            "VALIDATION_ERROR"
        );
    }

    #[test]
    fn test_display_includes_detail() {
        let err = CoreError::NotFound("a1b2".to_string());
        assert_eq!(err.to_string(), "Article not found: a1b2");

        let err = CoreError::Unauthorized("Not logged in".to_string());
        assert!(err.to_string().contains("Not logged in"));
    }

    #[test]
    fn test_internal_preserves_cause() {
        let cause = anyhow::anyhow!("disk full");
        let err = CoreError::from(cause);
        assert!(matches!(err, CoreError::Internal(_)));
        assert!(err.to_string().contains("disk full"));
    }
}
