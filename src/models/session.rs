//! Session model

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Locally persisted session record.
///
/// Serialized with camelCase field names so the on-disk record reads
/// `{"token": ..., "expiresAt": ...}`. The token is an opaque bearer
/// credential; nothing in this crate inspects its structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Opaque bearer token issued by the remote service
    pub token: String,
    /// Expiration timestamp
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Build a session expiring `ttl` from now
    pub fn new(token: impl Into<String>, ttl: Duration) -> Self {
        Self {
            token: token.into(),
            expires_at: Utc::now() + ttl,
        }
    }

    /// Check if the session has expired.
    ///
    /// A session is valid strictly before its expiration instant, so a
    /// session whose `expires_at` equals the current instant is expired.
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }
}
