//! Role model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Caller role, as resolved by the remote service or implied by holding a
/// valid admin session.
///
/// Also serves as the gateway's access-level answer, covering the three
/// possible outcomes of presenting a capability: admin, authenticated
/// non-admin, unauthenticated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Administrator - may create, edit and toggle publication state
    Admin,
    /// Authenticated caller without administrative rights
    User,
    /// Unauthenticated caller
    Guest,
}

impl Default for Role {
    fn default() -> Self {
        Self::Guest
    }
}

impl Role {
    /// Check whether this role carries administrative rights
    pub fn is_admin(self) -> bool {
        self == Role::Admin
    }

    /// Convert role to its wire string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
            Role::Guest => "guest",
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "user" => Ok(Role::User),
            "guest" => Ok(Role::Guest),
            other => Err(format!("Invalid role: {}", other)),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
