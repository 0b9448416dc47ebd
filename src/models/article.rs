//! Article model
//!
//! This module provides:
//! - `Article` entity representing a publishable article
//! - `ArticleId` opaque stable identifier assigned by the remote service
//! - `ContentStatus` enum for the draft/published lifecycle
//! - `ArticleInput` carrying the caller-editable fields for create and update
//! - `BlobRef` opaque reference to an externally stored cover image

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Opaque stable article identifier.
///
/// Assigned by the remote content service and never interpreted locally.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArticleId(String);

impl ArticleId {
    /// View the identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for ArticleId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for ArticleId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for ArticleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Reference to an externally stored binary, resolvable to a URL.
///
/// The bytes behind the reference are owned by the blob collaborator; this
/// crate only threads the reference through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlobRef(String);

impl BlobRef {
    /// Wrap an already-resolved URL
    pub fn from_url(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    /// The URL the reference resolves to
    pub fn url(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BlobRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Article entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    /// Unique identifier
    pub id: ArticleId,
    /// Article title
    pub title: String,
    /// Article body text
    pub body: String,
    /// Publication status
    pub status: ContentStatus,
    /// Optional cover image reference
    #[serde(default)]
    pub cover_image: Option<BlobRef>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp, never earlier than `created_at`
    pub updated_at: DateTime<Utc>,
}

impl Article {
    /// Whether the article is visible to anonymous and non-admin callers
    pub fn is_published(&self) -> bool {
        self.status == ContentStatus::Published
    }
}

/// Article publication status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentStatus {
    /// Draft - visible to the admin only
    Draft,
    /// Published - visible to everyone
    Published,
}

impl Default for ContentStatus {
    fn default() -> Self {
        Self::Draft
    }
}

impl ContentStatus {
    /// Convert status to its wire string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentStatus::Draft => "draft",
            ContentStatus::Published => "published",
        }
    }
}

impl FromStr for ContentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "draft" => Ok(ContentStatus::Draft),
            "published" => Ok(ContentStatus::Published),
            other => Err(format!("Invalid content status: {}", other)),
        }
    }
}

impl fmt::Display for ContentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Caller-editable article fields, shared by create and update.
///
/// Update is a full-field replacement, so the same input type serves both
/// operations. Status is deliberately absent: publication state only moves
/// through the publish/unpublish transitions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleInput {
    /// Article title
    pub title: String,
    /// Article body text
    pub body: String,
    /// Optional cover image reference
    #[serde(default)]
    pub cover_image: Option<BlobRef>,
}

impl ArticleInput {
    /// Create an input with title and body
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            cover_image: None,
        }
    }

    /// Set the cover image reference
    pub fn with_cover_image(mut self, cover_image: BlobRef) -> Self {
        self.cover_image = Some(cover_image);
        self
    }
}
