//! Data models
//!
//! This module contains the data structures shared across the crate:
//! - Content entities (Article, ArticleId, ContentStatus, ArticleInput, BlobRef)
//! - The locally persisted Session record
//! - The caller Role resolved through authorization

mod article;
mod role;
mod session;

pub use article::{Article, ArticleId, ArticleInput, BlobRef, ContentStatus};
pub use role::Role;
pub use session::Session;
