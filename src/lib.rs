//! Pressgate - session-gated publishing client core
//!
//! This library provides the client side of a remote content service:
//! persisted admin sessions, an authorization gateway, the article
//! draft/published lifecycle and cached read views.

pub mod auth;
pub mod config;
pub mod content;
pub mod error;
pub mod models;
pub mod remote;
pub mod session;
pub mod view;
