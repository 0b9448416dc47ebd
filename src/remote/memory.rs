//! In-process remote store
//!
//! `MemoryRemote` is a complete stand-in for the remote content service: it
//! owns credential verification, server-side sessions and the article table.
//! The test suite and the demo walkthrough run against it; nothing here
//! touches the network.
//!
//! Credentials are stored as Argon2id hashes. Issued tokens live in a table
//! with a fixed lifetime and are pruned lazily when presented, the same way
//! the local store expires its record on read.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

use super::{CallerProof, RemoteError, RemoteStore};
use crate::models::{Article, ArticleId, ArticleInput, ContentStatus, Role};

/// Default lifetime of an issued token
const TOKEN_TTL_HOURS: i64 = 8;

struct Account {
    password_hash: String,
    role: Role,
}

struct ServerSession {
    role: Role,
    expires_at: DateTime<Utc>,
}

impl ServerSession {
    fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }
}

/// In-memory source of truth implementing [`RemoteStore`].
pub struct MemoryRemote {
    accounts: RwLock<HashMap<String, Account>>,
    sessions: RwLock<HashMap<String, ServerSession>>,
    principals: RwLock<HashMap<String, Role>>,
    articles: RwLock<Vec<Article>>,
    token_ttl: Duration,
}

impl MemoryRemote {
    /// Create an empty store with the default token lifetime
    pub fn new() -> Self {
        Self {
            accounts: RwLock::new(HashMap::new()),
            sessions: RwLock::new(HashMap::new()),
            principals: RwLock::new(HashMap::new()),
            articles: RwLock::new(Vec::new()),
            token_ttl: Duration::hours(TOKEN_TTL_HOURS),
        }
    }

    /// Seed an account that can log in with the given password
    pub fn with_user(self, username: &str, password: &str, role: Role) -> anyhow::Result<Self> {
        let account = Account {
            password_hash: hash_password(password)?,
            role,
        };
        write_locked(&self.accounts).insert(username.to_string(), account);
        Ok(self)
    }

    /// Seed an ambient principal with a fixed role
    pub fn with_principal(self, principal: &str, role: Role) -> Self {
        write_locked(&self.principals).insert(principal.to_string(), role);
        self
    }

    /// Override the lifetime of issued tokens
    pub fn with_token_ttl(mut self, ttl: Duration) -> Self {
        self.token_ttl = ttl;
        self
    }

    /// Resolve a proof to a role, pruning an expired token on the way.
    ///
    /// `None` means the caller is unauthenticated: no proof, an unknown
    /// principal, or a token this store no longer recognizes.
    fn resolve(&self, proof: &CallerProof) -> Option<Role> {
        match proof {
            CallerProof::Token(token) => {
                let mut sessions = write_locked(&self.sessions);
                match sessions.get(token) {
                    Some(session) if session.is_expired() => {
                        sessions.remove(token);
                        None
                    }
                    Some(session) => Some(session.role),
                    None => None,
                }
            }
            CallerProof::Identity(principal) => {
                read_locked(&self.principals).get(principal).copied()
            }
            CallerProof::Anonymous => None,
        }
    }

    fn require_admin(&self, proof: &CallerProof) -> Result<(), RemoteError> {
        match self.resolve(proof) {
            Some(role) if role.is_admin() => Ok(()),
            Some(role) => Err(RemoteError::Forbidden(format!(
                "Admin role required, caller is {}",
                role
            ))),
            None => Err(RemoteError::Unauthorized(
                "No valid session presented".to_string(),
            )),
        }
    }

    fn validate_input(input: &ArticleInput) -> Result<(), RemoteError> {
        if input.title.trim().is_empty() {
            return Err(RemoteError::Validation(
                "Article title cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for MemoryRemote {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RemoteStore for MemoryRemote {
    async fn login(&self, username: &str, password: &str) -> Result<String, RemoteError> {
        let (verified, role) = {
            let accounts = read_locked(&self.accounts);
            match accounts.get(username) {
                Some(account) => (
                    verify_password(password, &account.password_hash)?,
                    account.role,
                ),
                None => return Err(RemoteError::InvalidCredentials),
            }
        };
        if !verified {
            return Err(RemoteError::InvalidCredentials);
        }

        let token = Uuid::new_v4().to_string();
        write_locked(&self.sessions).insert(
            token.clone(),
            ServerSession {
                role,
                expires_at: Utc::now() + self.token_ttl,
            },
        );
        Ok(token)
    }

    async fn logout(&self, token: &str) -> Result<(), RemoteError> {
        write_locked(&self.sessions).remove(token);
        Ok(())
    }

    async fn create(
        &self,
        input: &ArticleInput,
        proof: &CallerProof,
    ) -> Result<Article, RemoteError> {
        self.require_admin(proof)?;
        Self::validate_input(input)?;

        let now = Utc::now();
        let article = Article {
            id: ArticleId::from(Uuid::new_v4().to_string()),
            title: input.title.clone(),
            body: input.body.clone(),
            status: ContentStatus::Draft,
            cover_image: input.cover_image.clone(),
            created_at: now,
            updated_at: now,
        };

        write_locked(&self.articles).push(article.clone());
        Ok(article)
    }

    async fn update(
        &self,
        id: &ArticleId,
        input: &ArticleInput,
        proof: &CallerProof,
    ) -> Result<Article, RemoteError> {
        self.require_admin(proof)?;
        Self::validate_input(input)?;

        let mut articles = write_locked(&self.articles);
        let article = articles
            .iter_mut()
            .find(|a| &a.id == id)
            .ok_or_else(|| RemoteError::NotFound(id.to_string()))?;

        article.title = input.title.clone();
        article.body = input.body.clone();
        article.cover_image = input.cover_image.clone();
        article.updated_at = Utc::now().max(article.created_at);
        Ok(article.clone())
    }

    async fn publish(&self, id: &ArticleId, proof: &CallerProof) -> Result<Article, RemoteError> {
        self.require_admin(proof)?;

        let mut articles = write_locked(&self.articles);
        let article = articles
            .iter_mut()
            .find(|a| &a.id == id)
            .ok_or_else(|| RemoteError::NotFound(id.to_string()))?;

        // Already published: idempotent success, timestamps untouched
        if article.status == ContentStatus::Draft {
            article.status = ContentStatus::Published;
            article.updated_at = Utc::now().max(article.created_at);
        }
        Ok(article.clone())
    }

    async fn unpublish(
        &self,
        id: &ArticleId,
        proof: &CallerProof,
    ) -> Result<Article, RemoteError> {
        self.require_admin(proof)?;

        let mut articles = write_locked(&self.articles);
        let article = articles
            .iter_mut()
            .find(|a| &a.id == id)
            .ok_or_else(|| RemoteError::NotFound(id.to_string()))?;

        if article.status == ContentStatus::Published {
            article.status = ContentStatus::Draft;
            article.updated_at = Utc::now().max(article.created_at);
        }
        Ok(article.clone())
    }

    async fn get_by_id(
        &self,
        id: &ArticleId,
        proof: &CallerProof,
    ) -> Result<Option<Article>, RemoteError> {
        let is_admin = matches!(self.resolve(proof), Some(role) if role.is_admin());

        let articles = read_locked(&self.articles);
        let found = articles.iter().find(|a| &a.id == id);
        Ok(match found {
            Some(article) if is_admin || article.is_published() => Some(article.clone()),
            _ => None,
        })
    }

    async fn list_published(&self) -> Result<Vec<Article>, RemoteError> {
        let articles = read_locked(&self.articles);
        Ok(articles
            .iter()
            .filter(|a| a.is_published())
            .cloned()
            .collect())
    }

    async fn list_all(&self, proof: &CallerProof) -> Result<Vec<Article>, RemoteError> {
        self.require_admin(proof)?;
        Ok(read_locked(&self.articles).clone())
    }

    async fn is_caller_admin(&self, proof: &CallerProof) -> Result<bool, RemoteError> {
        match self.resolve(proof) {
            Some(role) => Ok(role.is_admin()),
            // A presented token this store no longer recognizes is an
            // authentication failure, not a guest
            None if matches!(proof, CallerProof::Token(_)) => Err(RemoteError::Unauthorized(
                "No valid session presented".to_string(),
            )),
            None => Ok(false),
        }
    }
}

/// Hash a password using Argon2id with a random salt
fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))?;

    Ok(password_hash.to_string())
}

/// Verify a password against a stored PHC-format hash
fn verify_password(password: &str, hash: &str) -> Result<bool, RemoteError> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| anyhow::anyhow!("Invalid password hash format: {}", e))?;

    let argon2 = Argon2::default();

    match argon2.verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(RemoteError::Transport(anyhow::anyhow!(
            "Password verification failed: {}",
            e
        ))),
    }
}

fn read_locked<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|e| e.into_inner())
}

fn write_locked<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|e| e.into_inner())
}
