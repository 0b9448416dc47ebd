//! Article lifecycle over the authorization gateway
//!
//! `ContentLifecycle` drives every article operation end to end:
//! - input validation before anything touches the network
//! - the draft/published state machine through [`AuthGateway`]
//! - cache maintenance in [`ViewCache`] so a writer reads its own writes
//!
//! Reads are served cache-aside with a visibility filter applied at serve
//! time, so a draft cached during an admin session is never handed to a
//! caller who has since lost that access.

use std::sync::Arc;

use crate::auth::{AuthGateway, Capability};
use crate::error::CoreError;
use crate::models::{Article, ArticleId, ArticleInput, Role};
use crate::view::{ListingKind, ViewCache};

/// Article operations with validation, gating and view consistency.
pub struct ContentLifecycle {
    gateway: Arc<AuthGateway>,
    views: Arc<ViewCache>,
}

impl ContentLifecycle {
    pub fn new(gateway: Arc<AuthGateway>, views: Arc<ViewCache>) -> Self {
        Self { gateway, views }
    }

    /// Create a new article; it always starts as a draft.
    pub async fn create(
        &self,
        cap: &Capability,
        input: &ArticleInput,
    ) -> Result<Article, CoreError> {
        let input = normalize_input(input);
        validate_input(&input)?;
        let article = self.gateway.create_article(cap, &input).await?;
        self.views.invalidate_article(&article.id).await;
        tracing::info!(id = %article.id, "Article created");
        Ok(article)
    }

    /// Replace an article's editable fields; its status is untouched.
    pub async fn update(
        &self,
        cap: &Capability,
        id: &ArticleId,
        input: &ArticleInput,
    ) -> Result<Article, CoreError> {
        let input = normalize_input(input);
        validate_input(&input)?;
        let article = self.gateway.update_article(cap, id, &input).await?;
        self.views.invalidate_article(&article.id).await;
        tracing::info!(id = %article.id, "Article updated");
        Ok(article)
    }

    /// Transition an article to published. Publishing a published article is
    /// a no-op success.
    pub async fn publish(&self, cap: &Capability, id: &ArticleId) -> Result<Article, CoreError> {
        let article = self.gateway.publish_article(cap, id).await?;
        self.views.invalidate_article(&article.id).await;
        tracing::info!(id = %article.id, "Article published");
        Ok(article)
    }

    /// Transition an article back to draft. Unpublishing a draft is a no-op
    /// success.
    pub async fn unpublish(&self, cap: &Capability, id: &ArticleId) -> Result<Article, CoreError> {
        let article = self.gateway.unpublish_article(cap, id).await?;
        self.views.invalidate_article(&article.id).await;
        tracing::info!(id = %article.id, "Article unpublished");
        Ok(article)
    }

    /// Fetch one article with the caller's visibility.
    ///
    /// A draft is indistinguishable from a missing article for non-admin
    /// callers: both come back as `None`.
    pub async fn read(
        &self,
        cap: &Capability,
        id: &ArticleId,
    ) -> Result<Option<Article>, CoreError> {
        let access = self.gateway.access_level(cap).await?;

        let article = match self.views.article(id).await {
            Some(cached) => Some(cached.as_ref().clone()),
            None => {
                let fetched = self.gateway.article_by_id(cap, id).await?;
                if let Some(article) = &fetched {
                    self.views.put_article(article.clone()).await;
                }
                fetched
            }
        };

        Ok(article.filter(|a| access.is_admin() || a.is_published()))
    }

    /// The public listing: published articles, oldest first.
    pub async fn list_published(&self) -> Result<Vec<Article>, CoreError> {
        if let Some(cached) = self.views.listing(ListingKind::Public).await {
            return Ok(cached.as_ref().clone());
        }
        let articles = self.gateway.published_articles().await?;
        self.views
            .put_listing(ListingKind::Public, articles.clone())
            .await;
        Ok(articles)
    }

    /// The admin listing: every article regardless of status.
    ///
    /// Access is resolved before the cache is consulted, so a warm listing is
    /// never served to a caller who has since lost admin access.
    pub async fn list_all(&self, cap: &Capability) -> Result<Vec<Article>, CoreError> {
        match self.gateway.access_level(cap).await? {
            Role::Admin => {}
            Role::Guest => return Err(CoreError::Unauthorized("Not logged in".to_string())),
            Role::User => return Err(CoreError::Forbidden("Admin role required".to_string())),
        }

        if let Some(cached) = self.views.listing(ListingKind::Admin).await {
            return Ok(cached.as_ref().clone());
        }
        let articles = self.gateway.all_articles(cap).await?;
        self.views
            .put_listing(ListingKind::Admin, articles.clone())
            .await;
        Ok(articles)
    }
}

/// Trim the title before it leaves the client. Body text is the author's
/// formatting and stays untouched.
fn normalize_input(input: &ArticleInput) -> ArticleInput {
    ArticleInput {
        title: input.title.trim().to_string(),
        body: input.body.clone(),
        cover_image: input.cover_image.clone(),
    }
}

/// Validate article input before it leaves the client.
fn validate_input(input: &ArticleInput) -> Result<(), CoreError> {
    if input.title.trim().is_empty() {
        return Err(CoreError::Validation(
            "Article title cannot be empty".to_string(),
        ));
    }
    Ok(())
}
