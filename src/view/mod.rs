//! View cache for article reads and listings
//!
//! Keeps recently served views in memory using moka:
//! - single-article views, keyed by [`ArticleId`]
//! - the two listings (admin and public), keyed by [`ListingKind`]
//!
//! Mutations invalidate the affected entries before their results are
//! surfaced, so a caller who just wrote always reads fresh data. TTLs only
//! bound staleness introduced by other writers.

use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;

use crate::config::CacheConfig;
use crate::models::{Article, ArticleId};

/// The two cached listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListingKind {
    /// Every article regardless of status, admin only
    Admin,
    /// Published articles only
    Public,
}

/// In-memory cache over article views and listings.
pub struct ViewCache {
    articles: Cache<ArticleId, Arc<Article>>,
    listings: Cache<ListingKind, Arc<Vec<Article>>>,
}

impl std::fmt::Debug for ViewCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewCache")
            .field("article_entries", &self.articles.entry_count())
            .field("listing_entries", &self.listings.entry_count())
            .finish()
    }
}

impl ViewCache {
    /// Build the cache from configured capacities and TTLs.
    pub fn new(config: &CacheConfig) -> Self {
        let articles = Cache::builder()
            .max_capacity(config.max_entries)
            .time_to_live(Duration::from_secs(config.article_ttl_seconds))
            .build();
        let listings = Cache::builder()
            .max_capacity(2)
            .time_to_live(Duration::from_secs(config.list_ttl_seconds))
            .build();

        Self { articles, listings }
    }

    /// Look up a cached single-article view.
    pub async fn article(&self, id: &ArticleId) -> Option<Arc<Article>> {
        self.articles.get(id).await
    }

    /// Cache a single-article view.
    pub async fn put_article(&self, article: Article) {
        self.articles
            .insert(article.id.clone(), Arc::new(article))
            .await;
    }

    /// Look up a cached listing.
    pub async fn listing(&self, kind: ListingKind) -> Option<Arc<Vec<Article>>> {
        self.listings.get(&kind).await
    }

    /// Cache a listing.
    pub async fn put_listing(&self, kind: ListingKind, articles: Vec<Article>) {
        self.listings.insert(kind, Arc::new(articles)).await;
    }

    /// Drop one article's view along with both listings.
    ///
    /// Any mutation of an article can change its membership or position in
    /// either listing, so the listings always go with it.
    pub async fn invalidate_article(&self, id: &ArticleId) {
        self.articles.invalidate(id).await;
        self.invalidate_listings().await;
    }

    /// Drop both listings.
    pub async fn invalidate_listings(&self) {
        self.listings.invalidate(&ListingKind::Admin).await;
        self.listings.invalidate(&ListingKind::Public).await;
    }

    /// Drop everything.
    pub async fn invalidate_all(&self) {
        self.articles.invalidate_all();
        self.listings.invalidate_all();
        self.articles.run_pending_tasks().await;
        self.listings.run_pending_tasks().await;
    }
}
