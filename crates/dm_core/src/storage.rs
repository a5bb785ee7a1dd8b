use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::types::{ArticleStatus, DisasterType, ProcessedArticle, Region, Severity, StoredArticle};
use crate::{Error, Result};

/// Query over stored documents. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArticleFilter {
    pub source: Option<String>,
    pub severity: Option<Severity>,
    pub disaster_type: Option<DisasterType>,
    pub region: Option<Region>,
    pub is_disaster: Option<bool>,
    pub collected_after: Option<DateTime<Utc>>,
    pub collected_before: Option<DateTime<Utc>>,
    pub published_after: Option<DateTime<Utc>>,
    pub published_before: Option<DateTime<Utc>>,
    pub limit: Option<usize>,
}

impl ArticleFilter {
    pub fn matches(&self, doc: &StoredArticle) -> bool {
        let article = &doc.article;
        if let Some(source) = &self.source {
            if &article.source != source {
                return false;
            }
        }
        if self.severity.is_some_and(|s| s != article.severity) {
            return false;
        }
        if self.disaster_type.is_some_and(|t| t != article.disaster_type) {
            return false;
        }
        if self.region.is_some() && self.region != article.region {
            return false;
        }
        if self.is_disaster.is_some_and(|d| d != article.is_disaster) {
            return false;
        }
        if self.collected_after.is_some_and(|t| doc.collected_at < t) {
            return false;
        }
        if self.collected_before.is_some_and(|t| doc.collected_at > t) {
            return false;
        }
        if self.published_after.is_some() || self.published_before.is_some() {
            let Some(published) = article.published_at else {
                return false;
            };
            if self.published_after.is_some_and(|t| published < t) {
                return false;
            }
            if self.published_before.is_some_and(|t| published > t) {
                return false;
            }
        }
        true
    }
}

/// Field used for grouped counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupField {
    Source,
    Severity,
    DisasterType,
    Region,
}

impl GroupField {
    pub fn key_of(&self, article: &ProcessedArticle) -> String {
        match self {
            GroupField::Source => article.source.clone(),
            GroupField::Severity => article.severity.to_string(),
            GroupField::DisasterType => article.disaster_type.to_string(),
            GroupField::Region => article
                .region
                .map(|r| r.to_string())
                .unwrap_or_else(|| "unknown".to_string()),
        }
    }
}

#[async_trait]
pub trait ArticleStorage: Send + Sync {
    /// Insert, or update in place when a document with the same url exists.
    async fn upsert_article(&self, article: &ProcessedArticle) -> Result<ArticleStatus>;

    async fn get_article(&self, url: &str) -> Result<Option<StoredArticle>>;

    /// Documents matching the filter, newest collection first.
    async fn find_articles(&self, filter: &ArticleFilter) -> Result<Vec<StoredArticle>>;

    async fn count_articles(&self, filter: &ArticleFilter) -> Result<usize>;

    /// Grouped counts sorted by descending count.
    async fn count_by(&self, field: GroupField, filter: &ArticleFilter) -> Result<Vec<(String, usize)>>;

    /// Case-insensitive search over title, summary and content.
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<StoredArticle>>;

    /// Get all articles from a specific source
    async fn get_by_source(&self, source: &str) -> Result<Vec<StoredArticle>> {
        let filter = ArticleFilter {
            source: Some(source.to_string()),
            ..Default::default()
        };
        self.find_articles(&filter).await
    }
}

/// Injected reference to the storage collaborator.
///
/// Starts disconnected; [`StorageHandle::get`] fails with
/// [`Error::NotConnected`] until a backend is attached.
#[derive(Clone, Default)]
pub struct StorageHandle {
    inner: Arc<RwLock<Option<Arc<dyn ArticleStorage>>>>,
}

impl StorageHandle {
    pub fn disconnected() -> Self {
        Self::default()
    }

    pub fn connected(storage: Arc<dyn ArticleStorage>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Some(storage))),
        }
    }

    pub async fn connect(&self, storage: Arc<dyn ArticleStorage>) {
        *self.inner.write().await = Some(storage);
    }

    pub async fn disconnect(&self) {
        *self.inner.write().await = None;
    }

    pub async fn is_connected(&self) -> bool {
        self.inner.read().await.is_some()
    }

    pub async fn get(&self) -> Result<Arc<dyn ArticleStorage>> {
        self.inner.read().await.clone().ok_or(Error::NotConnected)
    }
}

impl std::fmt::Debug for StorageHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageHandle")
            .field("storage", &"<dyn ArticleStorage>")
            .finish()
    }
}
