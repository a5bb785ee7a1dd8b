use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use dm_core::{
    ArticleFilter, ArticleStatus, ArticleStorage, GroupField, ProcessedArticle, Result,
    StoredArticle,
};
use tokio::sync::RwLock;
use tracing::debug;

use crate::{BackendConfig, StorageBackend};

/// Documents in insertion order plus a url index.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collection: String,
    articles: Vec<StoredArticle>,
    by_url: HashMap<String, usize>,
}

impl MemoryStore {
    pub fn new(collection: String) -> Self {
        Self {
            collection,
            ..Default::default()
        }
    }

    pub fn upsert(&mut self, article: &ProcessedArticle) -> ArticleStatus {
        let now = Utc::now();
        if let Some(&index) = self.by_url.get(&article.url) {
            let existing = &mut self.articles[index];
            existing.article = article.clone();
            existing.updated_at = now;
            debug!("Updated {} in {}", article.url, self.collection);
            ArticleStatus::Updated
        } else {
            self.by_url.insert(article.url.clone(), self.articles.len());
            self.articles.push(StoredArticle {
                article: article.clone(),
                collected_at: now,
                updated_at: now,
            });
            debug!("Inserted {} into {}", article.url, self.collection);
            ArticleStatus::New
        }
    }

    pub fn get(&self, url: &str) -> Option<StoredArticle> {
        self.by_url.get(url).map(|&index| self.articles[index].clone())
    }

    /// Matching documents, newest collection first. Later inserts win ties.
    fn matching<'a>(&'a self, filter: &'a ArticleFilter) -> Vec<&'a StoredArticle> {
        let mut docs: Vec<&StoredArticle> = self
            .articles
            .iter()
            .rev()
            .filter(|doc| filter.matches(doc))
            .collect();
        docs.sort_by(|a, b| b.collected_at.cmp(&a.collected_at));
        docs
    }

    pub fn find(&self, filter: &ArticleFilter) -> Vec<StoredArticle> {
        let limit = filter.limit.unwrap_or(usize::MAX);
        self.matching(filter).into_iter().take(limit).cloned().collect()
    }

    pub fn count(&self, filter: &ArticleFilter) -> usize {
        self.articles.iter().filter(|doc| filter.matches(doc)).count()
    }

    pub fn count_by(&self, field: GroupField, filter: &ArticleFilter) -> Vec<(String, usize)> {
        let mut groups: HashMap<String, usize> = HashMap::new();
        for doc in self.articles.iter().filter(|doc| filter.matches(doc)) {
            *groups.entry(field.key_of(&doc.article)).or_default() += 1;
        }
        let mut counts: Vec<(String, usize)> = groups.into_iter().collect();
        counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        counts
    }

    pub fn search(&self, query: &str, limit: usize) -> Vec<StoredArticle> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }
        let all = ArticleFilter::default();
        self.matching(&all)
            .into_iter()
            .filter(|doc| {
                let article = &doc.article;
                article.title.to_lowercase().contains(&needle)
                    || article.content.to_lowercase().contains(&needle)
                    || article
                        .summary
                        .as_deref()
                        .is_some_and(|s| s.to_lowercase().contains(&needle))
            })
            .take(limit)
            .cloned()
            .collect()
    }
}

pub struct InMemoryStorage {
    store: Arc<RwLock<MemoryStore>>,
    config: BackendConfig,
}

impl InMemoryStorage {
    pub fn new(config: BackendConfig) -> Self {
        let store = Arc::new(RwLock::new(MemoryStore::new(config.collection.clone())));
        Self { store, config }
    }

    pub fn collection(&self) -> &str {
        &self.config.collection
    }
}

impl std::fmt::Debug for InMemoryStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryStorage")
            .field("collection", &self.config.collection)
            .finish()
    }
}

#[async_trait]
impl StorageBackend for InMemoryStorage {
    fn get_error_message() -> &'static str {
        "Memory storage should be available"
    }

    async fn new(config: &BackendConfig) -> Result<Self> {
        Ok(InMemoryStorage::new(config.clone()))
    }
}

#[async_trait]
impl ArticleStorage for InMemoryStorage {
    async fn upsert_article(&self, article: &ProcessedArticle) -> Result<ArticleStatus> {
        let mut store = self.store.write().await;
        Ok(store.upsert(article))
    }

    async fn get_article(&self, url: &str) -> Result<Option<StoredArticle>> {
        Ok(self.store.read().await.get(url))
    }

    async fn find_articles(&self, filter: &ArticleFilter) -> Result<Vec<StoredArticle>> {
        Ok(self.store.read().await.find(filter))
    }

    async fn count_articles(&self, filter: &ArticleFilter) -> Result<usize> {
        Ok(self.store.read().await.count(filter))
    }

    async fn count_by(&self, field: GroupField, filter: &ArticleFilter) -> Result<Vec<(String, usize)>> {
        Ok(self.store.read().await.count_by(field, filter))
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<StoredArticle>> {
        Ok(self.store.read().await.search(query, limit))
    }
}
