use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{DisasterType, ProcessedArticle, Region, Severity};
use crate::Result;

pub const NEW_DISASTER_ARTICLE: &str = "new_disaster_article";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisasterEventData {
    pub title: String,
    pub source: String,
    pub url: String,
    pub disaster_type: DisasterType,
    pub severity: Severity,
    pub region: Option<Region>,
    pub confidence: f64,
    pub matched_keywords: BTreeSet<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub processed_at: DateTime<Utc>,
}

/// Fan-out message: `{"event": "new_disaster_article", "data": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BroadcastEvent {
    pub event: String,
    pub data: DisasterEventData,
}

impl BroadcastEvent {
    pub fn new_disaster(article: &ProcessedArticle) -> Self {
        Self {
            event: NEW_DISASTER_ARTICLE.to_string(),
            data: DisasterEventData {
                title: article.title.clone(),
                source: article.source.clone(),
                url: article.url.clone(),
                disaster_type: article.disaster_type,
                severity: article.severity,
                region: article.region,
                confidence: article.confidence,
                matched_keywords: article.matched_keywords.clone(),
                published_at: article.published_at,
                processed_at: article.processed_at,
            },
        }
    }
}

#[async_trait]
pub trait Broadcaster: Send + Sync {
    /// Publish an event; returns how many receivers it reached.
    /// Delivery is best effort, there is no acknowledgement.
    async fn publish(&self, event: &BroadcastEvent) -> Result<usize>;
}
