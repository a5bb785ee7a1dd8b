use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use chrono::{DateTime, Utc};
use dm_core::{
    ArticleFilter, BatchIngest, Classify, DisasterType, GroupField, ProcessedArticle, Region, Severity,
    StoredArticle,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

use crate::error::ApiResult;
use crate::AppState;

const DEFAULT_PAGE_SIZE: usize = 20;
const MAX_PAGE_SIZE: usize = 500;

#[derive(Debug, Deserialize)]
pub struct ClassifyRequest {
    pub title: String,
    #[serde(default)]
    pub content: String,
}

/// POST /internal/classify
pub async fn classify(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ClassifyRequest>,
) -> Json<Value> {
    let result = state.pipeline.classify(&request.title, &request.content);
    Json(json!({ "success": true, "classification": result }))
}

/// POST /internal/test/classify
///
/// Batch classification for lexicon tuning. Nothing is stored.
pub async fn test_classify(
    State(state): State<Arc<AppState>>,
    Json(requests): Json<Vec<ClassifyRequest>>,
) -> Json<Value> {
    let results: Vec<_> = requests
        .iter()
        .map(|r| state.classifier.classify(&r.title, &r.content))
        .collect();
    Json(json!({ "success": true, "count": results.len(), "results": results }))
}

#[derive(Debug, Serialize)]
struct IngestResult<'a> {
    url: &'a str,
    is_disaster: bool,
    disaster_type: DisasterType,
    severity: Severity,
    confidence: f64,
    region: Option<Region>,
    matched_keywords: &'a std::collections::BTreeSet<String>,
}

impl<'a> From<&'a ProcessedArticle> for IngestResult<'a> {
    fn from(article: &'a ProcessedArticle) -> Self {
        Self {
            url: &article.url,
            is_disaster: article.is_disaster,
            disaster_type: article.disaster_type,
            severity: article.severity,
            confidence: article.confidence,
            region: article.region,
            matched_keywords: &article.matched_keywords,
        }
    }
}

/// POST /internal/ingest
pub async fn ingest(State(state): State<Arc<AppState>>, Json(raw): Json<Value>) -> Json<Value> {
    match state.pipeline.process_article(&raw).await {
        Some(processed) => Json(json!({
            "success": true,
            "message": "Article processed successfully",
            "result": IngestResult::from(&processed),
        })),
        None => Json(json!({
            "success": false,
            "message": "Article could not be processed",
            "result": null,
        })),
    }
}

/// POST /internal/ingest/batch
pub async fn ingest_batch(
    State(state): State<Arc<AppState>>,
    Json(batch): Json<BatchIngest>,
) -> Json<Value> {
    let summary = state.pipeline.ingest_batch(&batch).await;
    info!(
        "📥 Batch ingest from {:?}: {}/{} processed",
        batch.source_type, summary.processed, summary.total_input
    );
    Json(json!({
        "success": true,
        "message": format!("Processed {}/{} articles", summary.processed, summary.total_input),
        "stats": summary,
        "source_type": batch.source_type,
        "timestamp": Utc::now(),
    }))
}

/// GET /internal/pipeline/stats
pub async fn pipeline_stats(State(state): State<Arc<AppState>>) -> Json<Value> {
    let stats = state.pipeline.get_stats().await;
    Json(json!({ "success": true, "stats": stats, "timestamp": Utc::now() }))
}

/// POST /internal/pipeline/reset-stats
pub async fn reset_stats(State(state): State<Arc<AppState>>) -> Json<Value> {
    state.pipeline.reset_stats().await;
    Json(json!({ "success": true, "message": "Pipeline stats reset", "timestamp": Utc::now() }))
}

/// GET /internal/classifier/info
pub async fn classifier_info(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({ "success": true, "info": state.classifier.info() }))
}

#[derive(Debug, Default, Deserialize)]
pub struct ArticleQuery {
    pub limit: Option<usize>,
    pub page: Option<usize>,
    pub source: Option<String>,
    pub severity: Option<Severity>,
    pub disaster_type: Option<DisasterType>,
    pub region: Option<Region>,
    pub is_disaster: Option<bool>,
    pub from_date: Option<DateTime<Utc>>,
    pub to_date: Option<DateTime<Utc>>,
}

impl ArticleQuery {
    fn filter(&self) -> ArticleFilter {
        ArticleFilter {
            source: self.source.clone(),
            severity: self.severity,
            disaster_type: self.disaster_type,
            region: self.region,
            is_disaster: self.is_disaster,
            published_after: self.from_date,
            published_before: self.to_date,
            ..Default::default()
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ArticlePage {
    pub articles: Vec<StoredArticle>,
    pub total: usize,
    pub page: usize,
    pub limit: usize,
    pub has_more: bool,
}

/// GET /api/articles
pub async fn list_articles(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ArticleQuery>,
) -> ApiResult<Json<ArticlePage>> {
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    let page = query.page.unwrap_or(1).max(1);
    let skip = (page - 1).saturating_mul(limit);

    let storage = state.storage().get().await?;
    let filter = query.filter();
    let total = storage.count_articles(&filter).await?;
    let articles: Vec<StoredArticle> = if skip >= total {
        Vec::new()
    } else {
        let window = ArticleFilter {
            limit: Some(skip.saturating_add(limit)),
            ..filter
        };
        storage.find_articles(&window).await?.into_iter().skip(skip).collect()
    };

    Ok(Json(ArticlePage {
        has_more: skip.saturating_add(articles.len()) < total,
        articles,
        total,
        page,
        limit,
    }))
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: String,
    pub limit: Option<usize>,
}

/// GET /api/articles/search
pub async fn search_articles(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Json<Value>> {
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    let storage = state.storage().get().await?;
    let articles = storage.search(&query.q, limit).await?;
    Ok(Json(json!({ "query": query.q, "count": articles.len(), "articles": articles })))
}

/// GET /api/articles/stats
pub async fn article_stats(State(state): State<Arc<AppState>>) -> ApiResult<Json<Value>> {
    let storage = state.storage().get().await?;
    let all = ArticleFilter::default();
    let disasters = ArticleFilter {
        is_disaster: Some(true),
        ..Default::default()
    };

    let mut groups = BTreeMap::new();
    for (name, field) in [
        ("by_severity", GroupField::Severity),
        ("by_type", GroupField::DisasterType),
        ("by_region", GroupField::Region),
        ("by_source", GroupField::Source),
    ] {
        let counts: BTreeMap<String, usize> = storage.count_by(field, &disasters).await?.into_iter().collect();
        groups.insert(name, counts);
    }

    Ok(Json(json!({
        "total": storage.count_articles(&all).await?,
        "disasters": storage.count_articles(&disasters).await?,
        "groups": groups,
    })))
}
