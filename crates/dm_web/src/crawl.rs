use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use chrono::Utc;
use dm_collector::{CrawlPlan, CrawlTarget};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::error::ApiResult;
use crate::AppState;

async fn start(state: &AppState, plan: CrawlPlan) -> ApiResult<Json<Value>> {
    let collector = state.collector()?;
    let target = plan.target;
    // the handle is dropped; the outcome is read back through /crawl/status
    collector.start(plan).await?;
    info!("🦗 {:?} crawl started over HTTP", target);
    Ok(Json(json!({
        "success": true,
        "message": format!("Started {:?} crawl", target),
        "target": target,
        "started_at": Utc::now(),
    })))
}

/// POST /internal/crawl
pub async fn trigger(State(state): State<Arc<AppState>>, plan: Option<Json<CrawlPlan>>) -> ApiResult<Json<Value>> {
    start(&state, plan.map(|Json(plan)| plan).unwrap_or_default()).await
}

/// POST /crawl/all
pub async fn crawl_all(State(state): State<Arc<AppState>>) -> ApiResult<Json<Value>> {
    start(&state, CrawlPlan::new(CrawlTarget::All)).await
}

#[derive(Debug, Deserialize)]
pub struct GoogleNewsQuery {
    pub max_keywords: Option<usize>,
}

/// POST /crawl/google-news
pub async fn crawl_google_news(
    State(state): State<Arc<AppState>>,
    Query(query): Query<GoogleNewsQuery>,
) -> ApiResult<Json<Value>> {
    let plan = CrawlPlan {
        target: CrawlTarget::GoogleNews,
        max_keywords: query.max_keywords,
        ..Default::default()
    };
    start(&state, plan).await
}

#[derive(Debug, Default, Deserialize)]
pub struct DirectSourcesRequest {
    #[serde(default)]
    pub sources: Vec<String>,
}

/// POST /crawl/direct-sources
pub async fn crawl_direct_sources(
    State(state): State<Arc<AppState>>,
    request: Option<Json<DirectSourcesRequest>>,
) -> ApiResult<Json<Value>> {
    let plan = CrawlPlan {
        target: CrawlTarget::Direct,
        sources: request.map(|Json(r)| r.sources).unwrap_or_default(),
        ..Default::default()
    };
    start(&state, plan).await
}

/// GET /crawl/status
pub async fn status(State(state): State<Arc<AppState>>) -> ApiResult<Json<Value>> {
    let status = state.collector()?.status().await;
    Ok(Json(json!({ "success": true, "status": status })))
}
