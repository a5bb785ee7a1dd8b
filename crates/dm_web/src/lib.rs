use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

pub mod crawl;
pub mod error;
pub mod handlers;
pub mod realtime;
pub mod state;

pub use error::{ApiError, ApiResult, ErrorResponse};
pub use state::AppState;

pub async fn create_app(state: AppState) -> Router {
    let cors = CorsLayer::permissive();

    Router::new()
        .route("/internal/classify", post(handlers::classify))
        .route("/internal/test/classify", post(handlers::test_classify))
        .route("/internal/ingest", post(handlers::ingest))
        .route("/internal/ingest/batch", post(handlers::ingest_batch))
        .route("/internal/pipeline/stats", get(handlers::pipeline_stats))
        .route("/internal/pipeline/reset-stats", post(handlers::reset_stats))
        .route("/internal/classifier/info", get(handlers::classifier_info))
        .route("/api/articles", get(handlers::list_articles))
        .route("/api/articles/search", get(handlers::search_articles))
        .route("/api/articles/stats", get(handlers::article_stats))
        .route("/internal/crawl", post(crawl::trigger))
        .route("/crawl/all", post(crawl::crawl_all))
        .route("/crawl/google-news", post(crawl::crawl_google_news))
        .route("/crawl/direct-sources", post(crawl::crawl_direct_sources))
        .route("/crawl/status", get(crawl::status))
        .route("/realtime/ws/disasters", get(realtime::disaster_feed))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(Arc::new(state))
}

/// Bind and serve until the process is stopped.
pub async fn serve(state: AppState, addr: SocketAddr) -> dm_core::Result<()> {
    let app = create_app(state).await;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("🚀 Listening on http://{}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

pub mod prelude {
    pub use crate::{create_app, serve, AppState};
    pub use dm_core::{Error, ProcessedArticle, Result};
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use dm_classifier::HybridClassifier;
    use dm_collector::feeds::find_source;
    use dm_collector::{CollectorConfig, CollectorManager, Fetcher};
    use std::time::Duration;
    use dm_core::StorageHandle;
    use dm_pipeline::ChannelBroadcaster;
    use dm_storage::{create_storage, BackendConfig};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    const STORM_TITLE: &str = "Bão số 3 đổ bộ Quảng Ninh";
    const STORM: &str = "Bão số 3 đổ bộ vào Quảng Ninh với gió mạnh cấp 12, \
        làm 2 người chết và hàng trăm căn nhà bị tốc mái. Chính quyền đã sơ tán người dân.";
    const SPORTS_TITLE: &str = "Tuyển Việt Nam thắng giao hữu";
    const SPORTS: &str = "Đội tuyển Việt Nam giành chiến thắng thuyết phục trong trận \
        giao hữu tối qua trước sự cổ vũ nhiệt tình của khán giả.";

    async fn state() -> AppState {
        let storage = create_storage(&BackendConfig::default()).await.unwrap();
        AppState::new(
            Arc::new(HybridClassifier::rule_only()),
            StorageHandle::connected(storage),
            ChannelBroadcaster::default(),
        )
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_req(uri: &str) -> Request<Body> {
        Request::get(uri).body(Body::empty()).unwrap()
    }

    fn article(url: &str, title: &str, text: &str) -> Value {
        json!({ "url": url, "title": title, "text": text, "source": "https://vnexpress.net/thoi-su" })
    }

    #[tokio::test]
    async fn test_classify_route() {
        let app = create_app(state().await).await;
        let (status, body) = send(
            app,
            post_json("/internal/classify", json!({ "title": STORM_TITLE, "content": STORM })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["classification"]["is_disaster"], true);
    }

    #[tokio::test]
    async fn test_test_classify_counts_results() {
        let app = create_app(state().await).await;
        let payload = json!([
            { "title": STORM_TITLE, "content": STORM },
            { "title": SPORTS_TITLE, "content": SPORTS },
        ]);
        let (status, body) = send(app, post_json("/internal/test/classify", payload)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 2);
        assert_eq!(body["results"][1]["is_disaster"], false);
    }

    #[tokio::test]
    async fn test_ingest_and_list() {
        let state = state().await;
        let app = create_app(state).await;

        let (_, body) = send(
            app.clone(),
            post_json("/internal/ingest", article("https://vnexpress.net/bao-1", STORM_TITLE, STORM)),
        )
        .await;
        assert_eq!(body["success"], true);
        assert_eq!(body["result"]["is_disaster"], true);

        let (_, body) = send(app.clone(), post_json("/internal/ingest", json!({ "title": "x" }))).await;
        assert_eq!(body["success"], false);
        assert!(body["result"].is_null());

        let (status, body) = send(app.clone(), get_req("/api/articles?is_disaster=true&limit=10")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 1);
        assert_eq!(body["has_more"], false);
        assert_eq!(body["articles"][0]["url"], "https://vnexpress.net/bao-1");

        let (_, body) = send(app, get_req("/internal/pipeline/stats")).await;
        assert_eq!(body["stats"]["total_processed"], 1);
        assert_eq!(body["stats"]["failed_articles"], 1);
    }

    #[tokio::test]
    async fn test_batch_ingest_and_reset() {
        let app = create_app(state().await).await;
        let batch = json!({
            "articles": [
                article("https://vnexpress.net/bao-2", STORM_TITLE, STORM),
                article("https://vnexpress.net/bong-da", SPORTS_TITLE, SPORTS),
                { "url": "https://vnexpress.net/empty" },
            ],
            "source_type": "google_news",
        });
        let (status, body) = send(app.clone(), post_json("/internal/ingest/batch", batch)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Processed 2/3 articles");
        assert_eq!(body["stats"]["failed"], 1);
        assert_eq!(body["stats"]["disaster_articles"], 1);
        assert_eq!(body["source_type"], "google_news");

        let (_, body) = send(app.clone(), post_json("/internal/pipeline/reset-stats", json!({}))).await;
        assert_eq!(body["message"], "Pipeline stats reset");

        let (_, body) = send(app, get_req("/internal/pipeline/stats")).await;
        assert_eq!(body["stats"]["total_processed"], 0);
    }

    #[tokio::test]
    async fn test_pagination_and_stats() {
        let app = create_app(state().await).await;
        for i in 0..3 {
            let url = format!("https://vnexpress.net/bao-{}", i);
            send(app.clone(), post_json("/internal/ingest", article(&url, STORM_TITLE, STORM))).await;
        }
        send(
            app.clone(),
            post_json("/internal/ingest", article("https://vnexpress.net/bd", SPORTS_TITLE, SPORTS)),
        )
        .await;

        let (_, body) = send(app.clone(), get_req("/api/articles?limit=2&page=2")).await;
        assert_eq!(body["total"], 4);
        assert_eq!(body["articles"].as_array().unwrap().len(), 2);
        assert_eq!(body["has_more"], false);

        let (_, body) = send(app.clone(), get_req("/api/articles/search?q=giao")).await;
        assert_eq!(body["count"], 1);

        let (_, body) = send(app, get_req("/api/articles/stats")).await;
        assert_eq!(body["total"], 4);
        assert_eq!(body["disasters"], 3);
        assert_eq!(body["groups"]["by_source"]["VNExpress"], 3);
    }

    #[tokio::test]
    async fn test_page_past_the_end_is_empty() {
        let app = create_app(state().await).await;
        send(
            app.clone(),
            post_json("/internal/ingest", article("https://vnexpress.net/bao-9", STORM_TITLE, STORM)),
        )
        .await;

        let uri = format!("/api/articles?page={}&limit=50", u64::MAX);
        let (status, body) = send(app.clone(), get_req(&uri)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 1);
        assert!(body["articles"].as_array().unwrap().is_empty());
        assert_eq!(body["has_more"], false);

        let (_, body) = send(app, get_req("/api/articles?page=3&limit=1")).await;
        assert!(body["articles"].as_array().unwrap().is_empty());
    }

    /// Serves one VTV feed; every other url fails.
    struct FeedOnly;

    #[async_trait::async_trait]
    impl Fetcher for FeedOnly {
        async fn fetch(&self, url: &str) -> dm_core::Result<String> {
            let vtv = find_source("vtv").unwrap();
            if url == vtv.rss_urls[0] {
                Ok(VTV_FEED.to_string())
            } else {
                Err(dm_core::Error::Fetch(format!("{} unreachable", url)))
            }
        }
    }

    const VTV_FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0"><channel><title>Trong nước</title>
<item><title>Lũ quét kinh hoàng ở Yên Bái</title><link>https://vtv.vn/lu-quet.htm</link>
<description>Mưa lớn kéo dài gây lũ quét tại Mù Cang Chải, nhiều nhà bị cuốn trôi và 3 người mất tích</description></item>
</channel></rss>"#;

    async fn crawling_state() -> AppState {
        let state = state().await;
        let config = CollectorConfig {
            article_delay: Duration::ZERO,
            query_delay: Duration::ZERO,
            feed_delay: Duration::ZERO,
            ..Default::default()
        };
        let collector = CollectorManager::with_fetcher(config, Arc::new(FeedOnly), state.pipeline.clone());
        state.with_collector(Arc::new(collector))
    }

    async fn wait_for_crawl(app: &Router) -> Value {
        for _ in 0..200 {
            let (_, body) = send(app.clone(), get_req("/crawl/status")).await;
            if body["status"]["is_running"] == false {
                return body;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("crawl did not finish");
    }

    #[tokio::test]
    async fn test_crawl_lands_in_served_storage() {
        let app = create_app(crawling_state().await).await;

        let (status, body) = send(
            app.clone(),
            post_json("/internal/crawl", json!({ "target": "direct", "sources": ["vtv"] })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);

        let body = wait_for_crawl(&app).await;
        assert_eq!(body["status"]["runs"], 1);
        assert_eq!(body["status"]["last_result"]["total"]["processed"], 1);

        let (_, body) = send(app, get_req("/api/articles")).await;
        assert_eq!(body["total"], 1);
        assert_eq!(body["articles"][0]["url"], "https://vtv.vn/lu-quet.htm");
    }

    #[tokio::test]
    async fn test_crawl_rejects_unknown_source_and_missing_collector() {
        let app = create_app(crawling_state().await).await;
        let (status, _) = send(
            app.clone(),
            post_json("/crawl/direct-sources", json!({ "sources": ["cnn"] })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (_, body) = send(app, get_req("/crawl/status")).await;
        assert_eq!(body["status"]["runs"], 0);

        let app = create_app(state().await).await;
        let (status, body) = send(app, post_json("/crawl/all", json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_classifier_info() {
        let app = create_app(state().await).await;
        let (_, body) = send(app, get_req("/internal/classifier/info")).await;
        assert_eq!(body["info"]["rule_based"], true);
        assert_eq!(body["info"]["ml_available"], false);
    }

    #[tokio::test]
    async fn test_disconnected_storage_is_unavailable() {
        let state = AppState::new(
            Arc::new(HybridClassifier::rule_only()),
            StorageHandle::disconnected(),
            ChannelBroadcaster::default(),
        );
        let app = create_app(state).await;
        let (status, body) = send(app, get_req("/api/articles")).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["success"], false);
    }
}
