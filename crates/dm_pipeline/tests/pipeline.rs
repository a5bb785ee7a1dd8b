mod common;

use std::sync::Arc;

use anyhow::Result;
use common::*;
use dm_classifier::RuleClassifier;
use dm_core::{ArticleFilter, BatchIngest, BatchSummary, SourceType, StorageHandle};
use dm_pipeline::{ChannelBroadcaster, Pipeline};
use serde_json::json;

/// Re-ingesting the same url updates the stored document instead of duplicating it
#[tokio::test]
async fn test_upsert_is_idempotent() -> Result<()> {
    let (pipeline, _broadcaster) = memory_pipeline().await;

    let first = pipeline.process_article(&storm("https://vnexpress.net/bao-so-3")).await;
    assert!(first.is_some());
    let second = pipeline.process_article(&storm("https://vnexpress.net/bao-so-3")).await;
    assert!(second.is_some());

    let storage = pipeline.storage().get().await?;
    assert_eq!(storage.count_articles(&ArticleFilter::default()).await?, 1);
    let stored = storage
        .get_article("https://vnexpress.net/bao-so-3")
        .await?
        .expect("stored article");
    assert_eq!(stored.article.source, "VNExpress");
    assert!(stored.article.is_disaster);
    assert!(stored.updated_at >= stored.collected_at);

    assert_eq!(pipeline.get_stats().await.total_processed, 2);
    Ok(())
}

#[tokio::test]
async fn test_batch_with_failures() -> Result<()> {
    let (pipeline, _broadcaster) = memory_pipeline().await;
    let batch = BatchIngest {
        articles: vec![
            storm("https://vnexpress.net/1"),
            json!({"title": "Không có đường dẫn nhưng có tiêu đề", "content": STORM_CONTENT}),
            sports("https://tuoitre.vn/2"),
            json!({"url": "https://dantri.com.vn/3", "title": "Ngắn", "content": "Ngắn"}),
            storm("https://vtv.vn/4"),
        ],
        source_type: SourceType::Rss,
    };

    let summary = pipeline.ingest_batch(&batch).await;
    assert_eq!(
        summary,
        BatchSummary {
            total_input: 5,
            processed: 3,
            failed: 2,
            disaster_articles: 2,
            non_disaster: 1,
        }
    );

    let stats = pipeline.get_stats().await;
    assert_eq!(stats.total_processed, 3);
    assert_eq!(stats.failed_articles, 2);
    assert_eq!(stats.disaster_articles, 2);
    assert_eq!(stats.non_disaster_articles, 1);
    Ok(())
}

#[tokio::test]
async fn test_batch_with_blank_bodies() -> Result<()> {
    let blank_bodies = vec![
        storm("https://vnexpress.net/1"),
        json!({
            "url": "https://dantri.com.vn/trong",
            "title": "Bản tin thời tiết đêm nay trên cả nước",
            "text": "   ",
            "content": "",
            "description": "\n\t",
        }),
        sports("https://tuoitre.vn/2"),
        json!({
            "url": "https://vtv.vn/khoang-trang",
            "title": "Cảnh báo mưa lớn tại các tỉnh miền Trung",
            "content": " \u{a0} ",
            "description": "  ",
        }),
        storm("https://vtv.vn/3"),
    ];
    let batch = BatchIngest {
        articles: blank_bodies.clone(),
        source_type: SourceType::Rss,
    };

    let (pipeline, _broadcaster) = memory_pipeline().await;
    let summary = pipeline.ingest_batch(&batch).await;
    assert_eq!(summary.total_input, 5);
    assert_eq!(summary.processed, 3);
    assert_eq!(summary.failed, 2);

    let storage = pipeline.storage().get().await?;
    assert_eq!(storage.count_articles(&ArticleFilter::default()).await?, 3);
    for url in ["https://vnexpress.net/1", "https://tuoitre.vn/2", "https://vtv.vn/3"] {
        assert!(storage.get_article(url).await?.is_some(), "{url} not stored");
    }
    assert!(storage.get_article("https://dantri.com.vn/trong").await?.is_none());
    assert!(storage.get_article("https://vtv.vn/khoang-trang").await?.is_none());

    let (pipeline, _broadcaster) = memory_pipeline().await;
    let processed = pipeline.process_batch(&blank_bodies).await;
    let urls: Vec<&str> = processed.iter().map(|a| a.url.as_str()).collect();
    assert_eq!(urls, vec!["https://vnexpress.net/1", "https://tuoitre.vn/2", "https://vtv.vn/3"]);
    Ok(())
}

#[tokio::test]
async fn test_process_batch_keeps_order() -> Result<()> {
    let (pipeline, _broadcaster) = memory_pipeline().await;
    let raws = vec![
        sports("https://tuoitre.vn/a"),
        json!("not an object"),
        storm("https://vnexpress.net/b"),
    ];
    let processed = pipeline.process_batch(&raws).await;
    let urls: Vec<&str> = processed.iter().map(|a| a.url.as_str()).collect();
    assert_eq!(urls, vec!["https://tuoitre.vn/a", "https://vnexpress.net/b"]);
    Ok(())
}

#[tokio::test]
async fn test_disconnected_storage_fails_every_article() -> Result<()> {
    let pipeline = Pipeline::new(
        Arc::new(RuleClassifier::new()),
        StorageHandle::disconnected(),
        Arc::new(ChannelBroadcaster::default()),
    );
    let batch = BatchIngest {
        articles: vec![storm("https://vnexpress.net/1"), sports("https://tuoitre.vn/2")],
        source_type: SourceType::Manual,
    };
    let summary = pipeline.ingest_batch(&batch).await;
    assert_eq!(summary.processed, 0);
    assert_eq!(summary.failed, 2);

    // attaching a backend later makes the same pipeline usable
    let storage = dm_storage::create_storage(&Default::default()).await?;
    pipeline.storage().connect(storage).await;
    assert!(pipeline.process_article(&storm("https://vnexpress.net/1")).await.is_some());
    Ok(())
}

/// Subscribers only hear about disaster articles
#[tokio::test]
async fn test_broadcast_only_for_disasters() -> Result<()> {
    let (pipeline, broadcaster) = memory_pipeline().await;
    let mut receiver = broadcaster.subscribe();

    pipeline.process_article(&sports("https://tuoitre.vn/a")).await;
    pipeline.process_article(&storm("https://vnexpress.net/b")).await;

    let event = receiver.recv().await?;
    assert_eq!(event.event, "new_disaster_article");
    assert_eq!(event.data.url, "https://vnexpress.net/b");
    assert!(receiver.try_recv().is_err());
    Ok(())
}

#[tokio::test]
async fn test_classify_does_not_touch_stats() -> Result<()> {
    let (pipeline, _broadcaster) = memory_pipeline().await;
    let result = pipeline.classify("Bão số 3 đổ bộ Quảng Ninh", STORM_CONTENT);
    assert!(result.is_disaster);
    assert_eq!(pipeline.get_stats().await, Default::default());

    let storage = pipeline.storage().get().await?;
    assert_eq!(storage.count_articles(&ArticleFilter::default()).await?, 0);
    Ok(())
}
