use std::sync::Arc;
use std::time::Instant;

use dm_core::{
    BatchIngest, BatchSummary, BroadcastEvent, Broadcaster, ClassificationResult, Classify, Error,
    PipelineStats, ProcessedArticle, Result, StorageHandle,
};
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::normalizer::Normalizer;

/// Normalize, validate, classify, store and broadcast ingest payloads.
pub struct Pipeline {
    normalizer: Normalizer,
    classifier: Arc<dyn Classify>,
    storage: StorageHandle,
    broadcaster: Arc<dyn Broadcaster>,
    stats: Mutex<PipelineStats>,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("classifier", &self.classifier.name())
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    pub fn new(classifier: Arc<dyn Classify>, storage: StorageHandle, broadcaster: Arc<dyn Broadcaster>) -> Self {
        Self {
            normalizer: Normalizer::new(),
            classifier,
            storage,
            broadcaster,
            stats: Mutex::new(PipelineStats::default()),
        }
    }

    pub fn storage(&self) -> &StorageHandle {
        &self.storage
    }

    /// Run one payload through the pipeline. Any failure is logged, counted
    /// and reported as `None`.
    pub async fn process_article(&self, raw: &Value) -> Option<ProcessedArticle> {
        let started = Instant::now();
        match self.run(raw).await {
            Ok(processed) => {
                let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
                self.record_success(&processed, elapsed_ms).await;
                info!(
                    "Processed article: {} | disaster={} | confidence={:.2} | time={:.0}ms",
                    preview(&processed.title),
                    processed.is_disaster,
                    processed.confidence,
                    elapsed_ms
                );
                Some(processed)
            }
            Err(e) => {
                let url = raw.get("url").and_then(Value::as_str).unwrap_or("unknown");
                warn!("Pipeline failed for {}: {}", url, e);
                self.stats.lock().await.failed_articles += 1;
                None
            }
        }
    }

    async fn run(&self, raw: &Value) -> Result<ProcessedArticle> {
        let normalized = self.normalizer.normalize(raw)?;
        if !self.normalizer.validate(&normalized) {
            return Err(Error::Normalization(format!(
                "{} is too short (title {} chars, content {} chars)",
                normalized.url,
                normalized.title.chars().count(),
                normalized.content.chars().count()
            )));
        }

        let classification = self.classifier.classify(&normalized.title, &normalized.content);
        let processed = ProcessedArticle::new(normalized, classification);

        let storage = self.storage.get().await?;
        let status = storage
            .upsert_article(&processed)
            .await
            .map_err(|e| match e {
                Error::Storage(_) => e,
                other => Error::Storage(other.to_string()),
            })?;
        debug!("Stored {} ({:?})", processed.url, status);

        if processed.is_disaster {
            let event = BroadcastEvent::new_disaster(&processed);
            match self.broadcaster.publish(&event).await {
                Ok(reached) => debug!("Broadcast {} to {} subscribers", processed.url, reached),
                Err(e) => error!("Error broadcasting {}: {}", processed.url, e),
            }
        }

        Ok(processed)
    }

    async fn record_success(&self, processed: &ProcessedArticle, elapsed_ms: f64) {
        let mut stats = self.stats.lock().await;
        let n = stats.total_processed as f64;
        stats.avg_confidence = (stats.avg_confidence * n + processed.confidence) / (n + 1.0);
        stats.total_processed += 1;
        if processed.is_disaster {
            stats.disaster_articles += 1;
        } else {
            stats.non_disaster_articles += 1;
        }
        stats.processing_time_ms += elapsed_ms;
    }

    /// Sequential; successes come back in input order.
    pub async fn process_batch(&self, raws: &[Value]) -> Vec<ProcessedArticle> {
        let mut results = Vec::with_capacity(raws.len());
        for raw in raws {
            if let Some(processed) = self.process_article(raw).await {
                results.push(processed);
            }
        }
        info!("Batch processed: {}/{} successful", results.len(), raws.len());
        results
    }

    pub async fn ingest_batch(&self, batch: &BatchIngest) -> BatchSummary {
        debug!("Ingesting {} articles from {:?}", batch.articles.len(), batch.source_type);
        let results = self.process_batch(&batch.articles).await;
        let disaster_articles = results.iter().filter(|a| a.is_disaster).count();
        BatchSummary {
            total_input: batch.articles.len(),
            processed: results.len(),
            failed: batch.articles.len() - results.len(),
            disaster_articles,
            non_disaster: results.len() - disaster_articles,
        }
    }

    /// Classification only, nothing stored or counted.
    pub fn classify(&self, title: &str, content: &str) -> ClassificationResult {
        self.classifier.classify(title, content)
    }

    pub async fn get_stats(&self) -> PipelineStats {
        self.stats.lock().await.clone()
    }

    pub async fn reset_stats(&self) {
        *self.stats.lock().await = PipelineStats::default();
        info!("Pipeline stats reset");
    }
}

fn preview(title: &str) -> String {
    let mut short: String = title.chars().take(50).collect();
    if title.chars().count() > 50 {
        short.push_str("...");
    }
    short
}
