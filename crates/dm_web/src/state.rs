use std::sync::Arc;

use dm_classifier::HybridClassifier;
use dm_collector::CollectorManager;
use dm_core::{Error, Result, StorageHandle};
use dm_pipeline::{ChannelBroadcaster, Pipeline};

/// Shared services behind every route.
pub struct AppState {
    pub classifier: Arc<HybridClassifier>,
    pub pipeline: Arc<Pipeline>,
    pub broadcaster: ChannelBroadcaster,
    /// Present when the server may run crawls itself.
    pub collector: Option<Arc<CollectorManager>>,
}

impl AppState {
    /// Wire a pipeline around the classifier, storage and broadcaster.
    pub fn new(classifier: Arc<HybridClassifier>, storage: StorageHandle, broadcaster: ChannelBroadcaster) -> Self {
        let pipeline = Arc::new(Pipeline::new(
            classifier.clone(),
            storage,
            Arc::new(broadcaster.clone()),
        ));
        Self {
            classifier,
            pipeline,
            broadcaster,
            collector: None,
        }
    }

    /// Attach a collector. It should be built over `self.pipeline` so crawled
    /// articles land in the same storage the routes read.
    pub fn with_collector(mut self, collector: Arc<CollectorManager>) -> Self {
        self.collector = Some(collector);
        self
    }

    pub fn collector(&self) -> Result<&Arc<CollectorManager>> {
        self.collector
            .as_ref()
            .ok_or_else(|| Error::Config("crawling is not enabled on this server".to_string()))
    }

    pub fn storage(&self) -> &StorageHandle {
        self.pipeline.storage()
    }
}
