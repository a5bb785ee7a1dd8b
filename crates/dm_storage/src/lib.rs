use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use dm_core::{ArticleStorage, Error, Result};

pub mod backends;

pub use backends::*;

#[async_trait]
pub trait StorageBackend: ArticleStorage {
    fn get_error_message() -> &'static str
    where
        Self: Sized;
    async fn new(config: &BackendConfig) -> Result<Self>
    where
        Self: Sized;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum BackendKind {
    #[default]
    Memory,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Memory => f.write_str("memory"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BackendConfig {
    pub kind: BackendKind,
    pub collection: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            kind: BackendKind::Memory,
            collection: "articles".to_string(),
        }
    }
}

/// Open the configured backend.
pub async fn create_storage(config: &BackendConfig) -> Result<Arc<dyn ArticleStorage>> {
    match config.kind {
        BackendKind::Memory => {
            let storage = <InMemoryStorage as StorageBackend>::new(config)
                .await
                .map_err(|e| Error::Storage(format!("{}: {}", InMemoryStorage::get_error_message(), e)))?;
            tracing::info!("🗄️ Using {} storage, collection {}", config.kind, config.collection);
            Ok(Arc::new(storage))
        }
    }
}

pub mod prelude {
    pub use super::backends::*;
    pub use super::{create_storage, BackendConfig, BackendKind, StorageBackend};
}
