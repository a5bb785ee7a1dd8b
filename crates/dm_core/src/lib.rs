pub mod broadcast;
pub mod error;
pub mod models;
pub mod storage;
pub mod types;

pub use broadcast::{BroadcastEvent, Broadcaster};
pub use error::Error;
pub use models::Classify;
pub use storage::{ArticleFilter, ArticleStorage, GroupField, StorageHandle};
pub use types::*;

pub type Result<T> = std::result::Result<T, Error>;
