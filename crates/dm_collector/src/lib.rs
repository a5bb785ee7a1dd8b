pub mod cli;
pub mod extract;
pub mod feeds;
pub mod fetch;
pub mod jsonld;
pub mod logging;
pub mod manager;
pub mod prefilter;

pub use cli::{handle_command, CrawlArgs, CrawlCommands};
pub use extract::ExtractedArticle;
pub use fetch::{Fetcher, HttpFetcher};
pub use manager::{CollectorConfig, CollectorManager, CrawlPlan, CrawlReport, CrawlStats, CrawlStatus, CrawlTarget};
pub use prefilter::PreFilter;

pub mod prelude {
    pub use super::fetch::Fetcher;
    pub use super::manager::{CollectorConfig, CollectorManager, CrawlPlan, CrawlStats, CrawlTarget};
    pub use dm_core::{Error, RawArticle, Result};
}
