use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use dm_core::{Error, FeedKind, RawArticle, Result};
use dm_pipeline::Pipeline;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::sleep;

use crate::extract::{extract_article, ExtractedArticle};
use crate::feeds::{self, FeedSource, DIRECT_FEEDS, DISASTER_SEARCH_KEYWORDS};
use crate::fetch::{Fetcher, HttpFetcher, DEFAULT_TIMEOUT};
use crate::logging::Logger;
use crate::prefilter::PreFilter;

#[derive(Debug, Clone, PartialEq)]
pub struct CollectorConfig {
    pub fetch_timeout: Duration,
    /// Pause after each article page fetch.
    pub article_delay: Duration,
    /// Pause between Google News queries.
    pub query_delay: Duration,
    /// Pause between direct outlets.
    pub feed_delay: Duration,
    /// Queries used by a standalone Google News crawl.
    pub max_keywords: usize,
    /// Queries used by the Google News half of a full crawl.
    pub full_crawl_keywords: usize,
    /// Direct outlet keys; empty means the whole catalogue.
    pub sources: Vec<String>,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            fetch_timeout: DEFAULT_TIMEOUT,
            article_delay: Duration::from_millis(500),
            query_delay: Duration::from_secs(1),
            feed_delay: Duration::from_millis(500),
            max_keywords: 5,
            full_crawl_keywords: 10,
            sources: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlStats {
    /// Unique urls after dedup.
    pub total_fetched: usize,
    pub prefiltered_out: usize,
    /// Bodies taken from the article page.
    pub extracted: usize,
    /// Bodies taken from the feed summary.
    pub fallbacks: usize,
    pub errors: usize,
    /// Accepted by the pipeline.
    pub processed: usize,
    pub disasters: usize,
    /// Turned down by the pipeline (validation, storage).
    pub rejected: usize,
}

impl std::ops::Add for CrawlStats {
    type Output = CrawlStats;

    fn add(self, other: CrawlStats) -> CrawlStats {
        CrawlStats {
            total_fetched: self.total_fetched + other.total_fetched,
            prefiltered_out: self.prefiltered_out + other.prefiltered_out,
            extracted: self.extracted + other.extracted,
            fallbacks: self.fallbacks + other.fallbacks,
            errors: self.errors + other.errors,
            processed: self.processed + other.processed,
            disasters: self.disasters + other.disasters,
            rejected: self.rejected + other.rejected,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrawlReport {
    pub google_news: CrawlStats,
    pub direct_sources: CrawlStats,
    pub total: CrawlStats,
    pub duration_seconds: f64,
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum CrawlTarget {
    #[default]
    All,
    GoogleNews,
    Direct,
}

/// What one crawl pass covers. Unset fields fall back to the collector config.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CrawlPlan {
    #[serde(default)]
    pub target: CrawlTarget,
    pub max_keywords: Option<usize>,
    #[serde(default)]
    pub sources: Vec<String>,
}

impl CrawlPlan {
    pub fn new(target: CrawlTarget) -> Self {
        Self {
            target,
            ..Default::default()
        }
    }

    pub fn unknown_sources(&self) -> Vec<&str> {
        self.sources
            .iter()
            .filter(|key| feeds::find_source(key).is_none())
            .map(String::as_str)
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CrawlStatus {
    pub is_running: bool,
    pub runs: u64,
    pub last_run: Option<DateTime<Utc>>,
    pub last_result: Option<CrawlReport>,
}

/// Collapse repeated urls. The last entry seen wins but keeps the position of
/// the first.
pub fn dedup_by_url(raws: Vec<RawArticle>) -> Vec<RawArticle> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut unique: Vec<RawArticle> = Vec::with_capacity(raws.len());
    for raw in raws {
        match index.get(&raw.url) {
            Some(&at) => unique[at] = raw,
            None => {
                index.insert(raw.url.clone(), unique.len());
                unique.push(raw);
            }
        }
    }
    unique
}

/// Runs crawl passes and feeds what they find into the pipeline.
pub struct CollectorManager {
    config: CollectorConfig,
    fetcher: Arc<dyn Fetcher>,
    prefilter: PreFilter,
    pipeline: Arc<Pipeline>,
    logger: Logger,
    status: Mutex<CrawlStatus>,
}

impl CollectorManager {
    pub fn new(config: CollectorConfig, pipeline: Arc<Pipeline>) -> Result<Self> {
        let fetcher = Arc::new(HttpFetcher::new(config.fetch_timeout)?);
        Ok(Self::with_fetcher(config, fetcher, pipeline))
    }

    pub fn with_fetcher(config: CollectorConfig, fetcher: Arc<dyn Fetcher>, pipeline: Arc<Pipeline>) -> Self {
        Self {
            config,
            fetcher,
            prefilter: PreFilter::new(),
            pipeline,
            logger: Logger::new(),
            status: Mutex::new(CrawlStatus::default()),
        }
    }

    pub fn config(&self) -> &CollectorConfig {
        &self.config
    }

    pub async fn fetch_google_news(&self, keyword: &str) -> Result<Vec<RawArticle>> {
        let url = feeds::google_news_url(keyword)?;
        let body = self.fetcher.fetch(url.as_str()).await?;
        let articles = feeds::parse_feed(body.as_bytes(), FeedKind::GoogleNews, "", feeds::GOOGLE_NEWS_LIMIT)?;
        self.logger
            .clone()
            .with_prefix(format!("[google:{}]", keyword))
            .info(&format!("Fetched {} articles", articles.len()));
        Ok(articles)
    }

    /// Every feed of one outlet. A failing feed url is logged and skipped.
    pub async fn fetch_direct_feed(&self, source: &FeedSource) -> (Vec<RawArticle>, usize) {
        let logger = self.logger.clone().with_prefix(format!("[{}]", source.name));
        let mut articles = Vec::new();
        let mut errors = 0;
        for rss_url in source.rss_urls {
            let parsed = match self.fetcher.fetch(rss_url).await {
                Ok(body) => feeds::parse_feed(body.as_bytes(), FeedKind::DirectRss, source.domain, feeds::DIRECT_FEED_LIMIT),
                Err(e) => Err(e),
            };
            match parsed {
                Ok(mut entries) => articles.append(&mut entries),
                Err(e) => {
                    errors += 1;
                    logger.error(&format!("Error fetching RSS from {}: {}", rss_url, e));
                }
            }
        }
        logger.info(&format!("Fetched {} articles", articles.len()));
        (articles, errors)
    }

    /// Page extraction with the feed summary as the fallback body.
    pub async fn extract(&self, raw: &RawArticle) -> ExtractedArticle {
        match self.fetcher.fetch(&raw.url).await {
            Ok(html) => extract_article(&html, raw),
            Err(e) => {
                self.logger.warn(&format!("Failed to extract content from {}: {}", raw.url, e));
                ExtractedArticle::from_feed(raw)
            }
        }
    }

    pub async fn crawl_google_news(&self, max_keywords: usize) -> CrawlStats {
        let mut stats = CrawlStats::default();
        let mut raws = Vec::new();
        let keywords: Vec<&str> = DISASTER_SEARCH_KEYWORDS.iter().copied().take(max_keywords).collect();

        for (i, keyword) in keywords.iter().enumerate() {
            match self.fetch_google_news(keyword).await {
                Ok(mut found) => raws.append(&mut found),
                Err(e) => {
                    stats.errors += 1;
                    self.logger.error(&format!("Error fetching Google News RSS for '{}': {}", keyword, e));
                }
            }
            if i + 1 < keywords.len() {
                pause(self.config.query_delay).await;
            }
        }

        let unique = dedup_by_url(raws);
        stats.total_fetched = unique.len();
        tracing::info!("🔎 Total unique articles from Google News: {}", unique.len());
        self.process_candidates(unique, &mut stats).await;
        stats
    }

    /// Crawl the given outlet keys, or the whole catalogue when empty.
    /// Unknown keys are logged and skipped.
    pub async fn crawl_direct_sources(&self, keys: &[String]) -> CrawlStats {
        let mut stats = CrawlStats::default();
        let sources: Vec<&FeedSource> = if keys.is_empty() {
            DIRECT_FEEDS.iter().collect()
        } else {
            keys.iter()
                .filter_map(|key| {
                    let found = feeds::find_source(key);
                    if found.is_none() {
                        tracing::warn!("Unknown source: {}", key);
                    }
                    found
                })
                .collect()
        };

        let mut raws = Vec::new();
        for (i, source) in sources.iter().enumerate() {
            let (mut found, errors) = self.fetch_direct_feed(source).await;
            raws.append(&mut found);
            stats.errors += errors;
            if i + 1 < sources.len() {
                pause(self.config.feed_delay).await;
            }
        }

        let unique = dedup_by_url(raws);
        stats.total_fetched = unique.len();
        tracing::info!("📡 Total unique articles from direct sources: {}", unique.len());
        self.process_candidates(unique, &mut stats).await;
        stats
    }

    pub async fn crawl_all(&self) -> CrawlReport {
        self.crawl(&CrawlPlan::default()).await
    }

    /// Run one pass and return its report. Does not touch the crawl status.
    pub async fn crawl(&self, plan: &CrawlPlan) -> CrawlReport {
        tracing::info!("🌐 Starting {:?} crawl...", plan.target);
        let started = Instant::now();
        let sources = if plan.sources.is_empty() {
            &self.config.sources
        } else {
            &plan.sources
        };

        let (google_news, direct_sources) = match plan.target {
            CrawlTarget::All => {
                let keywords = plan.max_keywords.unwrap_or(self.config.full_crawl_keywords);
                let google_news = self.crawl_google_news(keywords).await;
                (google_news, self.crawl_direct_sources(sources).await)
            }
            CrawlTarget::GoogleNews => {
                let keywords = plan.max_keywords.unwrap_or(self.config.max_keywords);
                (self.crawl_google_news(keywords).await, CrawlStats::default())
            }
            CrawlTarget::Direct => (CrawlStats::default(), self.crawl_direct_sources(sources).await),
        };
        let total = google_news + direct_sources;

        let report = CrawlReport {
            google_news,
            direct_sources,
            total,
            duration_seconds: started.elapsed().as_secs_f64(),
            completed_at: Utc::now(),
        };
        tracing::info!(
            "✅ Crawl completed: {} fetched, {} processed, {} disasters, {} errors",
            total.total_fetched,
            total.processed,
            total.disasters,
            total.errors
        );
        report
    }

    pub async fn status(&self) -> CrawlStatus {
        self.status.lock().await.clone()
    }

    /// Claim the crawl slot and run `plan` in the background.
    ///
    /// Fails with [`Error::CrawlInProgress`] while another tracked pass runs and
    /// with [`Error::Config`] on unknown outlet keys. The outcome lands in
    /// [`CollectorManager::status`].
    pub async fn start(self: &Arc<Self>, plan: CrawlPlan) -> Result<JoinHandle<CrawlReport>> {
        let unknown = plan.unknown_sources();
        if !unknown.is_empty() {
            return Err(Error::Config(format!("Unknown sources: {}", unknown.join(", "))));
        }
        {
            let mut status = self.status.lock().await;
            if status.is_running {
                return Err(Error::CrawlInProgress);
            }
            status.is_running = true;
        }

        let manager = Arc::clone(self);
        Ok(tokio::spawn(async move {
            let report = manager.crawl(&plan).await;
            let mut status = manager.status.lock().await;
            status.is_running = false;
            status.runs += 1;
            status.last_run = Some(report.completed_at);
            status.last_result = Some(report.clone());
            report
        }))
    }

    /// Start a full crawl every `every`, skipping ticks while one is still running.
    pub fn spawn_periodic(self: &Arc<Self>, every: Duration) -> JoinHandle<()> {
        let manager = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                ticker.tick().await;
                match manager.start(CrawlPlan::default()).await {
                    Ok(handle) => {
                        if let Err(e) = handle.await {
                            tracing::error!("❌ Scheduled crawl aborted: {}", e);
                        }
                    }
                    Err(e) => tracing::warn!("Skipping scheduled crawl: {}", e),
                }
            }
        })
    }

    async fn process_candidates(&self, raws: Vec<RawArticle>, stats: &mut CrawlStats) {
        let mut fetched_any = false;
        for raw in raws {
            if !self.prefilter.is_candidate(&format!("{} {}", raw.title, raw.summary)) {
                stats.prefiltered_out += 1;
                continue;
            }

            if fetched_any {
                pause(self.config.article_delay).await;
            }
            fetched_any = true;

            let extracted = self.extract(&raw).await;
            if extracted.text.trim().is_empty() {
                stats.errors += 1;
                continue;
            }
            if extracted.from_feed {
                stats.fallbacks += 1;
            } else {
                stats.extracted += 1;
            }

            match self.pipeline.process_article(&extracted.to_ingest_payload()).await {
                Some(processed) => {
                    stats.processed += 1;
                    if processed.is_disaster {
                        stats.disasters += 1;
                    }
                }
                None => stats.rejected += 1,
            }
        }
    }
}

async fn pause(delay: Duration) {
    if !delay.is_zero() {
        sleep(delay).await;
    }
}
