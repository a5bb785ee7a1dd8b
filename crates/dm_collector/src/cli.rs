use std::time::Duration;

use clap::{Args, Subcommand};
use dm_core::Result;

use crate::feeds::DIRECT_FEEDS;
use crate::manager::{CollectorConfig, CollectorManager, CrawlPlan, CrawlStats, CrawlTarget};

#[derive(Args, Debug, Clone)]
pub struct CrawlArgs {
    #[command(subcommand)]
    pub command: CrawlCommands,
}

#[derive(Subcommand, Debug, Clone)]
pub enum CrawlCommands {
    /// Crawl feeds and push what they find through the pipeline
    Run(RunArgs),
    /// List the direct feed catalogue
    List,
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    #[arg(long, value_enum, default_value_t = CrawlTarget::All)]
    pub target: CrawlTarget,

    /// Google News queries to run
    #[arg(long, default_value_t = 5)]
    pub max_keywords: usize,

    /// Direct outlets to crawl (e.g. vnexpress,vtv); all when omitted
    #[arg(long = "source", value_delimiter = ',')]
    pub sources: Vec<String>,

    /// Per-request timeout in seconds
    #[arg(long, env = "DM_FETCH_TIMEOUT", default_value_t = 20)]
    pub fetch_timeout: u64,

    /// Pause between article fetches in milliseconds
    #[arg(long, env = "DM_ARTICLE_DELAY_MS", default_value_t = 500)]
    pub article_delay_ms: u64,

    /// Repeat the crawl every N minutes until interrupted
    #[arg(long)]
    pub interval: Option<u64>,
}

impl RunArgs {
    pub fn config(&self) -> CollectorConfig {
        CollectorConfig {
            fetch_timeout: Duration::from_secs(self.fetch_timeout),
            article_delay: Duration::from_millis(self.article_delay_ms),
            max_keywords: self.max_keywords,
            sources: self.sources.clone(),
            ..Default::default()
        }
    }
}

/// One crawl pass for the chosen target.
pub async fn run_once(manager: &CollectorManager, target: CrawlTarget) -> CrawlStats {
    manager.crawl(&CrawlPlan::new(target)).await.total
}

pub fn print_stats(stats: &CrawlStats) {
    println!(
        "📊 fetched {} | prefiltered {} | extracted {} | fallbacks {} | processed {} | disasters {} | rejected {} | errors {}",
        stats.total_fetched,
        stats.prefiltered_out,
        stats.extracted,
        stats.fallbacks,
        stats.processed,
        stats.disasters,
        stats.rejected,
        stats.errors
    );
}

pub async fn handle_command(command: &CrawlCommands, manager: Option<&CollectorManager>) -> Result<()> {
    match command {
        CrawlCommands::List => {
            println!("Available sources:");
            for source in DIRECT_FEEDS {
                println!("  {:<14} {} ({} feeds)", source.key, source.name, source.rss_urls.len());
            }
        }
        CrawlCommands::Run(args) => {
            let manager = manager
                .ok_or_else(|| dm_core::Error::Config("crawl run needs a collector".to_string()))?;
            match args.interval {
                None => print_stats(&run_once(manager, args.target).await),
                Some(minutes) => {
                    let mut ticker = tokio::time::interval(Duration::from_secs(minutes.max(1) * 60));
                    loop {
                        tokio::select! {
                            _ = ticker.tick() => print_stats(&run_once(manager, args.target).await),
                            _ = tokio::signal::ctrl_c() => {
                                tracing::info!("🛑 Stopping periodic crawl");
                                break;
                            }
                        }
                    }
                }
            }
        }
    }
    Ok(())
}
