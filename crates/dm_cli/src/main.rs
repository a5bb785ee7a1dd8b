use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use dm_classifier::{create_classifier, Config as ClassifierConfig, MlConfig};
use dm_collector::logging::init_logging;
use dm_collector::{handle_command, CollectorConfig, CollectorManager, CrawlArgs, CrawlCommands};
use dm_core::{ArticleFilter, ArticleStorage, BatchIngest, StorageHandle};
use dm_pipeline::ChannelBroadcaster;
use dm_storage::{BackendConfig, BackendKind};
use dm_web::AppState;
use serde_json::Value;
use tracing::info;

async fn check_storage(storage: &Arc<dyn ArticleStorage>, kind: BackendKind) -> dm_core::Result<()> {
    let existing = storage.count_articles(&ArticleFilter::default()).await?;
    info!("🏦 Storage backend ready (using {}, {} articles)", kind, existing);
    Ok(())
}

async fn check_storage_with_retry(
    storage: &Arc<dyn ArticleStorage>,
    kind: BackendKind,
    max_retries: u32,
    timeout: Duration,
) -> dm_core::Result<()> {
    let mut retries = 0;
    let mut last_error = None;

    while retries < max_retries {
        match tokio::time::timeout(timeout, check_storage(storage, kind)).await {
            Ok(Ok(())) => return Ok(()),
            Ok(Err(e)) => last_error = Some(e),
            Err(elapsed) => {
                last_error = Some(dm_core::Error::Storage(format!("Storage health check timed out: {}", elapsed)))
            }
        }
        retries += 1;
        if retries < max_retries {
            info!("Storage health check failed, retrying {}/{}...", retries, max_retries);
            tokio::time::sleep(Duration::from_secs(2)).await;
        }
    }

    Err(last_error.unwrap_or_else(|| dm_core::Error::Storage("Storage health check failed after all retries".to_string())))
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Vietnamese disaster news pipeline", long_about = None)]
pub struct Cli {
    /// Log filter, e.g. info or dm_collector=debug
    #[arg(long, global = true, env = "DM_LOG", default_value = "info")]
    log_level: String,
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,
    #[arg(long, global = true, value_enum, env = "DM_STORAGE", default_value_t = BackendKind::Memory)]
    storage: BackendKind,
    /// Where the trained model is cached
    #[arg(long, global = true, env = "DM_MODEL_PATH")]
    model_path: Option<PathBuf>,
    /// Classify with rules only
    #[arg(long, global = true, env = "DM_DISABLE_ML")]
    disable_ml: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Run the HTTP API and realtime feed
    Serve {
        #[arg(long, env = "DM_BIND", default_value = "127.0.0.1:8000")]
        bind: SocketAddr,
        /// Minutes between background full crawls; crawling stays on-demand when unset
        #[arg(long, env = "DM_CRAWL_INTERVAL", value_parser = clap::value_parser!(u64).range(1..))]
        crawl_interval: Option<u64>,
    },
    /// Crawl news feeds
    Crawl(CrawlArgs),
    /// Classify a single headline and body
    Classify {
        title: String,
        #[arg(default_value = "")]
        content: String,
    },
    /// Run a JSON file of articles through the pipeline
    Ingest {
        /// An array of raw articles or an object with an `articles` field
        file: PathBuf,
    },
}

impl Cli {
    fn classifier_config(&self) -> ClassifierConfig {
        let mut ml = MlConfig {
            enabled: !self.disable_ml,
            ..Default::default()
        };
        if let Some(path) = &self.model_path {
            ml.model_path = path.clone();
        }
        ClassifierConfig { ml }
    }
}

fn read_batch(file: &PathBuf) -> anyhow::Result<BatchIngest> {
    let raw = std::fs::read_to_string(file).with_context(|| format!("reading {}", file.display()))?;
    let value: Value = serde_json::from_str(&raw).with_context(|| format!("parsing {}", file.display()))?;
    let batch = match value {
        Value::Array(articles) => BatchIngest {
            articles,
            source_type: Default::default(),
        },
        other => serde_json::from_value(other).context("expected an array or an object with `articles`")?,
    };
    Ok(batch)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let logger = init_logging(&cli.log_level, cli.log_json);

    let backend = BackendConfig {
        kind: cli.storage,
        ..Default::default()
    };
    let storage = dm_storage::create_storage(&backend).await?;
    info!("💾 Checking storage connection...");
    check_storage_with_retry(&storage, cli.storage, 3, Duration::from_secs(10)).await?;

    let classifier = Arc::new(create_classifier(cli.classifier_config()));
    info!(
        "🧠 Classifier ready ({})",
        if classifier.ml().is_some() { "rules + ml" } else { "rules only" }
    );

    let state = AppState::new(classifier, StorageHandle::connected(storage), ChannelBroadcaster::default());

    match cli.command {
        Commands::Serve { bind, crawl_interval } => {
            let collector = Arc::new(CollectorManager::new(CollectorConfig::default(), state.pipeline.clone())?);
            if let Some(minutes) = crawl_interval {
                info!("⏰ Crawling every {} minutes", minutes);
                collector.spawn_periodic(Duration::from_secs(minutes * 60));
            }
            dm_web::serve(state.with_collector(collector), bind).await?;
        }
        Commands::Crawl(args) => match &args.command {
            CrawlCommands::Run(run) => {
                let manager = CollectorManager::new(run.config(), state.pipeline.clone())?;
                logger.info(&format!("🦗 Crawling {:?}", run.target));
                handle_command(&args.command, Some(&manager)).await?;
            }
            CrawlCommands::List => handle_command(&args.command, None).await?,
        },
        Commands::Classify { title, content } => {
            let result = state.pipeline.classify(&title, &content);
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Commands::Ingest { file } => {
            let batch = read_batch(&file)?;
            let summary = state.pipeline.ingest_batch(&batch).await;
            println!("{}", serde_json::to_string_pretty(&summary)?);
            println!("{}", serde_json::to_string_pretty(&state.pipeline.get_stats().await)?);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_flags() {
        let cli = Cli::parse_from(["dm", "classify", "Bão số 3", "--disable-ml", "--model-path", "/tmp/m.json"]);
        let config = cli.classifier_config();
        assert!(!config.ml.enabled);
        assert_eq!(config.ml.model_path, PathBuf::from("/tmp/m.json"));
        assert!(matches!(cli.command, Commands::Classify { ref content, .. } if content.is_empty()));
    }

    #[test]
    fn test_serve_crawl_interval() {
        let cli = Cli::parse_from(["dm", "serve", "--crawl-interval", "30"]);
        assert!(matches!(cli.command, Commands::Serve { crawl_interval: Some(30), .. }));

        let cli = Cli::parse_from(["dm", "serve"]);
        assert!(matches!(cli.command, Commands::Serve { crawl_interval: None, .. }));

        assert!(Cli::try_parse_from(["dm", "serve", "--crawl-interval", "0"]).is_err());
    }

    #[test]
    fn test_read_batch_accepts_bare_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("batch.json");
        std::fs::write(&path, r#"[{"url": "https://vtv.vn/a"}, {"url": "https://vtv.vn/b"}]"#).unwrap();
        assert_eq!(read_batch(&path).unwrap().articles.len(), 2);

        std::fs::write(&path, r#"{"articles": [{"url": "https://vtv.vn/a"}], "source_type": "manual"}"#).unwrap();
        let batch = read_batch(&path).unwrap();
        assert_eq!(batch.articles.len(), 1);
        assert_eq!(batch.source_type, dm_core::SourceType::Manual);
    }
}
