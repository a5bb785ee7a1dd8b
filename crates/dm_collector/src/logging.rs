use std::sync::Once;

use tracing_subscriber::EnvFilter;

static INIT: Once = Once::new();

/// Prefixes every line with the feed or query being worked on.
#[derive(Debug, Clone, Default)]
pub struct Logger {
    prefixes: Vec<String>,
}

impl Logger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_new_prefixes(mut self, prefix: String) -> Self {
        self.prefixes.clear();
        self.prefixes.push(prefix);
        self
    }

    pub fn with_prefix(mut self, prefix: String) -> Self {
        self.prefixes.push(prefix);
        self
    }

    fn prefix(&self) -> String {
        self.prefixes.iter().map(|p| format!("{} ", p)).collect()
    }

    pub fn info(&self, message: &str) {
        tracing::info!("{}{}", self.prefix(), message);
    }

    pub fn error(&self, message: &str) {
        tracing::error!("{}{}", self.prefix(), message);
    }

    pub fn warn(&self, message: &str) {
        tracing::warn!("{}{}", self.prefix(), message);
    }

    pub fn debug(&self, message: &str) {
        tracing::debug!("{}{}", self.prefix(), message);
    }
}

/// Install the global subscriber once. `filter` is an env-filter directive
/// such as `info` or `dm_collector=debug`.
pub fn init_logging(filter: &str, json: bool) -> Logger {
    if !tracing::dispatcher::has_been_set() {
        INIT.call_once(|| {
            let env_filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info"));
            let builder = tracing_subscriber::fmt().with_env_filter(env_filter);
            let installed = if json {
                builder.json().try_init()
            } else {
                builder.try_init()
            };
            if let Err(e) = installed {
                eprintln!("Logging already initialised: {}", e);
            }
        });
    }
    Logger::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefixes() {
        let logger = Logger::new()
            .with_prefix("[VTV]".to_string())
            .with_prefix("📰".to_string());
        assert_eq!(logger.prefix(), "[VTV] 📰 ");
        let logger = logger.with_new_prefixes("[google]".to_string());
        assert_eq!(logger.prefix(), "[google] ");
    }

    #[test]
    fn test_init_is_idempotent() {
        init_logging("debug", false).info("first");
        init_logging("not a directive ===", true).info("second");
    }
}
