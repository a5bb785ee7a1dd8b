use std::sync::Arc;

pub mod hybrid;
pub mod lexicon;
pub mod models;
pub mod rule;

pub use hybrid::{ClassifierInfo, HybridClassifier};
pub use lexicon::{KeywordLexicon, LEXICON};
pub use models::{MlClassifier, MlConfig, MlInfo, MlPrediction};
pub use rule::{RuleAnalysis, RuleClassifier};

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub ml: MlConfig,
}

/// Build the production classifier: rules plus ML unless ML is disabled.
pub fn create_classifier(config: Config) -> HybridClassifier {
    let ml = config
        .ml
        .enabled
        .then(|| Arc::new(MlClassifier::new(config.ml)));
    HybridClassifier::new(ml)
}

pub mod prelude {
    pub use super::create_classifier;
    pub use super::Config;
    pub use dm_core::{ClassificationResult, Classify, Error, Result};
}
