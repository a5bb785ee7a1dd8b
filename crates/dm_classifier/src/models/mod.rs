use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::RwLock;

use dm_core::{Error, MlCategory, MlSummary, PredictionMethod, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

pub mod corpus;
pub mod fallback;
pub mod naive_bayes;

use fallback::KeywordFallback;
use naive_bayes::{NaiveBayesModel, CLASSIFIER_TYPE, VECTORIZER_TYPE};

pub const DEFAULT_MODEL_PATH: &str = "models/disaster_classifier.json";

#[derive(Debug, Clone, PartialEq)]
pub struct MlConfig {
    pub model_path: PathBuf,
    /// When false the classifier never trains and always uses the keyword fallback.
    pub enabled: bool,
}

impl Default for MlConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            enabled: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MlPrediction {
    pub category: MlCategory,
    pub category_vi: String,
    pub confidence: f64,
    pub is_disaster: bool,
    pub probabilities: BTreeMap<MlCategory, f64>,
    pub method: PredictionMethod,
}

impl MlPrediction {
    pub fn summary(&self) -> MlSummary {
        MlSummary {
            category: self.category,
            confidence: self.confidence,
            method: self.method,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MlInfo {
    pub ml_available: bool,
    pub is_trained: bool,
    pub model_path: String,
    pub categories: Vec<String>,
    pub training_samples: usize,
    pub vectorizer_type: Option<String>,
    pub classifier_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrainReport {
    pub total_samples: usize,
    pub is_trained: bool,
}

/// Statistical classifier with a keyword fallback.
///
/// Whether a trained model is present is decided at construction and only
/// changes through [`MlClassifier::retrain`].
pub struct MlClassifier {
    config: MlConfig,
    model: RwLock<Option<NaiveBayesModel>>,
    fallback: KeywordFallback,
}

impl fmt::Debug for MlClassifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MlClassifier")
            .field("model_path", &self.config.model_path)
            .field("available", &self.available())
            .finish()
    }
}

impl MlClassifier {
    pub fn new(config: MlConfig) -> Self {
        let model = if !ml_compiled() {
            warn!("ML support not compiled in, using keyword fallback");
            None
        } else if !config.enabled {
            info!("ML classification disabled by configuration");
            None
        } else {
            load_or_train(&config)
        };

        Self {
            config,
            model: RwLock::new(model),
            fallback: KeywordFallback,
        }
    }

    /// Whether predictions come from the trained model.
    pub fn available(&self) -> bool {
        self.model.read().map(|m| m.is_some()).unwrap_or(false)
    }

    pub fn predict(&self, text: &str) -> MlPrediction {
        let guard = match self.model.read() {
            Ok(guard) => guard,
            Err(e) => {
                error!("ML model lock poisoned: {}", e);
                return self.fallback.predict(text);
            }
        };
        let Some(model) = guard.as_ref() else {
            return self.fallback.predict(text);
        };

        let probabilities = model.predict_proba(text);
        let (category, confidence) = model.predict(text);
        debug!("ML predicted {} ({:.3})", category.as_str(), confidence);

        MlPrediction {
            category,
            category_vi: category.label_vi().to_string(),
            confidence,
            is_disaster: category.is_disaster(),
            probabilities,
            method: PredictionMethod::Ml,
        }
    }

    /// Retrain on the built-in corpus plus `additional` and replace the cached model.
    /// A failed retrain keeps the current model.
    pub fn retrain(&self, additional: Vec<(String, MlCategory)>) -> Result<RetrainReport> {
        if !ml_compiled() || !self.config.enabled {
            return Err(Error::Config("ML classification is not enabled".to_string()));
        }

        let mut samples = corpus::training_samples();
        samples.extend(additional);
        let total_samples = samples.len();

        let model = NaiveBayesModel::train(&samples)?;
        log_training_accuracy(&model, &samples);
        save_model(&model, &self.config);

        let mut guard = self
            .model
            .write()
            .map_err(|e| Error::Classification(format!("ML model lock poisoned: {e}")))?;
        *guard = Some(model);

        Ok(RetrainReport {
            total_samples,
            is_trained: true,
        })
    }

    pub fn info(&self) -> MlInfo {
        let training_samples = self
            .model
            .read()
            .ok()
            .and_then(|m| m.as_ref().map(|model| model.training_samples()))
            .unwrap_or(corpus::TRAINING_DATA.len());
        let trained = self.available();

        MlInfo {
            ml_available: ml_compiled() && self.config.enabled,
            is_trained: trained,
            model_path: self.config.model_path.display().to_string(),
            categories: MlCategory::ALL.iter().map(|c| c.as_str().to_string()).collect(),
            training_samples,
            vectorizer_type: trained.then(|| VECTORIZER_TYPE.to_string()),
            classifier_type: trained.then(|| CLASSIFIER_TYPE.to_string()),
        }
    }
}

fn ml_compiled() -> bool {
    cfg!(feature = "ml")
}

fn load_or_train(config: &MlConfig) -> Option<NaiveBayesModel> {
    if config.model_path.exists() {
        match NaiveBayesModel::load(&config.model_path) {
            Ok(model) => {
                info!("✅ Loaded ML model from {}", config.model_path.display());
                return Some(model);
            }
            Err(e) => warn!("Failed to load cached model, retraining: {}", e),
        }
    }

    info!("🎓 Training ML classification model...");
    let samples = corpus::training_samples();
    match NaiveBayesModel::train(&samples) {
        Ok(model) => {
            log_training_accuracy(&model, &samples);
            save_model(&model, config);
            Some(model)
        }
        Err(e) => {
            error!("Failed to train model, using keyword fallback: {}", e);
            None
        }
    }
}

fn log_training_accuracy(model: &NaiveBayesModel, samples: &[(String, MlCategory)]) {
    let correct = samples
        .iter()
        .filter(|(text, label)| model.predict(text).0 == *label)
        .count();
    info!(
        "✅ Model trained with {} samples, accuracy: {:.2}%",
        samples.len(),
        correct as f64 * 100.0 / samples.len().max(1) as f64
    );
}

fn save_model(model: &NaiveBayesModel, config: &MlConfig) {
    match model.save(&config.model_path) {
        Ok(()) => info!("💾 Model saved to {}", config.model_path.display()),
        Err(e) => error!("Failed to save model: {}", e),
    }
}
