//! TF-IDF vectorizer feeding a multinomial naive Bayes classifier.
//!
//! Both halves are plain data so the fitted model can be cached as JSON and
//! validated on reload.
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use dm_core::{Error, MlCategory, Result};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

pub const VECTORIZER_TYPE: &str = "TfidfVectorizer";
pub const CLASSIFIER_TYPE: &str = "MultinomialNB";

const MAX_DF: f64 = 0.9;
const MAX_FEATURES: usize = 5000;
const ALPHA: f64 = 0.1;

lazy_static! {
    static ref TOKEN: Regex = Regex::new(r"\b\w\w+\b").expect("static token pattern");
}

/// Lower-cased word tokens plus adjacent bigrams.
pub fn ngrams(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    let tokens: Vec<&str> = TOKEN.find_iter(&lowered).map(|m| m.as_str()).collect();
    let mut grams: Vec<String> = tokens.iter().map(|t| t.to_string()).collect();
    grams.extend(tokens.windows(2).map(|pair| format!("{} {}", pair[0], pair[1])));
    grams
}

fn ensure(condition: bool, message: &str) -> Result<()> {
    if condition {
        Ok(())
    } else {
        Err(Error::Classification(message.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TfidfVectorizer {
    /// term -> column, columns follow sorted term order
    vocabulary: BTreeMap<String, usize>,
    idf: Vec<f64>,
}

impl TfidfVectorizer {
    pub fn fit(docs: &[Vec<String>]) -> Result<Self> {
        ensure(!docs.is_empty(), "cannot fit vectorizer on an empty corpus")?;
        let n_docs = docs.len() as f64;

        let mut df: HashMap<&str, usize> = HashMap::new();
        let mut total: HashMap<&str, usize> = HashMap::new();
        for doc in docs {
            let mut seen = std::collections::HashSet::new();
            for gram in doc {
                *total.entry(gram.as_str()).or_default() += 1;
                if seen.insert(gram.as_str()) {
                    *df.entry(gram.as_str()).or_default() += 1;
                }
            }
        }

        let max_doc_count = MAX_DF * n_docs;
        let mut kept: Vec<(&str, usize)> = df
            .iter()
            .filter(|(_, &count)| count as f64 <= max_doc_count)
            .map(|(term, &count)| (*term, count))
            .collect();

        if kept.len() > MAX_FEATURES {
            kept.sort_by(|a, b| total[b.0].cmp(&total[a.0]).then_with(|| a.0.cmp(b.0)));
            kept.truncate(MAX_FEATURES);
        }
        ensure(!kept.is_empty(), "empty vocabulary after pruning")?;
        kept.sort_by(|a, b| a.0.cmp(b.0));

        let vocabulary = kept
            .iter()
            .enumerate()
            .map(|(column, (term, _))| (term.to_string(), column))
            .collect();
        let idf = kept
            .iter()
            .map(|(_, count)| ((1.0 + n_docs) / (1.0 + *count as f64)).ln() + 1.0)
            .collect();

        Ok(Self { vocabulary, idf })
    }

    pub fn dim(&self) -> usize {
        self.idf.len()
    }

    /// Sublinear tf times idf, L2-normalized.
    pub fn transform(&self, grams: &[String]) -> Vec<f64> {
        let mut row = vec![0.0f64; self.dim()];
        for gram in grams {
            if let Some(&column) = self.vocabulary.get(gram) {
                row[column] += 1.0;
            }
        }
        for (column, value) in row.iter_mut().enumerate() {
            if *value > 0.0 {
                *value = (1.0 + value.ln()) * self.idf[column];
            }
        }
        let norm = row.iter().map(|v| v * v).sum::<f64>().sqrt();
        if norm > 0.0 {
            row.iter_mut().for_each(|v| *v /= norm);
        }
        row
    }

    fn validate(&self) -> Result<()> {
        ensure(!self.idf.is_empty(), "vectorizer has no features")?;
        ensure(self.vocabulary.len() == self.idf.len(), "vocabulary and idf length mismatch")?;
        ensure(
            self.vocabulary.values().all(|&column| column < self.idf.len()),
            "vocabulary column out of range",
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NaiveBayesModel {
    vectorizer: TfidfVectorizer,
    classes: Vec<MlCategory>,
    class_log_prior: Vec<f64>,
    feature_log_prob: Vec<Vec<f64>>,
    training_samples: usize,
}

impl NaiveBayesModel {
    pub fn train(samples: &[(String, MlCategory)]) -> Result<Self> {
        let docs: Vec<Vec<String>> = samples.iter().map(|(text, _)| ngrams(text)).collect();
        let vectorizer = TfidfVectorizer::fit(&docs)?;

        let mut classes: Vec<MlCategory> = samples.iter().map(|(_, label)| *label).collect();
        classes.sort();
        classes.dedup();
        ensure(classes.len() >= 2, "need at least two classes to train")?;

        let dim = vectorizer.dim();
        let mut feature_count = vec![vec![0.0; dim]; classes.len()];
        let mut class_count = vec![0usize; classes.len()];

        for (doc, (_, label)) in docs.iter().zip(samples) {
            // classes is sorted and deduplicated, the label is always present
            let Ok(class) = classes.binary_search(label) else {
                continue;
            };
            class_count[class] += 1;
            for (column, value) in vectorizer.transform(doc).into_iter().enumerate() {
                feature_count[class][column] += value;
            }
        }

        let n = samples.len() as f64;
        let class_log_prior = class_count.iter().map(|&c| (c as f64 / n).ln()).collect();
        let feature_log_prob = feature_count
            .iter()
            .map(|counts| {
                let denom = counts.iter().sum::<f64>() + ALPHA * dim as f64;
                counts.iter().map(|c| ((c + ALPHA) / denom).ln()).collect()
            })
            .collect();

        Ok(Self {
            vectorizer,
            classes,
            class_log_prior,
            feature_log_prob,
            training_samples: samples.len(),
        })
    }

    pub fn training_samples(&self) -> usize {
        self.training_samples
    }

    /// Posterior per class, summing to one.
    pub fn predict_proba(&self, text: &str) -> BTreeMap<MlCategory, f64> {
        let row = self.vectorizer.transform(&ngrams(text));
        let joint: Vec<f64> = self
            .class_log_prior
            .iter()
            .zip(&self.feature_log_prob)
            .map(|(prior, log_probs)| {
                prior + row.iter().zip(log_probs).map(|(x, lp)| x * lp).sum::<f64>()
            })
            .collect();

        let max = joint.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let exp: Vec<f64> = joint.iter().map(|j| (j - max).exp()).collect();
        let sum: f64 = exp.iter().sum();

        self.classes
            .iter()
            .zip(exp)
            .map(|(class, e)| (*class, e / sum))
            .collect()
    }

    /// Most probable class and its probability.
    pub fn predict(&self, text: &str) -> (MlCategory, f64) {
        self.predict_proba(text)
            .into_iter()
            .fold((MlCategory::NonDisaster, f64::NEG_INFINITY), |best, (class, p)| {
                if p > best.1 {
                    (class, p)
                } else {
                    best
                }
            })
    }

    pub fn validate(&self) -> Result<()> {
        self.vectorizer.validate()?;
        let k = self.classes.len();
        ensure(k >= 2, "model has fewer than two classes")?;
        ensure(self.class_log_prior.len() == k, "class prior length mismatch")?;
        ensure(self.feature_log_prob.len() == k, "feature matrix row count mismatch")?;
        ensure(
            self.feature_log_prob
                .iter()
                .all(|row| row.len() == self.vectorizer.dim()),
            "feature matrix row length mismatch",
        )?;
        ensure(
            self.feature_log_prob
                .iter()
                .flatten()
                .chain(&self.class_log_prior)
                .all(|v| v.is_finite()),
            "non-finite model weight",
        )
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        fs::write(path, serde_json::to_vec(self)?)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let bytes = fs::read(path)?;
        let model: Self = serde_json::from_slice(&bytes)?;
        model.validate()?;
        Ok(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::corpus::training_samples;

    #[test]
    fn test_ngrams() {
        let grams = ngrams("Bão số 9 đổ bộ");
        assert_eq!(grams[0], "bão");
        // single characters are dropped
        assert!(!grams.contains(&"9".to_string()));
        assert!(grams.contains(&"đổ bộ".to_string()));
    }

    #[test]
    fn test_transform_is_unit_length() {
        let docs = vec![ngrams("mưa lớn gây ngập"), ngrams("giá vàng tăng mạnh")];
        let vectorizer = TfidfVectorizer::fit(&docs).unwrap();
        let row = vectorizer.transform(&ngrams("mưa lớn gây ngập sâu"));
        let norm: f64 = row.iter().map(|v| v * v).sum::<f64>().sqrt();
        assert!((norm - 1.0).abs() < 1e-9);

        let empty = vectorizer.transform(&ngrams("xyz"));
        assert!(empty.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_transform_uses_sublinear_tf() {
        let docs = vec![ngrams("lũ lụt"), ngrams("hạn hán")];
        let vectorizer = TfidfVectorizer::fit(&docs).unwrap();
        let row = vectorizer.transform(&ngrams("lũ lũ lụt"));

        let weight = |term: &str| row[vectorizer.vocabulary[term]];
        let ratio = weight("lũ") / weight("lụt");
        assert!((ratio - (1.0 + 2f64.ln())).abs() < 1e-9);
        assert_eq!(weight("hạn"), 0.0);
    }

    #[test]
    fn test_train_and_predict_corpus() {
        let model = NaiveBayesModel::train(&training_samples()).unwrap();
        model.validate().unwrap();

        let (category, confidence) = model.predict("Bão số 9 đổ bộ vào miền Trung với sức gió giật cấp 15");
        assert_eq!(category, MlCategory::Storm);
        assert!(confidence > 0.0 && confidence <= 1.0);

        let (category, _) = model.predict("Đội tuyển Việt Nam thắng đậm trong trận đấu");
        assert_eq!(category, MlCategory::NonDisaster);

        let total: f64 = model.predict_proba("Động đất xảy ra ở độ sâu 10km").values().sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_single_class_is_rejected() {
        let samples = vec![("lũ lớn".to_string(), MlCategory::Flood), ("lũ quét".to_string(), MlCategory::Flood)];
        assert!(NaiveBayesModel::train(&samples).is_err());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("model.json");
        let model = NaiveBayesModel::train(&training_samples()).unwrap();
        model.save(&path).unwrap();
        let loaded = NaiveBayesModel::load(&path).unwrap();
        assert_eq!(loaded.training_samples(), model.training_samples());
        assert_eq!(loaded.predict("Cháy rừng lan rộng tại Nghệ An").0, MlCategory::Fire);
    }

    #[test]
    fn test_load_rejects_corrupt_model() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        let mut model = NaiveBayesModel::train(&training_samples()).unwrap();
        model.class_log_prior.pop();
        model.save(&path).unwrap();
        assert!(NaiveBayesModel::load(&path).is_err());

        fs::write(&path, b"not json").unwrap();
        assert!(NaiveBayesModel::load(&path).is_err());
    }
}
