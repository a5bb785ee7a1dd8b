use std::fmt;
use std::sync::Arc;

use dm_core::{ClassificationResult, Classify, DisasterType, MlCategory, Region, Severity};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::lexicon::LEXICON;
use crate::models::{MlClassifier, MlInfo, MlPrediction};
use crate::rule::{round2, RuleAnalysis, RuleClassifier};

const AGREEMENT_BONUS: f64 = 0.1;
const DISAGREEMENT_PENALTY: f64 = 0.9;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierInfo {
    pub rule_based: bool,
    pub ml_available: bool,
    pub disaster_keywords: Vec<String>,
    pub severity_levels: Vec<String>,
    pub regions: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ml_info: Option<MlInfo>,
}

/// Rule classifier with an optional statistical second opinion.
pub struct HybridClassifier {
    rule: RuleClassifier,
    ml: Option<Arc<MlClassifier>>,
}

impl fmt::Debug for HybridClassifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HybridClassifier")
            .field("rule", &self.rule)
            .field("ml", &self.ml.as_ref().map(|m| m.available()))
            .finish()
    }
}

impl HybridClassifier {
    pub fn new(ml: Option<Arc<MlClassifier>>) -> Self {
        Self {
            rule: RuleClassifier::new(),
            ml,
        }
    }

    pub fn rule_only() -> Self {
        Self::new(None)
    }

    pub fn ml(&self) -> Option<&Arc<MlClassifier>> {
        self.ml.as_ref()
    }

    pub fn info(&self) -> ClassifierInfo {
        ClassifierInfo {
            rule_based: true,
            ml_available: self.ml.is_some(),
            disaster_keywords: LEXICON.type_tags().iter().map(|t| t.to_string()).collect(),
            severity_levels: LEXICON.severity_tiers.iter().map(|(t, _)| t.to_string()).collect(),
            regions: Region::ALL.iter().map(|r| r.to_string()).collect(),
            ml_info: self.ml.as_ref().map(|m| m.info()),
        }
    }
}

impl Classify for HybridClassifier {
    fn name(&self) -> &str {
        "hybrid"
    }

    fn classify(&self, title: &str, content: &str) -> ClassificationResult {
        let analysis = match self.rule.analyze(title, content) {
            Ok(analysis) => analysis,
            Err(e) => {
                warn!("Rule classification degraded: {}", e);
                return ClassificationResult::degraded();
            }
        };

        match &self.ml {
            Some(ml) => {
                let prediction = ml.predict(&format!("{title} {content}"));
                debug!(
                    "Combining rule ({}, {:.2}) with {} ({:.2})",
                    analysis.result.is_disaster,
                    analysis.result.confidence,
                    prediction.category.as_str(),
                    prediction.confidence
                );
                combine(analysis, &prediction)
            }
            None => analysis.result,
        }
    }
}

/// Category the rule lexicon would use for an ML label.
pub fn disaster_type_for(category: MlCategory) -> DisasterType {
    match category {
        MlCategory::Storm => DisasterType::Weather,
        MlCategory::Flood | MlCategory::Landslide => DisasterType::Flood,
        MlCategory::Earthquake => DisasterType::Earthquake,
        MlCategory::Drought => DisasterType::Drought,
        MlCategory::Fire => DisasterType::Fire,
        MlCategory::NonDisaster => DisasterType::None,
    }
}

/// Agreement-weighted vote between the rule result and an ML prediction.
pub fn combine(analysis: RuleAnalysis, prediction: &MlPrediction) -> ClassificationResult {
    let RuleAnalysis {
        mut result,
        detected_severity,
        ..
    } = analysis;

    let rule_confidence = result.confidence;
    let confidence = if result.is_disaster == prediction.is_disaster {
        ((rule_confidence + prediction.confidence) / 2.0 + AGREEMENT_BONUS).min(1.0)
    } else if rule_confidence >= prediction.confidence {
        rule_confidence * DISAGREEMENT_PENALTY
    } else {
        // ML is strictly more confident here, its verdict wins
        result.is_disaster = prediction.is_disaster;
        if prediction.is_disaster {
            result.disaster_type = disaster_type_for(prediction.category);
            result.severity = detected_severity;
        } else {
            result.disaster_type = DisasterType::None;
            result.severity = Severity::None;
        }
        prediction.confidence * DISAGREEMENT_PENALTY
    };

    result.confidence = round2(confidence);
    result.details.ml_result = Some(prediction.summary());
    result
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use dm_core::PredictionMethod;

    use super::*;

    fn prediction(category: MlCategory, confidence: f64) -> MlPrediction {
        MlPrediction {
            category,
            category_vi: category.label_vi().to_string(),
            confidence,
            is_disaster: category.is_disaster(),
            probabilities: BTreeMap::from([(category, confidence)]),
            method: PredictionMethod::Ml,
        }
    }

    fn analyze(title: &str, content: &str) -> RuleAnalysis {
        RuleClassifier::new().analyze(title, content).unwrap()
    }

    #[test]
    fn test_agreement_bonus() {
        let analysis = analyze("Lũ quét ở Yên Bái", "Nước lũ dâng cao");
        let rule_confidence = analysis.result.confidence;
        let combined = combine(analysis, &prediction(MlCategory::Flood, 0.8));

        assert!(combined.is_disaster);
        let expected = round2(((rule_confidence + 0.8) / 2.0 + 0.1).min(1.0));
        assert_eq!(combined.confidence, expected);
        let ml = combined.details.ml_result.unwrap();
        assert_eq!(ml.category, MlCategory::Flood);
        assert_eq!(ml.method, PredictionMethod::Ml);
    }

    #[test]
    fn test_rule_wins_disagreement_when_confident() {
        let analysis = analyze("Bão số 9 đổ bộ vào miền Trung", "Bão mạnh làm 2 người chết ở Quảng Nam");
        let rule_confidence = analysis.result.confidence;
        assert!(rule_confidence >= 0.4);
        let combined = combine(analysis, &prediction(MlCategory::NonDisaster, 0.3));

        assert!(combined.is_disaster);
        assert_eq!(combined.disaster_type, DisasterType::Weather);
        assert_eq!(combined.confidence, round2(rule_confidence * 0.9));
    }

    #[test]
    fn test_ml_overrides_when_strictly_more_confident() {
        let analysis = analyze("Cháy chung cư cao tầng", "Nhiều người mắc kẹt trong đám cháy đêm qua");
        assert!(!analysis.result.is_disaster);
        let combined = combine(analysis, &prediction(MlCategory::Fire, 0.9));

        assert!(combined.is_disaster);
        assert_eq!(combined.disaster_type, DisasterType::Fire);
        assert_ne!(combined.severity, Severity::None);
        assert_eq!(combined.confidence, round2(0.9 * 0.9));
    }

    #[test]
    fn test_ml_can_clear_a_weak_rule_hit() {
        let analysis = analyze("Giá vàng biến động nhẹ", "Giá vàng giảm sau cơn bão trên thị trường tài chính");
        assert!(analysis.result.is_disaster);
        let combined = combine(analysis, &prediction(MlCategory::NonDisaster, 0.95));

        assert!(!combined.is_disaster);
        assert_eq!(combined.disaster_type, DisasterType::None);
        assert_eq!(combined.severity, Severity::None);
    }

    #[test]
    fn test_rule_only_matches_rule_classifier() {
        let hybrid = HybridClassifier::rule_only();
        let rule = RuleClassifier::new();
        let (title, content) = ("Động đất tại Điện Biên", "Rung lắc mạnh khiến người dân hoảng sợ");
        assert_eq!(hybrid.classify(title, content), rule.classify(title, content));
        let info = hybrid.info();
        assert!(info.ml_info.is_none());
        assert_eq!(info.regions, vec!["north", "central", "south", "highlands"]);
    }

    #[test]
    fn test_confidence_bounds_with_ml() {
        let dir = tempfile::tempdir().unwrap();
        let ml = MlClassifier::new(crate::models::MlConfig {
            model_path: dir.path().join("model.json"),
            enabled: true,
        });
        let hybrid = HybridClassifier::new(Some(Arc::new(ml)));
        for (title, content) in [
            ("Bão số 9 đổ bộ vào miền Trung", "Gió giật cấp 15, 2 người chết"),
            ("Đội tuyển Việt Nam thắng đậm", "Trận đấu diễn ra sôi nổi trên sân nhà"),
            ("", ""),
        ] {
            let result = hybrid.classify(title, content);
            assert!((0.0..=1.0).contains(&result.confidence));
        }
        let info = hybrid.info();
        assert!(info.ml_available);
        assert_eq!(info.disaster_keywords, vec!["drought", "earthquake", "flood", "general", "weather"]);
    }
}
