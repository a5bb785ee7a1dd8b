use std::collections::BTreeMap;
use std::fmt;

use dm_core::{MlCategory, PredictionMethod};

use super::MlPrediction;

const HIT_CONFIDENCE: f64 = 0.7;
const MISS_CONFIDENCE: f64 = 0.5;

const KEYWORDS: &[(MlCategory, &[&str])] = &[
    (MlCategory::Flood, &["lũ", "lụt", "ngập", "triều cường", "vỡ đê", "nước dâng", "lũ quét"]),
    (MlCategory::Storm, &["bão", "áp thấp", "gió mạnh", "siêu bão", "bão số"]),
    (MlCategory::Earthquake, &["động đất", "địa chấn", "rung chấn", "dư chấn"]),
    (MlCategory::Landslide, &["sạt lở", "lở đất", "núi lở", "ta luy"]),
    (MlCategory::Drought, &["hạn hán", "khô hạn", "thiếu nước", "hạn mặn", "cạn kiệt"]),
    (MlCategory::Fire, &["cháy rừng", "hỏa hoạn", "cháy lớn", "cháy lan", "lửa"]),
];

/// Keyword-only stand-in used when no statistical model is loaded.
pub struct KeywordFallback;

impl fmt::Debug for KeywordFallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeywordFallback").finish()
    }
}

impl KeywordFallback {
    pub fn predict(&self, text: &str) -> MlPrediction {
        let lowered = text.to_lowercase();
        let hit = KEYWORDS
            .iter()
            .find(|(_, keywords)| keywords.iter().any(|kw| lowered.contains(kw)))
            .map(|(category, _)| *category);

        let (category, confidence) = match hit {
            Some(category) => (category, HIT_CONFIDENCE),
            None => (MlCategory::NonDisaster, MISS_CONFIDENCE),
        };

        MlPrediction {
            category,
            category_vi: category.label_vi().to_string(),
            confidence,
            is_disaster: category.is_disaster(),
            probabilities: BTreeMap::from([(category, confidence)]),
            method: PredictionMethod::Fallback,
        }
    }
}
