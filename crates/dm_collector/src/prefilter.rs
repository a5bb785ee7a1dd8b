use dm_classifier::LEXICON;

/// Broad disaster vocabulary checked against feed title and summary.
pub const QUICK_KEYWORDS: [&str; 20] = [
    "bão", "lũ", "lụt", "ngập", "sạt lở", "động đất", "cháy", "thiên tai",
    "cứu hộ", "sơ tán", "thiệt hại", "mưa lớn", "lốc", "áp thấp", "hạn hán",
    "mất tích", "tử vong", "cứu nạn", "khẩn cấp", "cảnh báo",
];

/// Cheap gate in front of content extraction.
///
/// Holds the quick list plus every type keyword of the classifier lexicon, so
/// nothing the rule classifier would flag is dropped here.
#[derive(Debug, Clone)]
pub struct PreFilter {
    keywords: Vec<&'static str>,
}

impl Default for PreFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl PreFilter {
    pub fn new() -> Self {
        let mut keywords: Vec<&'static str> = QUICK_KEYWORDS.to_vec();
        for keyword in LEXICON.type_keywords() {
            if !keywords.contains(&keyword) {
                keywords.push(keyword);
            }
        }
        Self { keywords }
    }

    pub fn keywords(&self) -> &[&'static str] {
        &self.keywords
    }

    pub fn is_candidate(&self, text: &str) -> bool {
        let lowered = text.to_lowercase();
        self.keywords.iter().any(|k| lowered.contains(k))
    }
}
