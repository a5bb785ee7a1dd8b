//! Static keyword tables for Vietnamese disaster news.
//!
//! Everything here is matched by plain substring containment against
//! lower-cased text. Multi-syllable Vietnamese phrases keep false positives
//! low enough that no tokenization is needed.
use dm_core::{DisasterType, Region, Severity};
use lazy_static::lazy_static;
use regex::Regex;

#[derive(Debug)]
pub struct TypeEntry {
    pub tag: DisasterType,
    pub keywords: &'static [&'static str],
    pub weight: f64,
}

#[derive(Debug)]
pub struct KeywordLexicon {
    /// Sorted alphabetically by tag. Type ties resolve to the earlier entry.
    pub disaster_types: Vec<TypeEntry>,
    /// Ordered high, medium, low.
    pub severity_tiers: Vec<(Severity, &'static [&'static str])>,
    /// Ordered north, central, south, highlands.
    pub region_localities: Vec<(Region, &'static [&'static str])>,
    pub death_pattern: Regex,
    pub missing_pattern: Regex,
    pub injured_pattern: Regex,
    pub houses_pattern: Regex,
}

const DROUGHT: &[&str] = &[
    "hạn hán", "khô hạn", "thiếu nước", "hạn mặn", "xâm nhập mặn",
    "cháy rừng", "thiếu mưa", "nứt nẻ", "mất mùa", "chết khát",
];

const EARTHQUAKE: &[&str] = &[
    "động đất", "địa chấn", "rung chấn", "sóng thần", "núi lửa",
    "sụt lún", "nứt đất", "rung lắc",
];

const FLOOD: &[&str] = &[
    "lũ", "lụt", "lũ quét", "lũ lụt", "ngập úng", "ngập nặng",
    "ngập sâu", "nước dâng", "sạt lở", "sạt lở đất", "vỡ đê",
    "tràn đê", "xả lũ", "hồ thủy điện", "ngập đường",
];

const GENERAL: &[&str] = &[
    "thiên tai", "thảm họa", "cứu hộ", "cứu nạn", "sơ tán",
    "di dời", "cảnh báo khẩn", "ứng phó", "khắc phục hậu quả",
    "thiệt hại", "tử vong", "mất tích", "bị thương", "cô lập",
];

const WEATHER: &[&str] = &[
    "bão", "áp thấp nhiệt đới", "mưa lớn", "mưa to", "dông lốc",
    "giông bão", "mưa đá", "lốc xoáy", "gió mạnh", "rét đậm",
    "rét hại", "nắng nóng", "nắng gay gắt", "sấm sét",
];

const SEVERITY_HIGH: &[&str] = &[
    "cấp 4", "cấp 5", "khẩn cấp", "nguy hiểm", "chết người",
    "tử vong", "mất tích", "thiệt hại nặng", "nghiêm trọng",
    "đặc biệt nguy hiểm", "siêu bão", "lũ lịch sử", "kỷ lục",
];

const SEVERITY_MEDIUM: &[&str] = &[
    "cấp 3", "thiệt hại", "sơ tán", "di dời", "cảnh báo",
    "ảnh hưởng", "ngập", "hư hại",
];

const SEVERITY_LOW: &[&str] = &[
    "cấp 1", "cấp 2", "nhẹ", "cục bộ", "dự báo",
    "có thể xảy ra", "nguy cơ",
];

const NORTH: &[&str] = &[
    "hà nội", "hải phòng", "quảng ninh", "hải dương", "hưng yên",
    "thái bình", "hà nam", "nam định", "ninh bình", "vĩnh phúc",
    "bắc ninh", "bắc giang", "thái nguyên", "lạng sơn", "cao bằng",
    "bắc kạn", "hà giang", "tuyên quang", "lào cai", "yên bái",
    "điện biên", "lai châu", "sơn la", "hòa bình", "phú thọ",
    "miền bắc", "đồng bằng bắc bộ", "tây bắc", "đông bắc",
];

const CENTRAL: &[&str] = &[
    "thanh hóa", "nghệ an", "hà tĩnh", "quảng bình", "quảng trị",
    "thừa thiên huế", "đà nẵng", "quảng nam", "quảng ngãi",
    "bình định", "phú yên", "khánh hòa", "ninh thuận", "bình thuận",
    "miền trung", "bắc trung bộ", "nam trung bộ", "duyên hải miền trung",
];

const SOUTH: &[&str] = &[
    "tp.hcm", "thành phố hồ chí minh", "hồ chí minh", "bình dương",
    "đồng nai", "bà rịa", "vũng tàu", "tây ninh", "bình phước",
    "long an", "tiền giang", "bến tre", "vĩnh long", "trà vinh",
    "đồng tháp", "an giang", "kiên giang", "cần thơ", "hậu giang",
    "sóc trăng", "bạc liêu", "cà mau", "miền nam", "đông nam bộ",
    "tây nam bộ", "đồng bằng sông cửu long",
];

const HIGHLANDS: &[&str] = &[
    "kon tum", "gia lai", "đắk lắk", "đắk nông", "lâm đồng",
    "tây nguyên", "cao nguyên",
];

lazy_static! {
    /// Process-wide lexicon, built on first use and never mutated.
    pub static ref LEXICON: KeywordLexicon = KeywordLexicon::build();
}

impl KeywordLexicon {
    fn build() -> Self {
        Self {
            disaster_types: vec![
                TypeEntry { tag: DisasterType::Drought, keywords: DROUGHT, weight: 1.0 },
                TypeEntry { tag: DisasterType::Earthquake, keywords: EARTHQUAKE, weight: 1.5 },
                TypeEntry { tag: DisasterType::Flood, keywords: FLOOD, weight: 1.2 },
                TypeEntry { tag: DisasterType::General, keywords: GENERAL, weight: 0.8 },
                TypeEntry { tag: DisasterType::Weather, keywords: WEATHER, weight: 1.0 },
            ],
            severity_tiers: vec![
                (Severity::High, SEVERITY_HIGH),
                (Severity::Medium, SEVERITY_MEDIUM),
                (Severity::Low, SEVERITY_LOW),
            ],
            region_localities: vec![
                (Region::North, NORTH),
                (Region::Central, CENTRAL),
                (Region::South, SOUTH),
                (Region::Highlands, HIGHLANDS),
            ],
            death_pattern: count_pattern(r"(người)?\s*(chết|tử vong|thiệt mạng|mất mạng)"),
            missing_pattern: count_pattern(r"(người)?\s*(mất tích|bị cuốn trôi)"),
            injured_pattern: count_pattern(r"(người)?\s*(bị thương|bị đau)"),
            houses_pattern: count_pattern(r"(căn)?\s*(nhà|hộ)?\s*(sập|đổ|hư hại|ngập|bị cuốn)"),
        }
    }

    /// Keywords of a severity tier. `Severity::None` has none.
    pub fn severity_keywords(&self, tier: Severity) -> &'static [&'static str] {
        self.severity_tiers
            .iter()
            .find(|(t, _)| *t == tier)
            .map(|(_, keywords)| *keywords)
            .unwrap_or(&[])
    }

    /// Every disaster-type keyword across all tags, in lexicon order.
    pub fn type_keywords(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.disaster_types
            .iter()
            .flat_map(|entry| entry.keywords.iter().copied())
    }

    pub fn type_tags(&self) -> Vec<DisasterType> {
        self.disaster_types.iter().map(|entry| entry.tag).collect()
    }
}

/// `<number> <suffix>` where the leading count is captured in group 1.
fn count_pattern(suffix: &str) -> Regex {
    Regex::new(&format!(r"(?i)([0-9]+)\s*{suffix}")).expect("static count pattern")
}
