use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Error;

pub const PIPELINE_VERSION: &str = "1.0";

/// Primary disaster category assigned by the classifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisasterType {
    Weather,
    Flood,
    Drought,
    Earthquake,
    Fire,
    General,
    Other,
    None,
}

impl DisasterType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DisasterType::Weather => "weather",
            DisasterType::Flood => "flood",
            DisasterType::Drought => "drought",
            DisasterType::Earthquake => "earthquake",
            DisasterType::Fire => "fire",
            DisasterType::General => "general",
            DisasterType::Other => "other",
            DisasterType::None => "none",
        }
    }
}

/// Impact tier. Declared from most to least severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    High,
    Medium,
    Low,
    None,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
            Severity::None => "none",
        }
    }
}

/// Vietnamese macro-region used for alerting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Region {
    North,
    Central,
    South,
    Highlands,
}

impl Region {
    /// Detection order. First hit wins.
    pub const ALL: [Region; 4] = [Region::North, Region::Central, Region::South, Region::Highlands];

    pub fn as_str(&self) -> &'static str {
        match self {
            Region::North => "north",
            Region::Central => "central",
            Region::South => "south",
            Region::Highlands => "highlands",
        }
    }
}

macro_rules! impl_str_enum {
    ($ty:ident, [$($variant:ident),+]) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = Error;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                let needle = s.trim().to_lowercase();
                $(
                    if needle == $ty::$variant.as_str() {
                        return Ok($ty::$variant);
                    }
                )+
                Err(Error::Config(format!("unknown {}: {}", stringify!($ty), s)))
            }
        }
    };
}

impl_str_enum!(DisasterType, [Weather, Flood, Drought, Earthquake, Fire, General, Other, None]);
impl_str_enum!(Severity, [High, Medium, Low, None]);
impl_str_enum!(Region, [North, Central, South, Highlands]);

/// Label space of the statistical classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MlCategory {
    Flood,
    Storm,
    Earthquake,
    Landslide,
    Drought,
    Fire,
    NonDisaster,
}

impl MlCategory {
    pub const ALL: [MlCategory; 7] = [
        MlCategory::Flood,
        MlCategory::Storm,
        MlCategory::Earthquake,
        MlCategory::Landslide,
        MlCategory::Drought,
        MlCategory::Fire,
        MlCategory::NonDisaster,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MlCategory::Flood => "flood",
            MlCategory::Storm => "storm",
            MlCategory::Earthquake => "earthquake",
            MlCategory::Landslide => "landslide",
            MlCategory::Drought => "drought",
            MlCategory::Fire => "fire",
            MlCategory::NonDisaster => "non_disaster",
        }
    }

    /// Vietnamese display label.
    pub fn label_vi(&self) -> &'static str {
        match self {
            MlCategory::Flood => "Lũ lụt",
            MlCategory::Storm => "Bão",
            MlCategory::Earthquake => "Động đất",
            MlCategory::Landslide => "Sạt lở",
            MlCategory::Drought => "Hạn hán",
            MlCategory::Fire => "Cháy rừng",
            MlCategory::NonDisaster => "Không phải thiên tai",
        }
    }

    pub fn is_disaster(&self) -> bool {
        !matches!(self, MlCategory::NonDisaster)
    }
}

/// Which predictor produced an ML result, so callers can read its confidence correctly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictionMethod {
    Ml,
    Fallback,
}

/// ML metadata attached to a hybrid classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MlSummary {
    pub category: MlCategory,
    pub confidence: f64,
    pub method: PredictionMethod,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassificationDetails {
    pub death_count: u32,
    pub missing_count: u32,
    pub injured_count: u32,
    pub houses_affected: u32,
    pub severity_keyword_hits: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ml_result: Option<MlSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub is_disaster: bool,
    pub disaster_type: DisasterType,
    pub severity: Severity,
    pub confidence: f64,
    pub region: Option<Region>,
    pub matched_keywords: BTreeSet<String>,
    pub details: ClassificationDetails,
}

impl ClassificationResult {
    /// Zero-confidence non-disaster result used for empty input and internal faults.
    pub fn degraded() -> Self {
        Self {
            is_disaster: false,
            disaster_type: DisasterType::None,
            severity: Severity::None,
            confidence: 0.0,
            region: None,
            matched_keywords: BTreeSet::new(),
            details: ClassificationDetails::default(),
        }
    }
}

/// Where a collected item came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedKind {
    GoogleNews,
    DirectRss,
}

/// Feed entry as fetched, before any extraction or cleaning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawArticle {
    pub url: String,
    pub title: String,
    pub source: String,
    pub published_date: Option<DateTime<Utc>>,
    pub summary: String,
    pub feed_kind: FeedKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedArticle {
    pub url: String,
    pub source: String,
    pub title: String,
    pub content: String,
    pub summary: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub authors: Vec<String>,
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub top_image: Option<String>,
    pub raw_payload: serde_json::Value,
    pub normalized_at: DateTime<Utc>,
}

pub const MIN_TITLE_CHARS: usize = 10;
pub const MIN_CONTENT_CHARS: usize = 50;

impl NormalizedArticle {
    /// Length gate applied before classification.
    pub fn is_valid(&self) -> bool {
        !self.url.is_empty()
            && self.title.chars().count() >= MIN_TITLE_CHARS
            && self.content.chars().count() >= MIN_CONTENT_CHARS
    }
}

/// The persisted and broadcast unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedArticle {
    pub url: String,
    pub source: String,
    pub title: String,
    pub content: String,
    pub summary: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub authors: Vec<String>,
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub top_image: Option<String>,
    pub raw_payload: serde_json::Value,
    pub is_disaster: bool,
    pub disaster_type: DisasterType,
    pub severity: Severity,
    pub confidence: f64,
    pub region: Option<Region>,
    pub matched_keywords: BTreeSet<String>,
    pub details: ClassificationDetails,
    pub processed_at: DateTime<Utc>,
    pub pipeline_version: String,
}

impl ProcessedArticle {
    pub fn new(article: NormalizedArticle, classification: ClassificationResult) -> Self {
        Self {
            url: article.url,
            source: article.source,
            title: article.title,
            content: article.content,
            summary: article.summary,
            published_at: article.published_at,
            authors: article.authors,
            category: article.category,
            tags: article.tags,
            top_image: article.top_image,
            raw_payload: article.raw_payload,
            is_disaster: classification.is_disaster,
            disaster_type: classification.disaster_type,
            severity: classification.severity,
            confidence: classification.confidence,
            region: classification.region,
            matched_keywords: classification.matched_keywords,
            details: classification.details,
            processed_at: Utc::now(),
            pipeline_version: PIPELINE_VERSION.to_string(),
        }
    }
}

/// Storage-side document wrapping a processed article.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredArticle {
    #[serde(flatten)]
    pub article: ProcessedArticle,
    pub collected_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug)]
pub enum ArticleStatus {
    New,
    Updated,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineStats {
    pub total_processed: u64,
    pub disaster_articles: u64,
    pub non_disaster_articles: u64,
    pub failed_articles: u64,
    pub avg_confidence: f64,
    pub processing_time_ms: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    #[default]
    Rss,
    GoogleNews,
    Manual,
}

/// Batch ingest input: raw ingest mappings plus where they came from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchIngest {
    pub articles: Vec<serde_json::Value>,
    #[serde(default)]
    pub source_type: SourceType,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total_input: usize,
    pub processed: usize,
    pub failed: usize,
    pub disaster_articles: usize,
    pub non_disaster: usize,
}
