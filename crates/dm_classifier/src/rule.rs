use std::collections::BTreeSet;

use dm_core::{
    ClassificationDetails, ClassificationResult, Classify, DisasterType, Error, Region, Result,
    Severity,
};
use regex::Regex;
use tracing::warn;

use crate::lexicon::{KeywordLexicon, LEXICON};

const TYPE_SCORE_DIVISOR: f64 = 5.0;
const DISASTER_SCORE_THRESHOLD: f64 = 0.2;

/// Rule outcome before the non-disaster sentinels are applied.
///
/// The hybrid classifier needs the detected type and severity even when the
/// rules alone decided the text is not a disaster.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleAnalysis {
    pub result: ClassificationResult,
    pub detected_type: DisasterType,
    pub detected_severity: Severity,
}

/// Keyword and pattern scorer over [`LEXICON`].
#[derive(Debug, Clone, Copy)]
pub struct RuleClassifier {
    lexicon: &'static KeywordLexicon,
}

impl Default for RuleClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl RuleClassifier {
    pub fn new() -> Self {
        Self { lexicon: &LEXICON }
    }

    pub fn try_classify(&self, title: &str, content: &str) -> Result<ClassificationResult> {
        self.analyze(title, content).map(|analysis| analysis.result)
    }

    pub fn analyze(&self, title: &str, content: &str) -> Result<RuleAnalysis> {
        if title.trim().is_empty() && content.trim().is_empty() {
            return Ok(RuleAnalysis {
                result: ClassificationResult::degraded(),
                detected_type: DisasterType::None,
                detected_severity: Severity::None,
            });
        }

        let full_text = format!("{title} {content}").to_lowercase();

        let (detected_type, matched_keywords, type_score) = self.detect_type(&full_text);
        let is_disaster = type_score >= DISASTER_SCORE_THRESHOLD || !matched_keywords.is_empty();
        let (detected_severity, details) = self.detect_severity(&full_text)?;
        let region = self.detect_region(&full_text);

        let confidence = confidence(type_score, matched_keywords.len(), detected_severity, region.is_some());

        let result = ClassificationResult {
            is_disaster,
            disaster_type: if is_disaster { detected_type } else { DisasterType::None },
            severity: if is_disaster { detected_severity } else { Severity::None },
            confidence: round2(confidence),
            region,
            matched_keywords,
            details,
        };

        Ok(RuleAnalysis {
            result,
            detected_type,
            detected_severity,
        })
    }

    /// Best type, every matched keyword, and the normalized aggregate score.
    fn detect_type(&self, text: &str) -> (DisasterType, BTreeSet<String>, f64) {
        let mut best: Option<(DisasterType, f64)> = None;
        let mut total = 0.0;
        let mut matched = BTreeSet::new();

        for entry in &self.lexicon.disaster_types {
            let hits: Vec<&str> = entry
                .keywords
                .iter()
                .copied()
                .filter(|kw| text.contains(kw))
                .collect();
            if hits.is_empty() {
                continue;
            }
            let score = hits.len() as f64 * entry.weight;
            total += score;
            matched.extend(hits.into_iter().map(str::to_string));
            // strictly greater: earlier tags keep ties
            if best.map_or(true, |(_, top)| score > top) {
                best = Some((entry.tag, score));
            }
        }

        match best {
            Some((tag, _)) => (tag, matched, (total / TYPE_SCORE_DIVISOR).min(1.0)),
            None => (DisasterType::Other, matched, 0.0),
        }
    }

    fn detect_severity(&self, text: &str) -> Result<(Severity, ClassificationDetails)> {
        let lexicon = self.lexicon;
        let mut details = ClassificationDetails {
            death_count: first_count(&lexicon.death_pattern, text)?,
            missing_count: first_count(&lexicon.missing_pattern, text)?,
            injured_count: first_count(&lexicon.injured_pattern, text)?,
            houses_affected: first_count(&lexicon.houses_pattern, text)?,
            ..Default::default()
        };

        for (_, keywords) in &lexicon.severity_tiers {
            details
                .severity_keyword_hits
                .extend(keywords.iter().filter(|kw| text.contains(*kw)).map(|kw| kw.to_string()));
        }

        let has_tier = |tier| lexicon.severity_keywords(tier).iter().any(|kw| text.contains(kw));

        let severity = if details.death_count >= 1 || details.missing_count >= 3 {
            Severity::High
        } else if has_tier(Severity::High) {
            Severity::High
        } else if details.injured_count >= 5 || details.houses_affected >= 10 {
            Severity::Medium
        } else if has_tier(Severity::Medium) {
            Severity::Medium
        } else {
            Severity::Low
        };

        Ok((severity, details))
    }

    fn detect_region(&self, text: &str) -> Option<Region> {
        self.lexicon
            .region_localities
            .iter()
            .find(|(_, places)| places.iter().any(|place| text.contains(place)))
            .map(|(region, _)| *region)
    }
}

impl Classify for RuleClassifier {
    fn name(&self) -> &str {
        "rule"
    }

    fn classify(&self, title: &str, content: &str) -> ClassificationResult {
        match self.try_classify(title, content) {
            Ok(result) => result,
            Err(e) => {
                warn!("Rule classification degraded: {}", e);
                ClassificationResult::degraded()
            }
        }
    }
}

fn first_count(pattern: &Regex, text: &str) -> Result<u32> {
    match pattern.captures(text).and_then(|caps| caps.get(1)) {
        Some(m) => m
            .as_str()
            .parse::<u32>()
            .map_err(|e| Error::Classification(format!("bad count {:?}: {}", m.as_str(), e))),
        None => Ok(0),
    }
}

fn confidence(type_score: f64, keyword_count: usize, severity: Severity, has_region: bool) -> f64 {
    let keyword_bonus = (keyword_count as f64 * 0.05).min(0.2);
    let severity_bonus = match severity {
        Severity::High => 0.1,
        Severity::Medium => 0.05,
        Severity::Low => 0.02,
        Severity::None => 0.0,
    };
    let region_bonus = if has_region { 0.05 } else { 0.0 };
    (type_score + keyword_bonus + severity_bonus + region_bonus).min(1.0)
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
