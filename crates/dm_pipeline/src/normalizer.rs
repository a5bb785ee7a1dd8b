//! Turns heterogeneous ingest payloads into [`NormalizedArticle`]s.
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use dm_core::{Error, NormalizedArticle, Result};
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{Map, Value};
use unicode_normalization::UnicodeNormalization;

const CONTENT_KEYS: [&str; 3] = ["text", "content", "description"];
const DATE_KEYS: [&str; 3] = ["publish_date", "published_date", "published_at"];

const NAIVE_DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%d/%m/%Y %H:%M"];
const NAIVE_DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%d/%m/%Y"];

/// Known outlet domains and their display names.
pub const SOURCE_NAMES: &[(&str, &str)] = &[
    ("vnexpress.net", "VNExpress"),
    ("tuoitre.vn", "Tuổi Trẻ"),
    ("dantri.com.vn", "Dân Trí"),
    ("vietnamnet.vn", "VietnamNet"),
    ("thanhnien.vn", "Thanh Niên"),
    ("vtv.vn", "VTV"),
    ("baotintuc.vn", "Báo Tin Tức"),
    ("nhandan.vn", "Nhân Dân"),
    ("nld.com.vn", "Người Lao Động"),
    ("24h.com.vn", "24h"),
    ("baomoi.com", "Báo Mới"),
    ("baochinhphu.vn", "Báo Chính Phủ"),
    ("hanoimoi.vn", "Hà Nội Mới"),
    ("tienphong.vn", "Tiền Phong"),
];

lazy_static! {
    static ref ENTITY: Regex = Regex::new(r"&[a-zA-Z]+;").expect("static entity pattern");
    static ref DISALLOWED: Regex =
        Regex::new(r"[^\w\s\x{00C0}-\x{024F}\x{1EA0}-\x{1EF9}.,!?;:\-]").expect("static whitelist pattern");
    static ref WHITESPACE: Regex = Regex::new(r"\s+").expect("static whitespace pattern");
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Normalizer;

impl Normalizer {
    pub fn new() -> Self {
        Self
    }

    pub fn normalize(&self, raw: &Value) -> Result<NormalizedArticle> {
        let fields = raw
            .as_object()
            .ok_or_else(|| Error::Normalization("ingest payload is not an object".to_string()))?;

        let url = str_field(fields, "url")
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .ok_or_else(|| Error::Normalization("missing url".to_string()))?
            .to_string();

        let title = clean_text(str_field(fields, "title").unwrap_or_default());
        let content = CONTENT_KEYS
            .iter()
            .filter_map(|key| str_field(fields, key))
            .find(|value| !value.trim().is_empty())
            .map(clean_text)
            .unwrap_or_default();

        if title.is_empty() && content.is_empty() {
            return Err(Error::Normalization(format!("no title or content for {url}")));
        }

        let summary = str_field(fields, "summary")
            .map(clean_text)
            .filter(|s| !s.is_empty());

        let published_at = DATE_KEYS
            .iter()
            .filter_map(|key| fields.get(*key))
            .find(|value| !is_blank(value))
            .and_then(parse_date);

        Ok(NormalizedArticle {
            source: normalize_source(str_field(fields, "source").unwrap_or_default()),
            title,
            content,
            summary,
            published_at,
            authors: authors(fields),
            category: str_field(fields, "category")
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_string),
            tags: tags(fields.get("tags")),
            top_image: top_image(fields),
            raw_payload: raw.clone(),
            normalized_at: Utc::now(),
            url,
        })
    }

    /// Length gate applied before classification.
    pub fn validate(&self, article: &NormalizedArticle) -> bool {
        article.is_valid()
    }
}

fn str_field<'a>(fields: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    fields.get(key).and_then(Value::as_str)
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// NFC, drop entities and symbols outside the whitelist, collapse whitespace.
pub fn clean_text(text: &str) -> String {
    let composed: String = text.nfc().collect();
    let without_entities = ENTITY.replace_all(&composed, "");
    let whitelisted = DISALLOWED.replace_all(&without_entities, "");
    WHITESPACE.replace_all(&whitelisted, " ").trim().to_string()
}

/// Best effort; `None` when no known shape matches.
pub fn parse_date(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Number(n) => {
            if let Some(secs) = n.as_i64() {
                DateTime::from_timestamp(secs, 0)
            } else {
                let secs = n.as_f64()?;
                let nanos = (secs.fract() * 1e9) as u32;
                DateTime::from_timestamp(secs.trunc() as i64, nanos)
            }
        }
        Value::String(s) => parse_date_str(s.trim()),
        _ => None,
    }
}

fn parse_date_str(s: &str) -> Option<DateTime<Utc>> {
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(naive.and_utc());
        }
    }
    for format in NAIVE_DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, format) {
            return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
        }
    }
    None
}

/// Canonical display name for a domain, url or outlet name.
pub fn normalize_source(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return "unknown".to_string();
    }

    let lowered = trimmed.to_lowercase();
    let host = if lowered.contains("://") {
        url::Url::parse(&lowered)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .unwrap_or(lowered)
    } else {
        lowered
    };
    let domain = host.strip_prefix("www.").unwrap_or(&host);

    SOURCE_NAMES
        .iter()
        .find(|(known, name)| *known == domain || name.to_lowercase() == domain)
        .map(|(_, name)| name.to_string())
        .unwrap_or_else(|| domain.to_string())
}

fn authors(fields: &Map<String, Value>) -> Vec<String> {
    let raw = match fields.get("authors") {
        Some(value) if !is_blank(value) => value,
        _ => match fields.get("author") {
            Some(value) => value,
            None => return Vec::new(),
        },
    };
    string_list(raw)
        .into_iter()
        .map(|a| a.trim().to_string())
        .filter(|a| !a.is_empty())
        .collect()
}

fn tags(raw: Option<&Value>) -> Vec<String> {
    let Some(raw) = raw else {
        return Vec::new();
    };
    let items = match raw {
        Value::String(s) => s.split(',').map(str::to_string).collect(),
        other => string_list(other),
    };
    items
        .into_iter()
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect()
}

fn string_list(value: &Value) -> Vec<String> {
    match value {
        Value::String(s) => vec![s.clone()],
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

fn top_image(fields: &Map<String, Value>) -> Option<String> {
    fields
        .get("media")
        .and_then(|media| media.get("top_image"))
        .and_then(Value::as_str)
        .or_else(|| str_field(fields, "top_image"))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};
    use serde_json::json;

    #[test]
    fn test_normalize_full_payload() {
        let raw = json!({
            "url": "https://vnexpress.net/bao-so-9",
            "title": "  Bão   số 9 &nbsp;đổ bộ ★ ",
            "text": "Bão mạnh cấp 12 đổ bộ vào Quảng Nam.\n\nNhiều nhà tốc mái.",
            "summary": "Tóm tắt",
            "source": "www.VNExpress.net",
            "published_at": "2024-10-27T08:30:00+07:00",
            "authors": ["Minh Anh", "  "],
            "tags": "Bão, Miền Trung, ,",
            "category": "thoi-su",
            "media": {"top_image": "https://vnexpress.net/a.jpg"}
        });
        let article = Normalizer::new().normalize(&raw).unwrap();

        assert_eq!(article.title, "Bão số 9 đổ bộ");
        assert_eq!(article.content, "Bão mạnh cấp 12 đổ bộ vào Quảng Nam. Nhiều nhà tốc mái.");
        assert_eq!(article.source, "VNExpress");
        assert_eq!(article.summary.as_deref(), Some("Tóm tắt"));
        assert_eq!(article.authors, vec!["Minh Anh"]);
        assert_eq!(article.tags, vec!["bão", "miền trung"]);
        assert_eq!(article.category.as_deref(), Some("thoi-su"));
        assert_eq!(article.top_image.as_deref(), Some("https://vnexpress.net/a.jpg"));
        assert_eq!(article.published_at.unwrap().hour(), 1);
        assert_eq!(article.raw_payload, raw);
    }

    #[test]
    fn test_content_priority_and_author_fallback() {
        let raw = json!({
            "url": "https://tuoitre.vn/a",
            "title": "Sạt lở ở Quảng Ngãi",
            "text": "   ",
            "content": "Nội dung chính",
            "description": "Mô tả",
            "author": "Phóng viên",
            "top_image": "https://tuoitre.vn/b.jpg",
            "source": "tuoitre.vn"
        });
        let article = Normalizer::new().normalize(&raw).unwrap();
        assert_eq!(article.content, "Nội dung chính");
        assert_eq!(article.authors, vec!["Phóng viên"]);
        assert_eq!(article.top_image.as_deref(), Some("https://tuoitre.vn/b.jpg"));
        assert_eq!(article.source, "Tuổi Trẻ");
    }

    #[test]
    fn test_missing_url_or_body_fails() {
        let normalizer = Normalizer::new();
        assert!(matches!(
            normalizer.normalize(&json!({"title": "Bão số 9", "content": "x"})),
            Err(Error::Normalization(_))
        ));
        assert!(matches!(
            normalizer.normalize(&json!({"url": "  ", "title": "Bão"})),
            Err(Error::Normalization(_))
        ));
        assert!(matches!(
            normalizer.normalize(&json!({"url": "https://a.vn", "title": "", "content": ""})),
            Err(Error::Normalization(_))
        ));
        assert!(normalizer.normalize(&json!(["not", "an", "object"])).is_err());
    }

    #[test]
    fn test_clean_text_composes_decomposed_input() {
        // "lũ" written as u + combining tilde
        let decomposed = "lu\u{0303}";
        assert_eq!(clean_text(decomposed), "lũ");
        assert_eq!(clean_text("Mưa @#lớn$ -- kéo dài!"), "Mưa lớn -- kéo dài!");
    }

    #[test]
    fn test_parse_date_shapes() {
        let expect = |value: Value| parse_date(&value).map(|d| (d.year(), d.month(), d.day()));
        assert_eq!(expect(json!("Sun, 27 Oct 2024 08:30:00 +0700")), Some((2024, 10, 27)));
        assert_eq!(expect(json!("2024-10-27 08:30:00")), Some((2024, 10, 27)));
        assert_eq!(expect(json!("27/10/2024")), Some((2024, 10, 27)));
        assert_eq!(expect(json!(1730000000)), Some((2024, 10, 27)));
        assert_eq!(expect(json!("hôm qua")), None);
        assert_eq!(expect(json!(null)), None);
    }

    #[test]
    fn test_unparseable_date_is_not_an_error() {
        let raw = json!({"url": "https://a.vn", "title": "Lũ lớn", "publish_date": "không rõ"});
        let article = Normalizer::new().normalize(&raw).unwrap();
        assert!(article.published_at.is_none());
    }

    #[test]
    fn test_normalize_source() {
        assert_eq!(normalize_source(""), "unknown");
        assert_eq!(normalize_source("https://www.dantri.com.vn/xa-hoi"), "Dân Trí");
        assert_eq!(normalize_source("VnExpress"), "VNExpress");
        assert_eq!(normalize_source("www.Example.org"), "example.org");
    }

    #[test]
    fn test_validate_gate() {
        let normalizer = Normalizer::new();
        let short = normalizer
            .normalize(&json!({"url": "https://a.vn", "title": "Lũ", "content": "ngắn"}))
            .unwrap();
        assert!(!normalizer.validate(&short));
    }
}
