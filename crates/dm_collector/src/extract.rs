//! Full-content extraction from article pages.
use chrono::{DateTime, Utc};
use dm_core::RawArticle;
use lazy_static::lazy_static;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::jsonld;

/// Paragraphs shorter than this are navigation, captions or bylines.
const MIN_PARAGRAPH_CHARS: usize = 20;

lazy_static! {
    static ref H1: Selector = Selector::parse("h1").expect("static selector");
    static ref ARTICLE_PARAGRAPHS: Selector = Selector::parse("article p").expect("static selector");
    static ref PARAGRAPHS: Selector = Selector::parse("p").expect("static selector");
    static ref OG_TITLE: Selector = Selector::parse("meta[property='og:title']").expect("static selector");
    static ref OG_IMAGE: Selector = Selector::parse("meta[property='og:image']").expect("static selector");
    static ref DESCRIPTION: Selector = Selector::parse("meta[name='description']").expect("static selector");
    static ref OG_DESCRIPTION: Selector =
        Selector::parse("meta[property='og:description']").expect("static selector");
    static ref AUTHOR: Selector = Selector::parse("meta[name='author']").expect("static selector");
    static ref KEYWORDS: Selector = Selector::parse("meta[name='keywords']").expect("static selector");
    static ref PUBLISHED_TIME: Selector =
        Selector::parse("meta[property='article:published_time']").expect("static selector");
}

/// An article ready to hand to the ingest pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedArticle {
    pub url: String,
    pub title: String,
    pub source: String,
    pub text: String,
    pub summary: String,
    pub authors: Vec<String>,
    pub publish_date: Option<DateTime<Utc>>,
    pub top_image: Option<String>,
    pub keywords: Vec<String>,
    pub collected_at: DateTime<Utc>,
    /// Body came from the feed summary rather than the page.
    pub from_feed: bool,
}

impl ExtractedArticle {
    /// Feed data only, summary standing in for the body.
    pub fn from_feed(raw: &RawArticle) -> Self {
        Self {
            url: raw.url.clone(),
            title: raw.title.clone(),
            source: raw.source.clone(),
            text: raw.summary.clone(),
            summary: raw.summary.clone(),
            authors: Vec::new(),
            publish_date: raw.published_date,
            top_image: None,
            keywords: Vec::new(),
            collected_at: Utc::now(),
            from_feed: true,
        }
    }

    /// Mapping accepted by the pipeline's ingest contract.
    pub fn to_ingest_payload(&self) -> Value {
        let mut payload = json!({
            "url": self.url,
            "title": self.title,
            "text": self.text,
            "summary": self.summary,
            "source": self.source,
            "authors": self.authors,
            "tags": self.keywords,
        });
        if let Some(date) = self.publish_date {
            payload["publish_date"] = json!(date.to_rfc3339());
        }
        if let Some(image) = &self.top_image {
            payload["top_image"] = json!(image);
        }
        payload
    }
}

/// Pull title, body and metadata out of an article page.
///
/// Anything the page lacks is taken from the feed entry. An empty body falls
/// back to the feed summary.
pub fn extract_article(html: &str, raw: &RawArticle) -> ExtractedArticle {
    let document = Html::parse_document(html);

    let title = first_text(&document, &H1)
        .or_else(|| meta_content(&document, &OG_TITLE))
        .unwrap_or_else(|| raw.title.clone());

    let text = body_text(&document);

    let summary = meta_content(&document, &DESCRIPTION)
        .or_else(|| meta_content(&document, &OG_DESCRIPTION))
        .unwrap_or_else(|| raw.summary.clone());

    let mut authors = jsonld::extract_authors(&document);
    if authors.is_empty() {
        authors.extend(meta_content(&document, &AUTHOR));
    }

    let publish_date = meta_content(&document, &PUBLISHED_TIME)
        .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|| jsonld::extract_published(&document))
        .or(raw.published_date);

    let keywords = meta_content(&document, &KEYWORDS)
        .map(|k| {
            k.split(',')
                .map(|w| w.trim().to_string())
                .filter(|w| !w.is_empty())
                .collect()
        })
        .unwrap_or_default();

    if text.is_empty() {
        let mut fallback = ExtractedArticle::from_feed(raw);
        fallback.title = title;
        return fallback;
    }

    ExtractedArticle {
        url: raw.url.clone(),
        title,
        source: raw.source.clone(),
        text,
        summary,
        authors,
        publish_date,
        top_image: meta_content(&document, &OG_IMAGE),
        keywords,
        collected_at: Utc::now(),
        from_feed: false,
    }
}

fn body_text(document: &Html) -> String {
    let scoped: Vec<String> = paragraphs(document.select(&ARTICLE_PARAGRAPHS));
    let paragraphs = if scoped.is_empty() {
        paragraphs(document.select(&PARAGRAPHS))
    } else {
        scoped
    };
    paragraphs.join("\n\n")
}

fn paragraphs<'a>(elements: impl Iterator<Item = ElementRef<'a>>) -> Vec<String> {
    elements
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|p| p.chars().count() >= MIN_PARAGRAPH_CHARS)
        .collect()
}

fn first_text(document: &Html, selector: &Selector) -> Option<String> {
    document
        .select(selector)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty())
}

fn meta_content(document: &Html, selector: &Selector) -> Option<String> {
    document
        .select(selector)
        .next()
        .and_then(|el| el.value().attr("content"))
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use dm_core::FeedKind;

    fn raw() -> RawArticle {
        RawArticle {
            url: "https://vnexpress.net/bao-so-3.html".to_string(),
            title: "Bão số 3 - VnExpress".to_string(),
            source: "VnExpress".to_string(),
            published_date: None,
            summary: "Bão số 3 đổ bộ vào Quảng Ninh".to_string(),
            feed_kind: FeedKind::GoogleNews,
        }
    }

    const PAGE: &str = r#"<html><head>
        <meta property="og:image" content="https://i.vnecdn.net/bao.jpg">
        <meta name="description" content="Bão Yagi đổ bộ với sức gió cấp 12">
        <meta name="keywords" content="bão, Quảng Ninh, ">
        <meta property="article:published_time" content="2024-09-07T10:00:00+07:00">
        <script type="application/ld+json">{"author": {"name": "Minh Anh"}}</script>
        </head><body>
        <h1> Bão Yagi đổ bộ Quảng Ninh </h1>
        <p>Quảng cáo</p>
        <article>
          <p>Chiều 7/9, bão Yagi đổ bộ vào Quảng Ninh với sức gió mạnh cấp 12.</p>
          <p>Ngắn</p>
          <p>Hàng nghìn người dân đã được sơ tán đến nơi an toàn trước khi bão vào.</p>
        </article></body></html>"#;

    #[test]
    fn test_extract_full_page() {
        let article = extract_article(PAGE, &raw());
        assert!(!article.from_feed);
        assert_eq!(article.title, "Bão Yagi đổ bộ Quảng Ninh");
        assert_eq!(article.text.split("\n\n").count(), 2);
        assert!(article.text.starts_with("Chiều 7/9"));
        assert_eq!(article.summary, "Bão Yagi đổ bộ với sức gió cấp 12");
        assert_eq!(article.authors, vec!["Minh Anh"]);
        assert_eq!(article.keywords, vec!["bão", "Quảng Ninh"]);
        assert_eq!(article.top_image.as_deref(), Some("https://i.vnecdn.net/bao.jpg"));
        assert_eq!(article.publish_date.unwrap().to_rfc3339(), "2024-09-07T03:00:00+00:00");
    }

    #[test]
    fn test_empty_body_uses_feed_summary() {
        let article = extract_article("<html><body><h1>Tiêu đề</h1></body></html>", &raw());
        assert!(article.from_feed);
        assert_eq!(article.text, "Bão số 3 đổ bộ vào Quảng Ninh");
        assert_eq!(article.title, "Tiêu đề");
    }

    #[test]
    fn test_ingest_payload_shape() {
        let article = extract_article(PAGE, &raw());
        let payload = article.to_ingest_payload();
        assert_eq!(payload["url"], "https://vnexpress.net/bao-so-3.html");
        assert_eq!(payload["source"], "VnExpress");
        assert_eq!(payload["top_image"], "https://i.vnecdn.net/bao.jpg");
        assert!(payload["publish_date"].as_str().unwrap().starts_with("2024-09-07"));

        let bare = ExtractedArticle::from_feed(&raw()).to_ingest_payload();
        assert!(bare.get("publish_date").is_none());
        assert!(bare.get("top_image").is_none());
    }
}
