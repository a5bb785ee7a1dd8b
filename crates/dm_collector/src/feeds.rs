//! Feed catalogue and RSS/Atom parsing.
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use dm_core::{Error, FeedKind, RawArticle, Result};
use lazy_static::lazy_static;
use regex::Regex;
use scraper::Html;
use url::Url;

pub const GOOGLE_NEWS_RSS_URL: &str = "https://news.google.com/rss/search";

/// Entries kept per search query.
pub const GOOGLE_NEWS_LIMIT: usize = 20;
/// Entries kept per direct feed url.
pub const DIRECT_FEED_LIMIT: usize = 30;

/// Queries sent to Google News, most productive first.
pub const DISASTER_SEARCH_KEYWORDS: [&str; 20] = [
    "bão Việt Nam",
    "lũ lụt Việt Nam",
    "ngập lụt",
    "sạt lở đất",
    "lũ quét",
    "áp thấp nhiệt đới",
    "mưa lớn ngập",
    "động đất Việt Nam",
    "sụt lún đất",
    "cháy rừng Việt Nam",
    "cháy lớn",
    "hỏa hoạn",
    "hạn hán",
    "xâm nhập mặn",
    "thiếu nước",
    "thiên tai Việt Nam",
    "cứu hộ cứu nạn",
    "sơ tán khẩn cấp",
    "thiệt hại do bão",
    "thiệt hại do lũ",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedSource {
    pub key: &'static str,
    pub name: &'static str,
    pub domain: &'static str,
    pub rss_urls: &'static [&'static str],
}

pub const DIRECT_FEEDS: &[FeedSource] = &[
    FeedSource {
        key: "vnexpress",
        name: "VNExpress",
        domain: "vnexpress.net",
        rss_urls: &["https://vnexpress.net/rss/thoi-su.rss", "https://vnexpress.net/rss/the-gioi.rss"],
    },
    FeedSource {
        key: "tuoitre",
        name: "Tuổi Trẻ",
        domain: "tuoitre.vn",
        rss_urls: &["https://tuoitre.vn/rss/thoi-su.rss", "https://tuoitre.vn/rss/the-gioi.rss"],
    },
    FeedSource {
        key: "thanhnien",
        name: "Thanh Niên",
        domain: "thanhnien.vn",
        rss_urls: &["https://thanhnien.vn/rss/thoi-su.rss", "https://thanhnien.vn/rss/the-gioi.rss"],
    },
    FeedSource {
        key: "dantri",
        name: "Dân Trí",
        domain: "dantri.com.vn",
        rss_urls: &["https://dantri.com.vn/rss/xa-hoi.rss", "https://dantri.com.vn/rss/the-gioi.rss"],
    },
    FeedSource {
        key: "vietnamnet",
        name: "VietnamNet",
        domain: "vietnamnet.vn",
        rss_urls: &["https://vietnamnet.vn/rss/thoi-su.rss"],
    },
    FeedSource {
        key: "vtv",
        name: "VTV",
        domain: "vtv.vn",
        rss_urls: &["https://vtv.vn/trong-nuoc.rss", "https://vtv.vn/the-gioi.rss"],
    },
    FeedSource {
        key: "baotintuc",
        name: "Báo Tin Tức",
        domain: "baotintuc.vn",
        rss_urls: &["https://baotintuc.vn/xa-hoi.rss"],
    },
    FeedSource {
        key: "nhandan",
        name: "Nhân Dân",
        domain: "nhandan.vn",
        rss_urls: &["https://nhandan.vn/rss/xahoi-1335.rss"],
    },
    FeedSource {
        key: "nguoilaodong",
        name: "Người Lao Động",
        domain: "nld.com.vn",
        rss_urls: &["https://nld.com.vn/thoi-su.rss"],
    },
    FeedSource {
        key: "24h",
        name: "24h",
        domain: "24h.com.vn",
        rss_urls: &["https://cdn.24h.com.vn/upload/rss/tintuctrongngay.rss"],
    },
    FeedSource {
        key: "baomoi",
        name: "Báo Mới",
        domain: "baomoi.com",
        rss_urls: &["https://baomoi.com/xa-hoi.rss"],
    },
    FeedSource {
        key: "chinhphu",
        name: "Báo Chính Phủ",
        domain: "baochinhphu.vn",
        rss_urls: &["https://baochinhphu.vn/rss/home.rss"],
    },
    FeedSource {
        key: "hanoimoi",
        name: "Hà Nội Mới",
        domain: "hanoimoi.vn",
        rss_urls: &["https://hanoimoi.vn/rss/xa-hoi-702.rss"],
    },
    FeedSource {
        key: "tienphong",
        name: "Tiền Phong",
        domain: "tienphong.vn",
        rss_urls: &["https://tienphong.vn/rss/xa-hoi-2.rss"],
    },
];

pub fn find_source(key: &str) -> Option<&'static FeedSource> {
    DIRECT_FEEDS.iter().find(|s| s.key.eq_ignore_ascii_case(key))
}

lazy_static! {
    static ref EMBEDDED_URL: Regex =
        Regex::new(r#"https?://[^\s"<>\x00-\x1f\x{FFFD}]+"#).expect("static embedded url pattern");
    static ref LENIENT_URL_SAFE: GeneralPurpose = GeneralPurpose::new(
        &alphabet::URL_SAFE,
        GeneralPurposeConfig::new()
            .with_decode_allow_trailing_bits(true)
            .with_decode_padding_mode(DecodePaddingMode::Indifferent),
    );
}

pub fn google_news_url(keyword: &str) -> Result<Url> {
    let url = Url::parse_with_params(
        GOOGLE_NEWS_RSS_URL,
        &[("q", keyword), ("hl", "vi"), ("gl", "VN"), ("ceid", "VN:vi")],
    )?;
    Ok(url)
}

/// Parse an RSS/Atom body into raw articles.
///
/// Google News entries get their publisher url decoded and their source taken
/// from the title suffix; direct feed entries are attributed to `domain`.
pub fn parse_feed(body: &[u8], kind: FeedKind, domain: &str, limit: usize) -> Result<Vec<RawArticle>> {
    let feed = feed_rs::parser::parse(body).map_err(|e| Error::Fetch(format!("Failed to parse feed: {}", e)))?;

    let articles = feed
        .entries
        .into_iter()
        .take(limit)
        .filter_map(|entry| {
            let link = entry.links.first().map(|l| l.href.trim().to_string()).unwrap_or_default();
            let title = entry.title.map(|t| t.content.trim().to_string()).unwrap_or_default();
            let summary = entry.summary.map(|t| strip_markup(&t.content)).unwrap_or_default();

            let (url, source) = match kind {
                FeedKind::GoogleNews => (decode_google_news_url(&link)?, source_from_title(&title)),
                FeedKind::DirectRss => {
                    if link.is_empty() {
                        return None;
                    }
                    (link, domain.to_string())
                }
            };

            Some(RawArticle {
                url,
                title,
                source,
                published_date: entry.published.or(entry.updated),
                summary,
                feed_kind: kind,
            })
        })
        .collect();

    Ok(articles)
}

/// Recover the publisher url behind a Google News redirect.
///
/// Tries the `url=` query parameter, then the base64 article id after a
/// `CBMi`/`CAIi` prefix. Anything undecodable is returned unchanged so the
/// redirect can still be followed. Empty links yield `None`.
pub fn decode_google_news_url(link: &str) -> Option<String> {
    if link.is_empty() {
        return None;
    }
    if !link.contains("news.google.com") {
        return Some(link.to_string());
    }

    if let Ok(parsed) = Url::parse(link) {
        if let Some((_, target)) = parsed.query_pairs().find(|(k, _)| k == "url") {
            return Some(target.into_owned());
        }
    }

    if let Some((_, tail)) = link.rsplit_once("/articles/") {
        let id = tail.split('?').next().unwrap_or_default();
        for prefix in ["CBMi", "CAIi"] {
            let Some(encoded) = id.strip_prefix(prefix) else {
                continue;
            };
            if let Ok(bytes) = LENIENT_URL_SAFE.decode(encoded) {
                let decoded = String::from_utf8_lossy(&bytes);
                if let Some(found) = EMBEDDED_URL.find(&decoded) {
                    return Some(found.as_str().to_string());
                }
            }
        }
    }

    Some(link.to_string())
}

/// Publisher name from a `Title - Publisher` headline.
pub fn source_from_title(title: &str) -> String {
    title
        .rsplit_once(" - ")
        .map(|(_, source)| source.trim())
        .filter(|source| !source.is_empty())
        .unwrap_or("unknown")
        .to_string()
}

/// Visible text of an HTML fragment.
pub(crate) fn strip_markup(fragment: &str) -> String {
    let parsed = Html::parse_fragment(fragment);
    let text: Vec<&str> = parsed.root_element().text().map(str::trim).filter(|t| !t.is_empty()).collect();
    text.join(" ")
}
