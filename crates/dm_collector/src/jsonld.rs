use chrono::{DateTime, Utc};
use scraper::{Html, Selector};
use serde_json::Value;

/// Every JSON-LD object in the document, with `@graph` arrays flattened.
fn blocks(document: &Html) -> Vec<Value> {
    let mut found = Vec::new();
    let Ok(script_selector) = Selector::parse("script[type='application/ld+json']") else {
        return found;
    };
    for script in document.select(&script_selector) {
        let Ok(json) = serde_json::from_str::<Value>(script.text().collect::<String>().trim()) else {
            continue;
        };
        match json {
            Value::Array(items) => found.extend(items),
            Value::Object(mut obj) => match obj.remove("@graph") {
                Some(Value::Array(items)) => found.extend(items),
                _ => found.push(Value::Object(obj)),
            },
            other => found.push(other),
        }
    }
    found
}

/// Extracts authors from JSON-LD metadata in the HTML document.
pub fn extract_authors(document: &Html) -> Vec<String> {
    let mut authors = Vec::new();

    for json in blocks(document) {
        match json.get("author") {
            Some(Value::Array(arr)) => {
                for author_obj in arr {
                    if let Some(name) = author_obj.get("name").and_then(|n| n.as_str()) {
                        authors.push(name.trim().to_string());
                    } else if let Some(name) = author_obj.as_str() {
                        authors.push(name.trim().to_string());
                    }
                }
            }
            Some(Value::Object(obj)) => {
                if let Some(name) = obj.get("name").and_then(|n| n.as_str()) {
                    authors.push(name.trim().to_string());
                }
            }
            Some(Value::String(s)) => authors.push(s.trim().to_string()),
            _ => {}
        }
    }

    let mut seen = std::collections::HashSet::new();
    authors.retain(|a| !a.is_empty() && seen.insert(a.clone()));
    authors
}

/// `datePublished` of the first JSON-LD block that carries a parseable one.
pub fn extract_published(document: &Html) -> Option<DateTime<Utc>> {
    blocks(document).iter().find_map(|json| {
        json.get("datePublished")
            .and_then(Value::as_str)
            .and_then(|s| DateTime::parse_from_rfc3339(s.trim()).ok())
            .map(|dt| dt.with_timezone(&Utc))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authors_from_graph_and_array() {
        let html = r#"<html><head>
            <script type="application/ld+json">{"@graph": [{"@type": "NewsArticle",
                "author": [{"name": " Minh Anh "}, {"name": "Hoàng Long"}],
                "datePublished": "2024-09-07T10:00:00+07:00"}]}</script>
            <script type="application/ld+json">{"author": "Minh Anh"}</script>
            <script type="application/ld+json">not json</script>
        </head><body></body></html>"#;
        let document = Html::parse_document(html);
        assert_eq!(extract_authors(&document), vec!["Minh Anh", "Hoàng Long"]);
        let published = extract_published(&document).unwrap();
        assert_eq!(published.to_rfc3339(), "2024-09-07T03:00:00+00:00");
    }

    #[test]
    fn test_no_metadata() {
        let document = Html::parse_document("<p>Không có metadata</p>");
        assert!(extract_authors(&document).is_empty());
        assert!(extract_published(&document).is_none());
    }
}
