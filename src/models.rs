use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A feed to poll, as listed in the sources configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SourceDescriptor {
    pub name: String,
    pub url: String,
}

impl SourceDescriptor {
    pub fn new(name: &str, url: &str) -> Self {
        Self {
            name: name.to_string(),
            url: url.to_string(),
        }
    }
}

/// One archived article.
///
/// `date` is kept exactly as the feed published it (after normalisation by the
/// feed parser); it is compared both as a timestamp and as a raw string.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct NewsItem {
    pub title: String,
    pub link: String,
    pub content: String,
    #[serde(default)]
    pub date: String,
    pub source: String,
}

impl NewsItem {
    pub fn has_date(&self) -> bool {
        !self.date.is_empty()
    }
}

/// Append-only list of every item ever accepted, in discovery order.
pub type Archive = Vec<NewsItem>;

/// Source name -> latest accepted `date` string for that source.
pub type WatermarkMap = BTreeMap<String, String>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_news_item_serialization_field_names() {
        let item = NewsItem {
            title: "Headline".to_string(),
            link: "https://example.com/a".to_string(),
            content: "Body".to_string(),
            date: "2024-01-02T00:00:00Z".to_string(),
            source: "Acme Times".to_string(),
        };

        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["title"], "Headline");
        assert_eq!(json["link"], "https://example.com/a");
        assert_eq!(json["content"], "Body");
        assert_eq!(json["date"], "2024-01-02T00:00:00Z");
        assert_eq!(json["source"], "Acme Times");
    }

    #[test]
    fn test_news_item_missing_date_deserializes_empty() {
        let json = r#"{
            "title": "t",
            "link": "https://example.com",
            "content": "",
            "source": "s"
        }"#;

        let item: NewsItem = serde_json::from_str(json).unwrap();
        assert!(!item.has_date());
    }

    #[test]
    fn test_watermark_map_serializes_as_object() {
        let mut marks = WatermarkMap::new();
        marks.insert("Acme Times".to_string(), "2024-01-01T00:00:00Z".to_string());

        let json = serde_json::to_string(&marks).unwrap();
        assert_eq!(json, r#"{"Acme Times":"2024-01-01T00:00:00Z"}"#);
    }

    #[test]
    fn test_source_descriptor_from_yaml() {
        let yaml = "name: Acme Times\nurl: https://acme.example/rss\n";
        let source: SourceDescriptor = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(source, SourceDescriptor::new("Acme Times", "https://acme.example/rss"));
    }
}
