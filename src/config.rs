//! Source list and fixed tuning values.
//!
//! Sources come from a YAML file when one is given, otherwise from the
//! built-in list below. The file is a plain sequence:
//!
//! ```yaml
//! - name: BBC News
//!   url: https://feeds.bbci.co.uk/news/rss.xml
//! - name: NPR
//!   url: https://feeds.npr.org/1001/rss.xml
//! ```

use crate::models::SourceDescriptor;
use crate::utils::BoxError;
use std::time::Duration;
use tracing::{info, instrument};

/// Per-request timeout for both feed and article fetches.
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(15);

/// Default period between scheduled cycles (3 minutes).
pub const DEFAULT_INTERVAL_SECS: u64 = 180;

/// Watermark assumed for a source that has never yielded a dated item.
pub const EPOCH_WATERMARK: &str = "1970-01-01T00:00:00Z";

pub const ARCHIVE_FILE: &str = "all_news.json";
pub const WATERMARK_FILE: &str = "last_dates.json";

const DEFAULT_SOURCES: &[(&str, &str)] = &[
    ("BBC News", "https://feeds.bbci.co.uk/news/rss.xml"),
    ("NPR", "https://feeds.npr.org/1001/rss.xml"),
    ("Al Jazeera", "https://www.aljazeera.com/xml/rss/all.xml"),
    ("The Guardian World", "https://www.theguardian.com/world/rss"),
];

pub fn default_sources() -> Vec<SourceDescriptor> {
    DEFAULT_SOURCES
        .iter()
        .map(|(name, url)| SourceDescriptor::new(name, url))
        .collect()
}

/// Load the source list from a YAML file.
#[instrument(level = "info")]
pub async fn load_sources(path: &str) -> Result<Vec<SourceDescriptor>, BoxError> {
    let raw = tokio::fs::read_to_string(path).await?;
    let sources = parse_sources(&raw)?;
    info!(count = sources.len(), "Loaded sources");
    Ok(sources)
}

fn parse_sources(raw: &str) -> Result<Vec<SourceDescriptor>, BoxError> {
    let sources: Vec<SourceDescriptor> = serde_yaml::from_str(raw)?;
    if let Some(bad) = sources
        .iter()
        .find(|s| s.name.trim().is_empty() || s.url.trim().is_empty())
    {
        return Err(format!("source entry has an empty name or url: {bad:?}").into());
    }
    Ok(sources)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_sources_are_well_formed() {
        let sources = default_sources();
        assert!(!sources.is_empty());
        for s in &sources {
            assert!(!s.name.is_empty());
            assert!(url::Url::parse(&s.url).is_ok(), "bad url {}", s.url);
        }
    }

    #[test]
    fn test_parse_sources_keeps_order() {
        let yaml = "- name: Zeta\n  url: https://z.example/rss\n- name: Alpha\n  url: https://a.example/rss\n";
        let sources = parse_sources(yaml).unwrap();
        assert_eq!(sources.len(), 2);
        assert_eq!(sources[0].name, "Zeta");
        assert_eq!(sources[1].name, "Alpha");
    }

    #[test]
    fn test_parse_sources_rejects_empty_url() {
        let yaml = "- name: Zeta\n  url: ''\n";
        assert!(parse_sources(yaml).is_err());
    }

    #[test]
    fn test_parse_sources_rejects_malformed_yaml() {
        assert!(parse_sources("name: [unterminated").is_err());
    }

    #[tokio::test]
    async fn test_load_sources_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("sources.yaml");
        std::fs::write(&path, "- name: Acme Times\n  url: https://acme.example/rss\n").unwrap();

        let sources = load_sources(path.to_str().unwrap()).await.unwrap();
        assert_eq!(sources, vec![SourceDescriptor::new("Acme Times", "https://acme.example/rss")]);
    }
}
