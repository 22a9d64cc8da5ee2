use crate::utils::{clean_text, truncate_for_log};
use itertools::Itertools;
use reqwest::Client;
use scraper::{Html, Selector};
use tracing::{debug, instrument, warn};

/// Paragraph containers tried in order, from most to least specific.
const CONTENT_SELECTORS: &[&str] = &[
    "article p",
    ".article-content p",
    ".post-content p",
    ".entry-content p",
    ".content p",
    "#content p",
];

/// A paragraph must be strictly longer than this (in chars) to count.
pub const MIN_PARAGRAPH_CHARS: usize = 50;

/// Stop trying selectors once this many paragraphs have been collected.
pub const TARGET_PARAGRAPHS: usize = 5;

/// Fetch an article page and return its body text, or `""` on any failure.
#[instrument(level = "debug", skip(client))]
pub async fn fetch_full_content(client: &Client, url: &str) -> String {
    let resp = match client.get(url).send().await {
        Ok(resp) => resp,
        Err(e) => {
            warn!(error = %e, "Article fetch failed");
            return String::new();
        }
    };

    let status = resp.status();
    if !status.is_success() {
        debug!(%status, "Article fetch returned non-success status");
        return String::new();
    }

    let body = match resp.text().await {
        Ok(body) => body,
        Err(e) => {
            warn!(error = %e, "Article body read failed");
            return String::new();
        }
    };

    let paragraphs = extract_paragraphs(&body);
    let content = paragraphs.iter().join("\n\n");
    debug!(
        paragraphs = paragraphs.len(),
        chars = content.chars().count(),
        preview = %truncate_for_log(&content, 120),
        "Extracted article content"
    );
    content
}

/// Collect qualifying paragraphs from an HTML page.
///
/// Selectors run in order and their hits accumulate; the scan stops after the
/// first selector that brings the running total to [`TARGET_PARAGRAPHS`].
/// A paragraph matched by two selectors is collected twice.
pub fn extract_paragraphs(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let mut paragraphs = Vec::<String>::new();

    for sel in CONTENT_SELECTORS.iter().filter_map(|s| Selector::parse(s).ok()) {
        for node in document.select(&sel) {
            let text = clean_text(&node.text().collect::<String>());
            if text.chars().count() > MIN_PARAGRAPH_CHARS {
                paragraphs.push(text);
            }
        }
        if paragraphs.len() >= TARGET_PARAGRAPHS {
            break;
        }
    }

    paragraphs
}
