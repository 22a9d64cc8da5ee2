use crate::models::{NewsItem, SourceDescriptor};
use crate::scrapers::CLIENT;
use crate::scrapers::content::fetch_full_content;
use crate::scrapers::feed::{FeedEntry, parse_feed};
use crate::utils::{BoxError, clean_text};
use futures::stream::{self, StreamExt};
use reqwest::Client;
use std::future::Future;
use tracing::{debug, error, info, instrument};
use url::Url;

/// Extracted article text shorter than this (in chars) is replaced by
/// whatever the feed itself embeds.
pub const MIN_CONTENT_CHARS: usize = 100;

type Accessor = fn(&FeedEntry) -> Option<&str>;

/// Where an item's date comes from, in priority order.
const DATE_FIELDS: &[Accessor] = &[iso_date, pub_date, dc_date, published];

/// Embedded feed text used when the article page yields too little.
const CONTENT_FALLBACKS: &[Accessor] = &[content_encoded, content, summary, content_snippet];

const LINK_FIELDS: &[Accessor] = &[link, guid];

fn iso_date(e: &FeedEntry) -> Option<&str> {
    e.iso_date.as_deref()
}

fn pub_date(e: &FeedEntry) -> Option<&str> {
    e.pub_date.as_deref()
}

fn dc_date(e: &FeedEntry) -> Option<&str> {
    e.dc_date.as_deref()
}

fn published(e: &FeedEntry) -> Option<&str> {
    e.published.as_deref()
}

fn content_encoded(e: &FeedEntry) -> Option<&str> {
    e.content_encoded.as_deref()
}

fn content(e: &FeedEntry) -> Option<&str> {
    e.content.as_deref()
}

fn summary(e: &FeedEntry) -> Option<&str> {
    e.summary.as_deref()
}

fn content_snippet(e: &FeedEntry) -> Option<&str> {
    e.content_snippet.as_deref()
}

fn link(e: &FeedEntry) -> Option<&str> {
    e.link.as_deref()
}

fn guid(e: &FeedEntry) -> Option<&str> {
    e.guid.as_deref()
}

/// Turns one configured source into the items currently in its feed.
///
/// Implementations never fail: a source that cannot be read yields no items.
pub trait Scrape {
    fn scrape(&self, source: &SourceDescriptor) -> impl Future<Output = Vec<NewsItem>> + Send;
}

/// Scraper for RSS/Atom feeds that follows each item's link for full text.
#[derive(Debug, Clone)]
pub struct RssScraper {
    client: Client,
}

impl RssScraper {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    async fn build_item(&self, entry: FeedEntry, source: &SourceDescriptor) -> Option<NewsItem> {
        let (title, link) = title_and_link(&entry, &source.url)?;
        let extracted = fetch_full_content(&self.client, &link).await;
        Some(assemble_item(&entry, title, link, extracted, &source.name))
    }
}

impl Default for RssScraper {
    fn default() -> Self {
        Self::new(CLIENT.clone())
    }
}

impl Scrape for RssScraper {
    #[instrument(level = "info", skip_all, fields(source = %source.name))]
    async fn scrape(&self, source: &SourceDescriptor) -> Vec<NewsItem> {
        info!(url = %source.url, "Fetching feed");

        let entries = match fetch_feed(&self.client, &source.url).await {
            Ok(entries) => entries,
            Err(e) => {
                error!(url = %source.url, error = %e, "Failed to fetch feed");
                return Vec::new();
            }
        };
        debug!(entries = entries.len(), "Feed parsed");

        let items: Vec<NewsItem> = stream::iter(entries)
            .filter_map(move |entry| self.build_item(entry, source))
            .collect()
            .await;

        info!(count = items.len(), "Extracted items with full content");
        items
    }
}

#[instrument(level = "debug", skip(client))]
async fn fetch_feed(client: &Client, url: &str) -> Result<Vec<FeedEntry>, BoxError> {
    let resp = client.get(url).send().await?.error_for_status()?;
    let bytes = resp.bytes().await?;
    parse_feed(&bytes)
}

fn first_non_empty(fields: &[Accessor], entry: &FeedEntry) -> Option<String> {
    fields
        .iter()
        .filter_map(|get| get(entry))
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

/// Cleaned title and absolute link, or `None` when either is missing.
pub fn title_and_link(entry: &FeedEntry, feed_url: &str) -> Option<(String, String)> {
    let title = clean_text(entry.title.as_deref().unwrap_or_default());
    let link = clean_text(&first_non_empty(LINK_FIELDS, entry).unwrap_or_default());
    if title.is_empty() || link.is_empty() {
        return None;
    }
    Some((title, resolve_link(feed_url, link)))
}

/// Path-like links are resolved against the feed URL. Anything else, absolute
/// URLs and opaque ids such as non-permalink guids, is kept as is.
fn resolve_link(feed_url: &str, link: String) -> String {
    let path_like = ["/", "./", "../"].iter().any(|p| link.starts_with(p));
    if !path_like {
        return link;
    }
    Url::parse(feed_url)
        .and_then(|base| base.join(&link))
        .map(|u| u.to_string())
        .unwrap_or(link)
}

/// First non-empty date field, or `""` when the entry carries none.
pub fn pick_date(entry: &FeedEntry) -> String {
    first_non_empty(DATE_FIELDS, entry).unwrap_or_default()
}

/// Keep extracted article text when it is long enough, otherwise fall back to
/// the first non-empty embedded field. Short extracted text is discarded.
pub fn choose_content(extracted: String, entry: &FeedEntry) -> String {
    if extracted.chars().count() >= MIN_CONTENT_CHARS {
        return extracted;
    }
    CONTENT_FALLBACKS
        .iter()
        .filter_map(|get| get(entry))
        .map(clean_text)
        .find(|s| !s.is_empty())
        .unwrap_or_default()
}

pub fn assemble_item(
    entry: &FeedEntry,
    title: String,
    link: String,
    extracted: String,
    source_name: &str,
) -> NewsItem {
    NewsItem {
        title,
        link,
        content: choose_content(extracted, entry),
        date: pick_date(entry),
        source: source_name.to_string(),
    }
}
