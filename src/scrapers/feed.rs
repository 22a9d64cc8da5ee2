//! Minimal RSS 2.0 / RSS 1.0 / Atom reader built on quick-xml events.
//!
//! Only the per-entry fields the scraper needs are kept. Text is returned
//! raw (entity-decoded, whitespace untouched); cleaning happens upstream.

use crate::utils::{BoxError, clean_text, parse_timestamp, to_iso_millis};
use once_cell::sync::Lazy;
use quick_xml::events::{BytesStart, Event};
use quick_xml::{Reader, escape};
use regex::Regex;
use std::borrow::Cow;
use tracing::{debug, warn};

/// One `<item>` / `<entry>` as it appeared in the document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedEntry {
    pub title: Option<String>,
    pub link: Option<String>,
    pub guid: Option<String>,
    /// First parseable date among pubDate, dc:date, published, updated,
    /// rendered as `YYYY-MM-DDTHH:MM:SS.mmmZ`.
    pub iso_date: Option<String>,
    pub pub_date: Option<String>,
    pub dc_date: Option<String>,
    pub published: Option<String>,
    pub updated: Option<String>,
    pub content_encoded: Option<String>,
    pub content: Option<String>,
    pub summary: Option<String>,
    /// `content` with markup stripped.
    pub content_snippet: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Title,
    Link,
    Guid,
    PubDate,
    DcDate,
    Published,
    Updated,
    ContentEncoded,
    Content,
    Summary,
}

impl Field {
    fn from_tag(name: &[u8]) -> Option<Self> {
        match name {
            b"title" => Some(Self::Title),
            b"link" => Some(Self::Link),
            b"guid" | b"id" => Some(Self::Guid),
            b"pubdate" => Some(Self::PubDate),
            b"dc:date" => Some(Self::DcDate),
            b"published" => Some(Self::Published),
            b"updated" => Some(Self::Updated),
            b"content:encoded" => Some(Self::ContentEncoded),
            b"content" | b"description" => Some(Self::Content),
            b"summary" => Some(Self::Summary),
            _ => None,
        }
    }

    fn slot(self, entry: &mut FeedEntry) -> &mut Option<String> {
        match self {
            Self::Title => &mut entry.title,
            Self::Link => &mut entry.link,
            Self::Guid => &mut entry.guid,
            Self::PubDate => &mut entry.pub_date,
            Self::DcDate => &mut entry.dc_date,
            Self::Published => &mut entry.published,
            Self::Updated => &mut entry.updated,
            Self::ContentEncoded => &mut entry.content_encoded,
            Self::Content => &mut entry.content,
            Self::Summary => &mut entry.summary,
        }
    }
}

/// Text being collected for the current field. `field: None` swallows the
/// element body without storing it.
struct Capture {
    field: Option<Field>,
    depth: usize,
    text: String,
}

static RE_TAGS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<[^>]*>").unwrap());

/// Parse a feed document into its entries, in document order.
///
/// Errors on malformed XML or when the root element is not `rss`, `feed`
/// or `rdf:RDF`.
pub fn parse_feed(xml: &[u8]) -> Result<Vec<FeedEntry>, BoxError> {
    let mut reader = Reader::from_reader(xml);

    let mut buf = Vec::<u8>::new();
    let mut root_seen = false;
    let mut entries = Vec::<FeedEntry>::new();
    let mut current: Option<FeedEntry> = None;
    let mut capture: Option<Capture> = None;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => {
                let name = e.name().as_ref().to_ascii_lowercase();
                if !root_seen {
                    if !matches!(name.as_slice(), b"rss" | b"feed" | b"rdf:rdf") {
                        return Err(format!(
                            "not a feed document (root <{}>)",
                            String::from_utf8_lossy(&name)
                        )
                        .into());
                    }
                    root_seen = true;
                } else if let Some(cap) = capture.as_mut() {
                    cap.depth += 1;
                } else if let Some(entry) = current.as_mut() {
                    // <link href="..."></link> already carried its value; skip the body.
                    let atom_link = name.as_slice() == b"link" && take_atom_link(&e, entry);
                    let field = if atom_link { None } else { Field::from_tag(&name) };
                    if atom_link || field.is_some() {
                        capture = Some(Capture {
                            field,
                            depth: 0,
                            text: String::new(),
                        });
                    }
                } else if matches!(name.as_slice(), b"item" | b"entry") {
                    current = Some(FeedEntry::default());
                }
            }
            Event::Empty(e) => {
                if capture.is_none() {
                    if let Some(entry) = current.as_mut() {
                        if e.name().as_ref().eq_ignore_ascii_case(b"link") {
                            take_atom_link(&e, entry);
                        }
                    }
                }
            }
            Event::End(e) => {
                let name = e.name().as_ref().to_ascii_lowercase();
                if let Some(cap) = capture.as_mut() {
                    if cap.depth > 0 {
                        cap.depth -= 1;
                    } else if let Some(cap) = capture.take() {
                        if let (Some(field), Some(entry)) = (cap.field, current.as_mut()) {
                            let slot = field.slot(entry);
                            if slot.is_none() {
                                *slot = Some(cap.text);
                            }
                        }
                    }
                } else if matches!(name.as_slice(), b"item" | b"entry") {
                    if let Some(entry) = current.take() {
                        entries.push(finish_entry(entry));
                    }
                }
            }
            Event::Text(t) => {
                if let Some(cap) = capture.as_mut() {
                    cap.text.push_str(&unescape_lossy(&String::from_utf8_lossy(t.as_ref())));
                }
            }
            Event::CData(c) => {
                if let Some(cap) = capture.as_mut() {
                    cap.text.push_str(&String::from_utf8_lossy(c.as_ref()));
                }
            }
            Event::GeneralRef(r) => {
                if let Some(cap) = capture.as_mut() {
                    let reference = format!("&{};", String::from_utf8_lossy(r.as_ref()));
                    cap.text.push_str(&unescape_lossy(&reference));
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if !root_seen {
        return Err("empty feed document".into());
    }

    debug!(entries = entries.len(), "Parsed feed document");
    Ok(entries)
}

/// Record an Atom `<link href>` on the entry. Returns true when the element
/// carried an `href`, i.e. it is an Atom link rather than an RSS text link.
fn take_atom_link(e: &BytesStart<'_>, entry: &mut FeedEntry) -> bool {
    let mut href = None;
    let mut rel = None;
    for attr in e.attributes().flatten() {
        let value = unescape_lossy(&String::from_utf8_lossy(&attr.value)).into_owned();
        match attr.key.as_ref() {
            b"href" => href = Some(value),
            b"rel" => rel = Some(value),
            _ => {}
        }
    }

    let Some(href) = href else {
        return false;
    };
    let is_alternate = rel.as_deref().is_none_or(|r| r == "alternate");
    if is_alternate && entry.link.is_none() {
        entry.link = Some(href);
    }
    true
}

fn unescape_lossy(raw: &str) -> Cow<'_, str> {
    match escape::unescape(raw) {
        Ok(cow) => cow,
        Err(e) => {
            warn!(error = %e, "Unescape failed; keeping raw text");
            Cow::Borrowed(raw)
        }
    }
}

fn finish_entry(mut entry: FeedEntry) -> FeedEntry {
    entry.iso_date = [&entry.pub_date, &entry.dc_date, &entry.published, &entry.updated]
        .into_iter()
        .flatten()
        .find_map(|raw| parse_timestamp(raw))
        .map(|dt| to_iso_millis(&dt));

    entry.content_snippet = entry
        .content
        .as_deref()
        .map(|html| clean_text(&RE_TAGS.replace_all(html, " ")))
        .filter(|s| !s.is_empty());

    entry
}
