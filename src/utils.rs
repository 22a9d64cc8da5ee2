use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use itertools::Itertools;
use sha2::{Digest, Sha256};
use std::error::Error;

/// Error type threaded through fetch, parse and persistence paths.
pub type BoxError = Box<dyn Error + Send + Sync>;

/// Collapse every run of whitespace (including non-breaking spaces) to a
/// single space and trim both ends.
pub fn clean_text(s: &str) -> String {
    s.split_whitespace().join(" ")
}

/// Truncate a string for logging purposes
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
}

/// Parse a feed date into a UTC instant.
///
/// Accepts RFC 3339, RFC 2822 and the naive `YYYY-MM-DD[ T]HH:MM:SS` /
/// `YYYY-MM-DD` shapes (read as UTC). Anything else is `None`.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Render an instant the way feed dates are normalised: `2024-01-02T00:00:00.000Z`.
pub fn to_iso_millis(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Stable identity for an item: hex SHA-256 of `title||link`.
pub fn item_hash(title: &str, link: &str) -> String {
    let digest = Sha256::digest(format!("{title}||{link}").as_bytes());
    format!("{digest:x}")
}
