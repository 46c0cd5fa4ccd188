use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::app::{Result, RunnelError};
use crate::document::{JsonDocument, JsonItem};

#[derive(Deserialize)]
struct RawFeed {
    #[serde(default)]
    icon: Option<String>,
    #[serde(default)]
    favicon: Option<String>,
    #[serde(default)]
    items: Vec<RawItem>,
}

#[derive(Deserialize)]
struct RawItem {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    content_html: Option<String>,
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    date_published: Option<String>,
}

/// JSON Feed documents are objects; anything starting with `{` is routed here.
pub(super) fn looks_like_json(body: &[u8]) -> bool {
    let body = body.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(body);
    body.iter()
        .find(|b| !b.is_ascii_whitespace())
        .is_some_and(|b| *b == b'{')
}

pub(super) fn parse(body: &[u8]) -> Result<JsonDocument> {
    let body = body.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(body);
    let raw: RawFeed =
        serde_json::from_slice(body).map_err(|e| RunnelError::Decode(e.to_string()))?;

    let items = raw
        .items
        .into_iter()
        .map(|item| JsonItem {
            title: item.title,
            url: item.url,
            summary: item.summary,
            content_html: item.content_html,
            image: item.image,
            // An unparseable date is treated like a missing one.
            date_published: item.date_published.as_deref().and_then(parse_date),
        })
        .collect();

    Ok(JsonDocument {
        icon: raw.icon,
        favicon: raw.favicon,
        items,
    })
}

fn parse_date(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
}
