//! Typed feed documents.
//!
//! Raw bytes are decoded into exactly one of three document shapes, each
//! carrying the fields the normalizer maps. XML formats (RSS 0.9x/1.0/2.0 and
//! Atom) go through `feed-rs`, with RSS item media re-read by the `rss` crate
//! so `<enclosure>` and `media:content` stay distinct. JSON Feed is decoded
//! directly with `serde_json` so its `image` and `content_html` fields survive
//! intact.

mod json;
mod xml;

use chrono::{DateTime, Utc};

use crate::app::Result;

#[derive(Debug, Clone, PartialEq)]
pub enum FeedDocument {
    Rss(RssDocument),
    Atom(AtomDocument),
    Json(JsonDocument),
}

/// Discriminant of [`FeedDocument`], handy for logging and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedKind {
    Rss,
    Atom,
    Json,
}

impl FeedKind {
    pub const ALL: [FeedKind; 3] = [FeedKind::Rss, FeedKind::Atom, FeedKind::Json];
}

impl FeedDocument {
    pub fn kind(&self) -> FeedKind {
        match self {
            FeedDocument::Rss(_) => FeedKind::Rss,
            FeedDocument::Atom(_) => FeedKind::Atom,
            FeedDocument::Json(_) => FeedKind::Json,
        }
    }

    /// Feed-level icon: Atom `icon` then `logo`, RSS `<image><url>`,
    /// JSON Feed `favicon` then `icon`.
    pub fn icon_url(&self) -> Option<&str> {
        match self {
            FeedDocument::Rss(doc) => doc.image_url.as_deref(),
            FeedDocument::Atom(doc) => doc.icon.as_deref().or(doc.logo.as_deref()),
            FeedDocument::Json(doc) => doc.favicon.as_deref().or(doc.icon.as_deref()),
        }
    }

    pub fn entry_count(&self) -> usize {
        match self {
            FeedDocument::Rss(doc) => doc.items.len(),
            FeedDocument::Atom(doc) => doc.entries.len(),
            FeedDocument::Json(doc) => doc.items.len(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RssDocument {
    pub image_url: Option<String>,
    pub items: Vec<RssItem>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RssItem {
    pub title: Option<String>,
    pub link: Option<String>,
    pub description: Option<String>,
    /// `content:encoded`
    pub content_encoded: Option<String>,
    pub pub_date: Option<DateTime<Utc>>,
    pub enclosure: Option<Enclosure>,
    /// `media:content` URLs in document order.
    pub media_contents: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Enclosure {
    pub url: String,
    pub mime_type: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AtomDocument {
    pub icon: Option<String>,
    pub logo: Option<String>,
    pub entries: Vec<AtomEntry>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AtomEntry {
    pub title: Option<String>,
    pub links: Vec<AtomLink>,
    pub summary: Option<String>,
    pub content: Option<String>,
    pub updated: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AtomLink {
    pub href: String,
    pub media_type: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct JsonDocument {
    pub icon: Option<String>,
    pub favicon: Option<String>,
    pub items: Vec<JsonItem>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct JsonItem {
    pub title: Option<String>,
    pub url: Option<String>,
    pub summary: Option<String>,
    pub content_html: Option<String>,
    pub image: Option<String>,
    pub date_published: Option<DateTime<Utc>>,
}

/// Decode a fetched body into a typed document.
pub fn parse(body: &[u8]) -> Result<FeedDocument> {
    if json::looks_like_json(body) {
        return json::parse(body).map(FeedDocument::Json);
    }
    xml::parse(body)
}
