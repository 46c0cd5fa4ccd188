use std::io::Cursor;

use feed_rs::model::{Entry, Feed, FeedType};
use feed_rs::parser;

use crate::app::{Result, RunnelError};
use crate::document::{
    json, AtomDocument, AtomEntry, AtomLink, Enclosure, FeedDocument, RssDocument, RssItem,
};

const MEDIA_RSS_NS: &str = "http://search.yahoo.com/mrss/";

pub(super) fn parse(body: &[u8]) -> Result<FeedDocument> {
    let feed = parser::parse(body).map_err(|e| RunnelError::Decode(e.to_string()))?;

    let doc = match feed.feed_type {
        FeedType::RSS0 | FeedType::RSS1 | FeedType::RSS2 => {
            FeedDocument::Rss(rss_document(feed, body))
        }
        FeedType::Atom => FeedDocument::Atom(atom_document(feed)),
        FeedType::JSON => FeedDocument::Json(json::parse(body)?),
    };

    Ok(doc)
}

/// Per-item media as written in the document: the `<enclosure>` and the
/// `media:content` URLs, kept apart.
#[derive(Debug, Default)]
struct ItemMedia {
    enclosure: Option<Enclosure>,
    media_contents: Vec<String>,
}

fn rss_document(feed: Feed, body: &[u8]) -> RssDocument {
    let mut media = item_media(body, feed.entries.len());

    RssDocument {
        image_url: feed.logo.map(|image| image.uri),
        items: feed
            .entries
            .into_iter()
            .enumerate()
            .map(|(idx, entry)| {
                let media = match media.as_mut() {
                    Some(media) => std::mem::take(&mut media[idx]),
                    None => folded_media(&entry),
                };
                rss_item(entry, media)
            })
            .collect(),
    }
}

/// Re-read the channel with the `rss` crate, which keeps `<enclosure>` apart
/// from the `media` extension. feed-rs folds both into one list.
///
/// Returns `None` when the channel cannot be read or its items do not line up
/// one-to-one with the entries feed-rs produced.
fn item_media(body: &[u8], expected: usize) -> Option<Vec<ItemMedia>> {
    let channel = match rss::Channel::read_from(Cursor::new(body)) {
        Ok(channel) => channel,
        Err(e) => {
            tracing::debug!("rss reader could not read channel: {}", e);
            return None;
        }
    };

    if channel.items().len() != expected {
        tracing::debug!(
            "rss reader saw {} items, feed-rs saw {}",
            channel.items().len(),
            expected
        );
        return None;
    }

    let prefix = channel
        .namespaces()
        .iter()
        .find(|(_, uri)| uri.as_str() == MEDIA_RSS_NS)
        .map(|(prefix, _)| prefix.as_str())
        .unwrap_or("media");

    let media = channel
        .items()
        .iter()
        .map(|item| ItemMedia {
            enclosure: item.enclosure().map(|enc| Enclosure {
                url: enc.url().to_string(),
                mime_type: Some(enc.mime_type().trim())
                    .filter(|m| !m.is_empty())
                    .map(String::from),
            }),
            media_contents: item
                .extensions()
                .get(prefix)
                .and_then(|ext| ext.get("content"))
                .into_iter()
                .flatten()
                .filter_map(|content| content.attrs().get("url").cloned())
                .collect(),
        })
        .collect();

    Some(media)
}

// Without the split view every media URL counts as `media:content`.
fn folded_media(entry: &Entry) -> ItemMedia {
    ItemMedia {
        enclosure: None,
        media_contents: entry
            .media
            .iter()
            .flat_map(|media| &media.content)
            .filter_map(|content| content.url.as_ref().map(|u| u.to_string()))
            .collect(),
    }
}

fn rss_item(entry: Entry, media: ItemMedia) -> RssItem {
    RssItem {
        title: entry.title.map(|t| t.content),
        link: entry.links.into_iter().next().map(|l| l.href),
        description: entry.summary.map(|s| s.content),
        content_encoded: entry.content.and_then(|c| c.body),
        pub_date: entry.published,
        enclosure: media.enclosure,
        media_contents: media.media_contents,
    }
}

fn atom_document(feed: Feed) -> AtomDocument {
    AtomDocument {
        icon: feed.icon.map(|image| image.uri),
        logo: feed.logo.map(|image| image.uri),
        entries: feed
            .entries
            .into_iter()
            .map(|entry| AtomEntry {
                title: entry.title.map(|t| t.content),
                links: entry
                    .links
                    .into_iter()
                    .map(|l| AtomLink {
                        href: l.href,
                        media_type: l.media_type,
                    })
                    .collect(),
                summary: entry.summary.map(|s| s.content),
                content: entry.content.and_then(|c| c.body),
                updated: entry.updated,
            })
            .collect(),
    }
}
