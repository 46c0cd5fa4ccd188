pub mod image;

use html_escape::decode_html_entities;
use url::Url;
use uuid::Uuid;

use crate::app::Result;
use crate::document::{self, AtomEntry, FeedDocument, JsonItem, RssItem};
use crate::domain::{sort_newest_first, Item};

use self::image::{first_img_src, resolve};

/// Items and feed-level metadata from one fetched document.
#[derive(Debug, Clone)]
pub struct NormalizedFeed {
    pub icon_url: Option<Url>,
    pub items: Vec<Item>,
}

#[derive(Clone)]
pub struct Normalizer;

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Normalizer {
    pub fn new() -> Self {
        Self
    }

    /// Decode `body` and normalize its entries.
    pub fn normalize_bytes(&self, source_id: Option<Uuid>, body: &[u8]) -> Result<NormalizedFeed> {
        let doc = document::parse(body)?;
        tracing::debug!("Decoded {:?} document with {} entries", doc.kind(), doc.entry_count());

        let icon_url = doc.icon_url().and_then(|icon| resolve(icon, None));
        let items = self.normalize(doc, source_id);

        Ok(NormalizedFeed { icon_url, items })
    }

    /// Map a document's entries to items, newest first.
    ///
    /// Entries without a title or without their format's date are dropped.
    pub fn normalize(&self, doc: FeedDocument, source_id: Option<Uuid>) -> Vec<Item> {
        let mut items: Vec<Item> = match doc {
            FeedDocument::Rss(rss) => rss
                .items
                .into_iter()
                .filter_map(|entry| rss_item(entry, source_id))
                .collect(),
            FeedDocument::Atom(atom) => atom
                .entries
                .into_iter()
                .filter_map(|entry| atom_item(entry, source_id))
                .collect(),
            FeedDocument::Json(json) => json
                .items
                .into_iter()
                .filter_map(|entry| json_item(entry, source_id))
                .collect(),
        };

        sort_newest_first(&mut items);
        items
    }
}

fn rss_item(entry: RssItem, source_id: Option<Uuid>) -> Option<Item> {
    let title = entry.title?;
    let published_at = entry.pub_date?;
    let link = entry.link.as_deref().and_then(parse_link);

    let image_url = entry
        .enclosure
        .as_ref()
        .filter(|enc| is_image_type(enc.mime_type.as_deref()))
        .and_then(|enc| resolve(&enc.url, link.as_ref()))
        .or_else(|| {
            entry
                .media_contents
                .first()
                .and_then(|url| resolve(url, link.as_ref()))
        })
        .or_else(|| scan(entry.content_encoded.as_deref(), link.as_ref()))
        .or_else(|| scan(entry.description.as_deref(), link.as_ref()));

    let mut item = Item::new(decode_title(&title), published_at, source_id);
    item.summary = entry.description.unwrap_or_default();
    item.link = link;
    item.image_url = image_url;
    Some(item)
}

fn atom_item(entry: AtomEntry, source_id: Option<Uuid>) -> Option<Item> {
    let title = entry.title?;
    let published_at = entry.updated?;
    let link = entry.links.first().and_then(|l| parse_link(&l.href));

    let image_url = entry
        .links
        .iter()
        .find(|l| is_image_type(l.media_type.as_deref()))
        .and_then(|l| resolve(&l.href, link.as_ref()))
        .or_else(|| scan(entry.content.as_deref(), link.as_ref()))
        .or_else(|| scan(entry.summary.as_deref(), link.as_ref()));

    let mut item = Item::new(decode_title(&title), published_at, source_id);
    item.summary = entry.summary.unwrap_or_default();
    item.link = link;
    item.image_url = image_url;
    Some(item)
}

fn json_item(entry: JsonItem, source_id: Option<Uuid>) -> Option<Item> {
    let title = entry.title?;
    let published_at = entry.date_published?;
    let link = entry.url.as_deref().and_then(parse_link);

    let image_url = entry
        .image
        .as_deref()
        .and_then(|url| resolve(url, link.as_ref()))
        .or_else(|| scan(entry.content_html.as_deref(), link.as_ref()))
        .or_else(|| scan(entry.summary.as_deref(), link.as_ref()));

    let mut item = Item::new(decode_title(&title), published_at, source_id);
    item.summary = entry.summary.unwrap_or_default();
    item.link = link;
    item.image_url = image_url;
    Some(item)
}

/// Item links must be absolute; anything else counts as no link.
fn parse_link(raw: &str) -> Option<Url> {
    Url::parse(raw.trim()).ok()
}

fn scan(html: Option<&str>, base: Option<&Url>) -> Option<Url> {
    html.and_then(|h| first_img_src(h, base))
}

fn is_image_type(mime: Option<&str>) -> bool {
    mime.is_some_and(|m| m.trim().to_ascii_lowercase().starts_with("image/"))
}

fn decode_title(title: &str) -> String {
    decode_html_entities(title.trim()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{AtomDocument, AtomLink, Enclosure, JsonDocument, RssDocument};
    use chrono::{DateTime, TimeZone, Utc};

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, hour, 0, 0).unwrap()
    }

    fn rss(items: Vec<RssItem>) -> FeedDocument {
        FeedDocument::Rss(RssDocument {
            image_url: None,
            items,
        })
    }

    fn rss_entry(title: &str, hour: u32) -> RssItem {
        RssItem {
            title: Some(title.into()),
            link: Some(format!("https://example.com/{title}")),
            pub_date: Some(at(hour)),
            ..Default::default()
        }
    }

    #[test]
    fn test_rss_drops_entries_missing_required_fields() {
        let mut untitled = rss_entry("a", 1);
        untitled.title = None;
        let mut undated = rss_entry("b", 1);
        undated.pub_date = None;

        let items = Normalizer::new().normalize(rss(vec![untitled, undated, rss_entry("c", 2)]), None);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "c");
    }

    #[test]
    fn test_output_sorted_newest_first() {
        let doc = rss(vec![rss_entry("t3", 3), rss_entry("t1", 1), rss_entry("t2", 2)]);
        let items = Normalizer::new().normalize(doc, None);
        let titles: Vec<_> = items.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["t3", "t2", "t1"]);
    }

    #[test]
    fn test_source_id_is_attached() {
        let source_id = Uuid::new_v4();
        let items = Normalizer::new().normalize(rss(vec![rss_entry("a", 1)]), Some(source_id));
        assert_eq!(items[0].source_id, Some(source_id));
    }

    #[test]
    fn test_malformed_link_is_absent() {
        let mut entry = rss_entry("a", 1);
        entry.link = Some("not a url".into());
        let items = Normalizer::new().normalize(rss(vec![entry]), None);
        assert_eq!(items[0].link, None);
        assert_eq!(items[0].stable_key(), "a");
    }

    #[test]
    fn test_summary_defaults_to_empty() {
        let items = Normalizer::new().normalize(rss(vec![rss_entry("a", 1)]), None);
        assert_eq!(items[0].summary, "");
    }

    #[test]
    fn test_title_entities_decoded() {
        let mut entry = rss_entry("a", 1);
        entry.title = Some("Fish &amp; Chips".into());
        let items = Normalizer::new().normalize(rss(vec![entry]), None);
        assert_eq!(items[0].title, "Fish & Chips");
    }

    #[test]
    fn test_rss_image_enclosure_wins() {
        let mut entry = rss_entry("a", 1);
        entry.enclosure = Some(Enclosure {
            url: "https://example.com/cover.jpg".into(),
            mime_type: Some("image/jpeg".into()),
        });
        entry.media_contents = vec!["https://example.com/media.jpg".into()];
        entry.description = Some(r#"<img src="https://example.com/desc.jpg">"#.into());

        let items = Normalizer::new().normalize(rss(vec![entry]), None);
        assert_eq!(
            items[0].image_url.as_ref().map(Url::as_str),
            Some("https://example.com/cover.jpg")
        );
    }

    #[test]
    fn test_rss_non_image_enclosure_falls_through_to_media() {
        let mut entry = rss_entry("a", 1);
        entry.enclosure = Some(Enclosure {
            url: "https://example.com/ep.mp3".into(),
            mime_type: Some("audio/mpeg".into()),
        });
        entry.media_contents = vec!["https://example.com/media.jpg".into()];

        let items = Normalizer::new().normalize(rss(vec![entry]), None);
        assert_eq!(
            items[0].image_url.as_ref().map(Url::as_str),
            Some("https://example.com/media.jpg")
        );
    }

    #[test]
    fn test_rss_content_encoded_before_description() {
        let mut entry = rss_entry("a", 1);
        entry.content_encoded = Some(r#"<img src="https://example.com/content.jpg">"#.into());
        entry.description = Some(r#"<img src="https://example.com/desc.jpg">"#.into());

        let items = Normalizer::new().normalize(rss(vec![entry]), None);
        assert_eq!(
            items[0].image_url.as_ref().map(Url::as_str),
            Some("https://example.com/content.jpg")
        );
    }

    #[test]
    fn test_rss_description_image_from_feed_bytes() {
        let body = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Feed</title>
    <link>https://example.com/</link>
    <description>d</description>
    <item>
      <title>Pictured</title>
      <link>https://example.com/p</link>
      <pubDate>Mon, 01 Jan 2024 00:00:00 GMT</pubDate>
      <description>text &lt;img src="http://y/p.png"&gt;</description>
    </item>
  </channel>
</rss>"#;
        let feed = Normalizer::new().normalize_bytes(None, body.as_bytes()).unwrap();
        assert_eq!(feed.items.len(), 1);
        assert_eq!(
            feed.items[0].image_url.as_ref().map(Url::as_str),
            Some("http://y/p.png")
        );
    }

    fn media_rss(item_body: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:media="http://search.yahoo.com/mrss/">
  <channel>
    <title>Feed</title>
    <link>https://example.com/</link>
    <description>d</description>
    <item>
      <title>Media</title>
      <link>https://example.com/m</link>
      <pubDate>Mon, 01 Jan 2024 00:00:00 GMT</pubDate>
      <description>text &lt;img src="https://example.com/desc.png"&gt;</description>
      {item_body}
    </item>
  </channel>
</rss>"#
        )
    }

    fn image_from_bytes(body: &str) -> Option<String> {
        let feed = Normalizer::new().normalize_bytes(None, body.as_bytes()).unwrap();
        assert_eq!(feed.items.len(), 1);
        feed.items[0].image_url.as_ref().map(|u| u.to_string())
    }

    #[test]
    fn test_rss_image_enclosure_beats_earlier_media_content() {
        let body = media_rss(
            r#"<media:content url="https://example.com/media.jpg" type="image/jpeg"/>
      <enclosure url="https://example.com/enc.png" length="10" type="image/png"/>"#,
        );
        assert_eq!(
            image_from_bytes(&body).as_deref(),
            Some("https://example.com/enc.png")
        );
    }

    #[test]
    fn test_rss_first_media_content_wins_regardless_of_type() {
        let body = media_rss(
            r#"<media:content url="https://example.com/clip.mp4" type="video/mp4"/>
      <media:content url="https://example.com/still.jpg" type="image/jpeg"/>"#,
        );
        assert_eq!(
            image_from_bytes(&body).as_deref(),
            Some("https://example.com/clip.mp4")
        );
    }

    #[test]
    fn test_rss_lone_typed_media_content_is_used() {
        let body = media_rss(
            r#"<media:content url="https://example.com/clip.mp4" type="video/mp4"/>"#,
        );
        assert_eq!(
            image_from_bytes(&body).as_deref(),
            Some("https://example.com/clip.mp4")
        );
    }

    #[test]
    fn test_rss_audio_enclosure_falls_through_to_media_from_bytes() {
        let body = media_rss(
            r#"<enclosure url="https://example.com/ep.mp3" length="10" type="audio/mpeg"/>
      <media:content url="https://example.com/cover.jpg" type="image/jpeg"/>"#,
        );
        assert_eq!(
            image_from_bytes(&body).as_deref(),
            Some("https://example.com/cover.jpg")
        );
    }

    #[test]
    fn test_atom_image_link_from_feed_bytes() {
        let body = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Atom</title>
  <id>urn:test</id>
  <updated>2024-01-01T00:00:00Z</updated>
  <entry>
    <title>Entry</title>
    <id>urn:test:1</id>
    <link type="image/jpeg" href="http://x/img.jpg"/>
    <updated>2024-01-01T00:00:00Z</updated>
  </entry>
</feed>"#;
        let feed = Normalizer::new().normalize_bytes(None, body.as_bytes()).unwrap();
        assert_eq!(feed.items.len(), 1);
        assert_eq!(
            feed.items[0].image_url.as_ref().map(Url::as_str),
            Some("http://x/img.jpg")
        );
    }

    #[test]
    fn test_atom_requires_updated() {
        let entry = AtomEntry {
            title: Some("a".into()),
            updated: None,
            ..Default::default()
        };
        let doc = FeedDocument::Atom(AtomDocument {
            entries: vec![entry],
            ..Default::default()
        });
        assert!(Normalizer::new().normalize(doc, None).is_empty());
    }

    #[test]
    fn test_atom_link_is_first_link_and_content_image_fallback() {
        let entry = AtomEntry {
            title: Some("a".into()),
            links: vec![
                AtomLink {
                    href: "https://example.com/a".into(),
                    media_type: Some("text/html".into()),
                },
                AtomLink {
                    href: "https://example.com/alt".into(),
                    media_type: None,
                },
            ],
            content: Some(r#"<img src="/a.png">"#.into()),
            summary: Some(r#"<img src="https://example.com/s.png">"#.into()),
            updated: Some(at(1)),
        };
        let doc = FeedDocument::Atom(AtomDocument {
            entries: vec![entry],
            ..Default::default()
        });
        let items = Normalizer::new().normalize(doc, None);
        assert_eq!(
            items[0].link.as_ref().map(Url::as_str),
            Some("https://example.com/a")
        );
        assert_eq!(
            items[0].image_url.as_ref().map(Url::as_str),
            Some("https://example.com/a.png")
        );
        assert_eq!(items[0].summary, r#"<img src="https://example.com/s.png">"#);
    }

    #[test]
    fn test_json_image_precedence() {
        let explicit = JsonItem {
            title: Some("explicit".into()),
            url: Some("https://example.com/1".into()),
            image: Some("https://example.com/explicit.png".into()),
            content_html: Some(r#"<img src="https://example.com/content.png">"#.into()),
            date_published: Some(at(2)),
            ..Default::default()
        };
        let from_summary = JsonItem {
            title: Some("summary".into()),
            summary: Some(r#"<img src="https://example.com/summary.png">"#.into()),
            date_published: Some(at(1)),
            ..Default::default()
        };
        let doc = FeedDocument::Json(JsonDocument {
            items: vec![explicit, from_summary],
            ..Default::default()
        });
        let items = Normalizer::new().normalize(doc, None);
        assert_eq!(
            items[0].image_url.as_ref().map(Url::as_str),
            Some("https://example.com/explicit.png")
        );
        assert_eq!(
            items[1].image_url.as_ref().map(Url::as_str),
            Some("https://example.com/summary.png")
        );
        assert_eq!(items[1].link, None);
    }

    #[test]
    fn test_json_requires_date_published() {
        let doc = FeedDocument::Json(JsonDocument {
            items: vec![JsonItem {
                title: Some("a".into()),
                ..Default::default()
            }],
            ..Default::default()
        });
        assert!(Normalizer::new().normalize(doc, None).is_empty());
    }

    #[test]
    fn test_normalize_bytes_reports_icon() {
        let body = br#"{"favicon": "https://example.com/fav.ico", "items": []}"#;
        let feed = Normalizer::new().normalize_bytes(None, body).unwrap();
        assert_eq!(
            feed.icon_url.as_ref().map(Url::as_str),
            Some("https://example.com/fav.ico")
        );
        assert!(feed.items.is_empty());
    }
}
