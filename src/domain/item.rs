use chrono::{DateTime, Utc};
use url::Url;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    /// Locally assigned; never taken from the feed.
    pub id: Uuid,
    pub title: String,
    /// Raw HTML as delivered by the feed.
    pub summary: String,
    pub link: Option<Url>,
    pub published_at: DateTime<Utc>,
    pub image_url: Option<Url>,
    pub source_id: Option<Uuid>,
}

impl Item {
    pub fn new(title: String, published_at: DateTime<Utc>, source_id: Option<Uuid>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title,
            summary: String::new(),
            link: None,
            published_at,
            image_url: None,
            source_id,
        }
    }

    /// Key correlating the same article across refreshes: the link when
    /// present, otherwise the title.
    ///
    /// Two linkless items with the same title share a key and are treated as
    /// one article by merging and by read/starred state.
    pub fn stable_key(&self) -> &str {
        match &self.link {
            Some(link) => link.as_str(),
            None => &self.title,
        }
    }

    pub fn display_title(&self) -> &str {
        if self.title.is_empty() {
            "(Untitled)"
        } else {
            &self.title
        }
    }
}

/// Sort newest first. Stable, so equal timestamps keep their input order.
pub fn sort_newest_first(items: &mut [Item]) {
    items.sort_by(|a, b| b.published_at.cmp(&a.published_at));
}
