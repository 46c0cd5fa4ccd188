use chrono::{DateTime, Utc};
use url::Url;
use uuid::Uuid;

/// A configured feed subscription.
#[derive(Debug, Clone, PartialEq)]
pub struct Source {
    pub id: Uuid,
    pub url: Url,
    pub name: Option<String>,
    pub icon_url: Option<Url>,
    pub added_at: DateTime<Utc>,
}

impl Source {
    pub fn new(url: Url, name: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            url,
            name: name.filter(|n| !n.trim().is_empty()),
            icon_url: None,
            added_at: Utc::now(),
        }
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(self.url.as_str())
    }
}

/// Sort sources by display name, ignoring case.
pub fn sort_by_display_name(sources: &mut [Source]) {
    sources.sort_by_cached_key(|s| s.display_name().to_lowercase());
}
