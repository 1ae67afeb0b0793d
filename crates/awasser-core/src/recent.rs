//! "Recently viewed" list persisted in local storage.

use crate::constants::RECENTLY_VIEWED_MAX;

/// Most-recent-first, de-duplicated, bounded list of artwork ids.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RecentlyViewed {
    ids: Vec<String>,
}

impl RecentlyViewed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the stored JSON array. Anything unreadable counts as empty.
    pub fn from_json(raw: Option<&str>) -> Self {
        let ids: Vec<String> = raw
            .and_then(|s| serde_json::from_str(s).ok())
            .unwrap_or_default();
        let mut list = Self::new();
        // Oldest first so the stored order is preserved.
        for id in ids.into_iter().rev() {
            list.push(&id);
        }
        list
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.ids).unwrap_or_else(|_| "[]".to_string())
    }

    pub fn push(&mut self, id: &str) {
        self.ids.retain(|existing| existing != id);
        self.ids.insert(0, id.to_string());
        self.ids.truncate(RECENTLY_VIEWED_MAX);
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }
}
