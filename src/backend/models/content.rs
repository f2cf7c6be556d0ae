use crate::models::common::{Cents, ContentId, ContentType, TimestampNs, UserId};
use candid::CandidType;
use serde::{Deserialize, Serialize};

/// A priced media item. `full_asset` is only disclosed to entitled callers.
#[derive(CandidType, Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct ContentItem {
    pub id: ContentId,
    pub owner: UserId, // Never changes after creation
    pub title: String,
    pub description: Option<String>,
    pub content_type: ContentType,
    pub price_cents: Cents,
    pub full_asset: String,
    pub preview_asset: Option<String>,
    pub categories: Vec<String>,
    pub tags: Vec<String>,
    pub created_at: TimestampNs,
    pub updated_at: TimestampNs,
}

/// Fields of a content item before the store assigns its id.
#[derive(Clone, Debug)]
pub struct NewContent {
    pub owner: UserId,
    pub title: String,
    pub description: Option<String>,
    pub content_type: ContentType,
    pub price_cents: Cents,
    pub full_asset: String,
    pub preview_asset: Option<String>,
    pub categories: Vec<String>,
    pub tags: Vec<String>,
    pub created_at: TimestampNs,
}

impl NewContent {
    pub fn into_item(self, id: ContentId) -> ContentItem {
        ContentItem {
            id,
            owner: self.owner,
            title: self.title,
            description: self.description,
            content_type: self.content_type,
            price_cents: self.price_cents,
            full_asset: self.full_asset,
            preview_asset: self.preview_asset,
            categories: self.categories,
            tags: self.tags,
            created_at: self.created_at,
            updated_at: self.created_at,
        }
    }
}

/// Content as returned to a particular caller.
#[derive(CandidType, Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct ContentView {
    pub id: ContentId,
    pub owner: UserId,
    pub title: String,
    pub description: Option<String>,
    pub content_type: ContentType,
    pub price_cents: Cents,
    pub preview_asset: Option<String>,
    pub full_asset: Option<String>,
    pub has_access: bool,
    pub categories: Vec<String>,
    pub tags: Vec<String>,
    pub created_at: TimestampNs,
}

impl ContentView {
    pub fn new(item: ContentItem, has_access: bool) -> Self {
        ContentView {
            id: item.id,
            owner: item.owner,
            title: item.title,
            description: item.description,
            content_type: item.content_type,
            price_cents: item.price_cents,
            preview_asset: item.preview_asset,
            full_asset: if has_access { Some(item.full_asset) } else { None },
            has_access,
            categories: item.categories,
            tags: item.tags,
            created_at: item.created_at,
        }
    }
}

/// Catalogue filter. All present criteria must match.
#[derive(CandidType, Deserialize, Clone, Debug, Default)]
pub struct ContentFilter {
    pub category: Option<String>,
    pub tag: Option<String>,
    pub search: Option<String>,
}

impl ContentFilter {
    pub fn matches(&self, item: &ContentItem) -> bool {
        if let Some(category) = &self.category {
            if !item.categories.iter().any(|c| c == category) {
                return false;
            }
        }
        if let Some(tag) = &self.tag {
            if !item.tags.iter().any(|t| t == tag) {
                return false;
            }
        }
        if let Some(search) = &self.search {
            let needle = search.to_lowercase();
            let in_title = item.title.to_lowercase().contains(&needle);
            let in_description = item
                .description
                .as_deref()
                .map(|d| d.to_lowercase().contains(&needle))
                .unwrap_or(false);
            if !in_title && !in_description {
                return false;
            }
        }
        true
    }
}
