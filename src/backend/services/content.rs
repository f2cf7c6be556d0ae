// src/backend/services/content.rs
use crate::{
    error::PaywallError,
    metrics,
    models::{
        Cents, ContentFilter, ContentId, ContentItem, ContentType, ContentView, NewContent, UserId,
    },
    services::entitlement::AccessPolicy,
    storage::traits::{ContentStore, ProfileStore},
    utils::time::Clock,
};
use candid::CandidType;
use serde::Deserialize;
use validator::Validate;

#[derive(CandidType, Deserialize, Clone, Debug, Validate)]
pub struct CreateContentRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    pub content_type: ContentType,
    pub price_cents: Cents,
    #[validate(length(min = 1, max = 1024))]
    pub full_asset: String,
    #[validate(length(max = 1024))]
    pub preview_asset: Option<String>,
    #[validate(length(max = 20))]
    pub categories: Vec<String>,
    #[validate(length(max = 20))]
    pub tags: Vec<String>,
}

/// Fields left as `None` keep their current value. The owner cannot change.
#[derive(CandidType, Deserialize, Clone, Debug, Default, Validate)]
pub struct UpdateContentRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    pub price_cents: Option<Cents>,
    #[validate(length(max = 1024))]
    pub preview_asset: Option<String>,
    #[validate(length(max = 20))]
    pub categories: Option<Vec<String>>,
    #[validate(length(max = 20))]
    pub tags: Option<Vec<String>>,
}

pub struct ContentService<'a> {
    content: &'a dyn ContentStore,
    profiles: &'a dyn ProfileStore,
    access: &'a dyn AccessPolicy,
    clock: &'a dyn Clock,
}

impl<'a> ContentService<'a> {
    pub fn new(
        content: &'a dyn ContentStore,
        profiles: &'a dyn ProfileStore,
        access: &'a dyn AccessPolicy,
        clock: &'a dyn Clock,
    ) -> Self {
        Self {
            content,
            profiles,
            access,
            clock,
        }
    }

    /// Publishes a new item owned by `owner`.
    ///
    /// # Errors
    /// * `NotFound` - `owner` has no creator profile.
    /// * `InvalidInput` - The request fails validation or `full_asset` is blank.
    pub fn create_content(
        &self,
        owner: UserId,
        req: CreateContentRequest,
    ) -> Result<ContentItem, PaywallError> {
        req.validate()?;
        if self.profiles.get_creator_profile(owner).is_none() {
            return Err(PaywallError::NotFound(format!(
                "Creator profile not found for {}",
                owner
            )));
        }
        let full_asset = req.full_asset.trim().to_string();
        if full_asset.is_empty() {
            return Err(PaywallError::InvalidInput(
                "Full asset reference is required".to_string(),
            ));
        }

        let now = self.clock.now_ns();
        let item = self.content.insert_content(NewContent {
            owner,
            title: req.title.trim().to_string(),
            description: req.description,
            content_type: req.content_type,
            price_cents: req.price_cents,
            full_asset,
            preview_asset: non_blank(req.preview_asset),
            categories: normalize_labels(req.categories),
            tags: normalize_labels(req.tags),
            created_at: now,
        })?;

        metrics::record_content_created(now);
        crate::log_info!(
            "Content {} '{}' created by {} at {} cents",
            item.id, item.title, owner, item.price_cents
        );
        Ok(item)
    }

    /// Catalogue listing, newest first. Each entry reveals the full asset
    /// only to viewers entitled to it.
    pub fn list_content(&self, viewer: Option<UserId>, filter: &ContentFilter) -> Vec<ContentView> {
        let mut items: Vec<ContentItem> = self
            .content
            .list_content()
            .into_iter()
            .filter(|item| filter.matches(item))
            .collect();
        sort_newest_first(&mut items);
        items
            .into_iter()
            .map(|item| self.view(viewer, item))
            .collect()
    }

    pub fn get_content(&self, viewer: Option<UserId>, id: ContentId) -> Result<ContentView, PaywallError> {
        let item = self.load(id)?;
        Ok(self.view(viewer, item))
    }

    /// Owner-only edit. Past purchases keep the amount they were charged.
    pub fn update_content(
        &self,
        caller: UserId,
        id: ContentId,
        req: UpdateContentRequest,
    ) -> Result<ContentItem, PaywallError> {
        req.validate()?;
        let mut item = self.owned(caller, id)?;

        if let Some(title) = req.title {
            item.title = title.trim().to_string();
        }
        if let Some(description) = req.description {
            item.description = Some(description);
        }
        if let Some(price_cents) = req.price_cents {
            item.price_cents = price_cents;
        }
        if let Some(preview_asset) = req.preview_asset {
            item.preview_asset = non_blank(Some(preview_asset));
        }
        if let Some(categories) = req.categories {
            item.categories = normalize_labels(categories);
        }
        if let Some(tags) = req.tags {
            item.tags = normalize_labels(tags);
        }
        item.updated_at = self.clock.now_ns();

        self.content.update_content(&item)?;
        crate::log_info!("Content {} updated by {}", id, caller);
        Ok(item)
    }

    /// Owner-only removal. Purchases of the item remain as history.
    pub fn delete_content(&self, caller: UserId, id: ContentId) -> Result<(), PaywallError> {
        self.owned(caller, id)?;
        self.content
            .remove_content(id)
            .ok_or_else(|| PaywallError::NotFound(format!("Content {} not found", id)))?;
        metrics::record_content_deleted(self.clock.now_ns());
        crate::log_info!("Content {} deleted by {}", id, caller);
        Ok(())
    }

    pub fn creator_content(&self, owner: UserId) -> Vec<ContentItem> {
        let mut items = self.content.list_by_owner(owner);
        sort_newest_first(&mut items);
        items
    }

    fn view(&self, viewer: Option<UserId>, item: ContentItem) -> ContentView {
        let has_access = self.access.has_full_access(viewer, &item);
        ContentView::new(item, has_access)
    }

    fn load(&self, id: ContentId) -> Result<ContentItem, PaywallError> {
        self.content
            .get_content(id)
            .ok_or_else(|| PaywallError::NotFound(format!("Content {} not found", id)))
    }

    fn owned(&self, caller: UserId, id: ContentId) -> Result<ContentItem, PaywallError> {
        let item = self.load(id)?;
        if item.owner != caller {
            return Err(PaywallError::Forbidden(format!(
                "Content {} is not owned by {}",
                id, caller
            )));
        }
        Ok(item)
    }
}

fn sort_newest_first(items: &mut [ContentItem]) {
    items.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Trims labels, drops blanks and duplicates, keeps first-seen order.
fn normalize_labels(labels: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(labels.len());
    for label in labels {
        let label = label.trim().to_string();
        if !label.is_empty() && !out.contains(&label) {
            out.push(label);
        }
    }
    out
}
