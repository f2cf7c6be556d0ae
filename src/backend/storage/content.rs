// src/backend/storage/content.rs
use crate::error::PaywallError;
use crate::models::{ContentId, ContentItem, NewContent};
use crate::storage::counter::{next_id, IdCounter};
use crate::storage::memory::{get_content_counter_memory, get_content_items_memory, Memory};
use crate::storage::storable::Cbor;
use crate::storage::traits::ContentStore;
use ic_stable_structures::{StableBTreeMap, StableCell};
use std::cell::RefCell;

type StorableContent = Cbor<ContentItem>;

thread_local! {
    // Counter for generating content IDs
    static CONTENT_COUNTER: IdCounter = RefCell::new(
        StableCell::init(get_content_counter_memory(), 0)
            .expect("Failed to initialize content counter")
    );

    // Content ID -> Content Data
    static CONTENT_MAP: RefCell<StableBTreeMap<ContentId, StorableContent, Memory>> = RefCell::new(
        StableBTreeMap::init(get_content_items_memory())
    );
}

/// Content catalogue backed by stable memory.
pub struct StableContentStore;

impl ContentStore for StableContentStore {
    fn get_content(&self, id: ContentId) -> Option<ContentItem> {
        CONTENT_MAP.with(|map_ref| map_ref.borrow().get(&id).map(|c| c.0))
    }

    fn insert_content(&self, new: NewContent) -> Result<ContentItem, PaywallError> {
        let id = next_id(&CONTENT_COUNTER, "content")?;
        let item = new.into_item(id);
        CONTENT_MAP.with(|map_ref| {
            map_ref.borrow_mut().insert(id, Cbor(item.clone()));
        });
        Ok(item)
    }

    fn update_content(&self, item: &ContentItem) -> Result<(), PaywallError> {
        CONTENT_MAP.with(|map_ref| {
            let mut map = map_ref.borrow_mut();
            if !map.contains_key(&item.id) {
                return Err(PaywallError::NotFound(format!("Content {} not found", item.id)));
            }
            map.insert(item.id, Cbor(item.clone()));
            Ok(())
        })
    }

    fn remove_content(&self, id: ContentId) -> Option<ContentItem> {
        CONTENT_MAP.with(|map_ref| map_ref.borrow_mut().remove(&id).map(|c| c.0))
    }

    fn list_content(&self) -> Vec<ContentItem> {
        CONTENT_MAP.with(|map_ref| map_ref.borrow().iter().map(|(_id, c)| c.0).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ContentType;
    use candid::Principal;

    fn new_content(owner: Principal, title: &str) -> NewContent {
        NewContent {
            owner,
            title: title.to_string(),
            description: None,
            content_type: ContentType::Video,
            price_cents: 1000,
            full_asset: format!("assets/{}.mp4", title),
            preview_asset: None,
            categories: vec![],
            tags: vec![],
            created_at: 1,
        }
    }

    #[test]
    fn assigns_sequential_ids_and_round_trips() {
        let store = StableContentStore;
        let owner = Principal::from_slice(&[1; 29]);
        let first = store.insert_content(new_content(owner, "a")).unwrap();
        let second = store.insert_content(new_content(owner, "b")).unwrap();
        assert_eq!(second.id, first.id + 1);
        assert_eq!(store.get_content(first.id), Some(first.clone()));
        assert_eq!(store.list_by_owner(owner).len(), 2);

        assert_eq!(store.remove_content(first.id), Some(first.clone()));
        assert!(matches!(
            store.update_content(&first),
            Err(PaywallError::NotFound(_))
        ));
    }
}
