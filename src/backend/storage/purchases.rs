// src/backend/storage/purchases.rs
use crate::error::PaywallError;
use crate::models::{ContentId, NewPurchase, Purchase, UserId};
use crate::storage::counter::{next_id, IdCounter};
use crate::storage::memory::{get_purchase_counter_memory, get_purchases_memory, Memory};
use crate::storage::storable::Cbor;
use crate::storage::traits::PurchaseStore;
use ic_stable_structures::{StableBTreeMap, StableCell};
use std::cell::RefCell;

type PurchaseKey = Cbor<(UserId, ContentId)>;
type StorablePurchase = Cbor<Purchase>;

thread_local! {
    static PURCHASE_COUNTER: IdCounter = RefCell::new(
        StableCell::init(get_purchase_counter_memory(), 0)
            .expect("Failed to initialize purchase counter")
    );

    /// Purchases: Key = (user, content_id). The key is the uniqueness constraint.
    static PURCHASES: RefCell<StableBTreeMap<PurchaseKey, StorablePurchase, Memory>> = RefCell::new(
        StableBTreeMap::init(get_purchases_memory())
    );
}

pub struct StablePurchaseStore;

impl PurchaseStore for StablePurchaseStore {
    fn find_purchase(&self, user: UserId, content_id: ContentId) -> Option<Purchase> {
        PURCHASES.with(|map_ref| map_ref.borrow().get(&Cbor((user, content_id))).map(|p| p.0))
    }

    fn insert_purchase(&self, new: NewPurchase) -> Result<Purchase, PaywallError> {
        let key = Cbor((new.user, new.content_id));
        PURCHASES.with(|map_ref| {
            let mut map = map_ref.borrow_mut();
            if map.contains_key(&key) {
                return Err(PaywallError::Conflict(format!(
                    "Content {} already purchased by {}",
                    new.content_id, new.user
                )));
            }
            let id = next_id(&PURCHASE_COUNTER, "purchase")?;
            let purchase = new.into_purchase(id);
            map.insert(key, Cbor(purchase.clone()));
            Ok(purchase)
        })
    }

    fn purchases_by_user(&self, user: UserId) -> Vec<Purchase> {
        PURCHASES.with(|map_ref| {
            let map = map_ref.borrow();
            let range_start = Cbor((user, ContentId::MIN));
            let range_end = Cbor((user, ContentId::MAX));
            let mut purchases: Vec<Purchase> = map
                .range(range_start..=range_end)
                .map(|(_key, purchase)| purchase.0)
                .collect();
            purchases.sort_by(|a, b| b.id.cmp(&a.id));
            purchases
        })
    }
}
