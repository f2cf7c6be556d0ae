// src/backend/storage/subscriptions.rs
use crate::error::PaywallError;
use crate::models::{NewSubscription, Subscription, SubscriptionId, TimestampNs, UserId};
use crate::storage::counter::{next_id, IdCounter};
use crate::storage::memory::{
    get_subscription_counter_memory, get_subscriptions_by_user_memory, get_subscriptions_memory,
    Memory,
};
use crate::storage::storable::Cbor;
use crate::storage::traits::SubscriptionStore;
use ic_stable_structures::{StableBTreeMap, StableCell};
use std::cell::RefCell;

type StorableSubscription = Cbor<Subscription>;
type UserIndexKey = Cbor<(UserId, SubscriptionId)>;

thread_local! {
    static SUBSCRIPTION_COUNTER: IdCounter = RefCell::new(
        StableCell::init(get_subscription_counter_memory(), 0)
            .expect("Failed to initialize subscription counter")
    );

    // Primary storage: Subscription ID -> Subscription
    static SUBSCRIPTIONS: RefCell<StableBTreeMap<SubscriptionId, StorableSubscription, Memory>> = RefCell::new(
        StableBTreeMap::init(get_subscriptions_memory())
    );

    // Secondary index: (user, subscription ID) -> subscription ID
    static SUBSCRIPTIONS_BY_USER: RefCell<StableBTreeMap<UserIndexKey, SubscriptionId, Memory>> = RefCell::new(
        StableBTreeMap::init(get_subscriptions_by_user_memory())
    );
}

/// Subscription IDs of `user`, oldest first.
fn subscription_ids_for(user: UserId) -> Vec<SubscriptionId> {
    SUBSCRIPTIONS_BY_USER.with(|index_ref| {
        let range_start = Cbor((user, SubscriptionId::MIN));
        let range_end = Cbor((user, SubscriptionId::MAX));
        index_ref
            .borrow()
            .range(range_start..=range_end)
            .map(|(_key, id)| id)
            .collect()
    })
}

fn load(id: SubscriptionId) -> Option<Subscription> {
    SUBSCRIPTIONS.with(|map_ref| map_ref.borrow().get(&id).map(|s| s.0))
}

pub struct StableSubscriptionStore;

impl SubscriptionStore for StableSubscriptionStore {
    fn get_subscription(&self, id: SubscriptionId) -> Option<Subscription> {
        load(id)
    }

    fn active_subscription(&self, user: UserId, now: TimestampNs) -> Option<Subscription> {
        subscription_ids_for(user)
            .into_iter()
            .rev()
            .filter_map(load)
            .find(|s| s.grants_access_at(now))
    }

    fn latest_subscription(&self, user: UserId) -> Option<Subscription> {
        subscription_ids_for(user).last().copied().and_then(load)
    }

    fn count_for_user(&self, user: UserId) -> u64 {
        subscription_ids_for(user).len() as u64
    }

    fn insert_if_none_active(
        &self,
        new: NewSubscription,
        now: TimestampNs,
    ) -> Result<Subscription, PaywallError> {
        if let Some(existing) = self.active_subscription(new.user, now) {
            return Err(PaywallError::Conflict(format!(
                "Active subscription {} already exists for {}",
                existing.id, new.user
            )));
        }
        let id = next_id(&SUBSCRIPTION_COUNTER, "subscription")?;
        let subscription = new.into_subscription(id);
        SUBSCRIPTIONS.with(|map_ref| {
            map_ref.borrow_mut().insert(id, Cbor(subscription.clone()));
        });
        SUBSCRIPTIONS_BY_USER.with(|index_ref| {
            index_ref.borrow_mut().insert(Cbor((subscription.user, id)), id);
        });
        Ok(subscription)
    }

    fn update_subscription(&self, subscription: &Subscription) -> Result<(), PaywallError> {
        SUBSCRIPTIONS.with(|map_ref| {
            let mut map = map_ref.borrow_mut();
            if !map.contains_key(&subscription.id) {
                return Err(PaywallError::NotFound(format!(
                    "Subscription {} not found",
                    subscription.id
                )));
            }
            map.insert(subscription.id, Cbor(subscription.clone()));
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PaymentMethod, SubscriptionStatus};
    use candid::Principal;

    fn new_sub(user: Principal, start: TimestampNs, end: TimestampNs) -> NewSubscription {
        NewSubscription {
            user,
            start_date: start,
            end_date: end,
            monthly_price_cents: 2999,
            payment_method: PaymentMethod::Crypto,
            external_ref: None,
            crypto_tx_id: Some("0xabc".to_string()),
        }
    }

    #[test]
    fn one_active_subscription_per_user() {
        let store = StableSubscriptionStore;
        let user = Principal::from_slice(&[1; 29]);
        let first = store.insert_if_none_active(new_sub(user, 10, 100), 10).unwrap();
        assert_eq!(first.status, SubscriptionStatus::Active);
        assert!(matches!(
            store.insert_if_none_active(new_sub(user, 50, 150), 50),
            Err(PaywallError::Conflict(_))
        ));

        // Lapsed by time: a new one may start.
        let second = store.insert_if_none_active(new_sub(user, 100, 200), 100).unwrap();
        assert_eq!(store.count_for_user(user), 2);
        assert_eq!(store.latest_subscription(user), Some(second.clone()));
        assert_eq!(store.active_subscription(user, 150), Some(second));
    }

    #[test]
    fn cancelled_subscription_frees_the_slot() {
        let store = StableSubscriptionStore;
        let user = Principal::from_slice(&[1; 29]);
        let mut sub = store.insert_if_none_active(new_sub(user, 10, 100), 10).unwrap();
        sub.status = SubscriptionStatus::Cancelled;
        store.update_subscription(&sub).unwrap();

        assert_eq!(store.active_subscription(user, 20), None);
        assert!(store.insert_if_none_active(new_sub(user, 20, 120), 20).is_ok());
    }

    #[test]
    fn index_is_per_user() {
        let store = StableSubscriptionStore;
        let alice = Principal::from_slice(&[1; 29]);
        let bob = Principal::from_slice(&[2; 29]);
        store.insert_if_none_active(new_sub(alice, 0, 100), 0).unwrap();
        assert_eq!(store.count_for_user(bob), 0);
        assert_eq!(store.latest_subscription(bob), None);
        assert!(store.insert_if_none_active(new_sub(bob, 0, 100), 0).is_ok());
    }
}
