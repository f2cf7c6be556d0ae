// src/backend/storage/traits.rs
//
// Every method runs to completion without yielding, so within a canister a
// single call is atomic with respect to other messages. Uniqueness checks
// that must hold under concurrent requests live inside these calls.

use crate::error::PaywallError;
use crate::models::{
    ContentId, ContentItem, CreatorProfile, NewContent, NewPurchase, NewSubscription, Purchase,
    Subscription, SubscriptionId, TimestampNs, UserId, UserProfile,
};

pub trait ContentStore {
    fn get_content(&self, id: ContentId) -> Option<ContentItem>;
    /// Assigns the id and persists the item.
    fn insert_content(&self, new: NewContent) -> Result<ContentItem, PaywallError>;
    /// Replaces an existing item. `NotFound` if it was removed meanwhile.
    fn update_content(&self, item: &ContentItem) -> Result<(), PaywallError>;
    fn remove_content(&self, id: ContentId) -> Option<ContentItem>;
    fn list_content(&self) -> Vec<ContentItem>;

    fn list_by_owner(&self, owner: UserId) -> Vec<ContentItem> {
        self.list_content()
            .into_iter()
            .filter(|item| item.owner == owner)
            .collect()
    }
}

pub trait PurchaseStore {
    fn find_purchase(&self, user: UserId, content_id: ContentId) -> Option<Purchase>;
    /// Persists the purchase, or fails with `Conflict` when one already
    /// exists for the same (user, content) pair.
    fn insert_purchase(&self, new: NewPurchase) -> Result<Purchase, PaywallError>;
    /// Newest first.
    fn purchases_by_user(&self, user: UserId) -> Vec<Purchase>;
}

pub trait SubscriptionStore {
    fn get_subscription(&self, id: SubscriptionId) -> Option<Subscription>;
    /// The subscription currently granting access to `user`, if any.
    fn active_subscription(&self, user: UserId, now: TimestampNs) -> Option<Subscription>;
    /// Most recently created subscription of `user`, whatever its state.
    fn latest_subscription(&self, user: UserId) -> Option<Subscription>;
    fn count_for_user(&self, user: UserId) -> u64;
    /// Persists a new `Active` subscription, or fails with `Conflict` when
    /// `user` already holds one that grants access at `now`.
    fn insert_if_none_active(
        &self,
        new: NewSubscription,
        now: TimestampNs,
    ) -> Result<Subscription, PaywallError>;
    fn update_subscription(&self, subscription: &Subscription) -> Result<(), PaywallError>;
}

pub trait ProfileStore {
    fn get_user(&self, principal: UserId) -> Option<UserProfile>;
    /// `Conflict` if `principal` is already registered.
    fn insert_user(&self, user: UserProfile) -> Result<(), PaywallError>;
    fn get_creator_profile(&self, principal: UserId) -> Option<CreatorProfile>;
    fn put_creator_profile(&self, profile: CreatorProfile);
}
