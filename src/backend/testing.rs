// src/backend/testing.rs
//
// Test doubles shared by the unit tests of every module.

use crate::adapter::{ChargeRequest, PaymentGateway, RecurringChargeRequest};
use crate::error::PaywallError;
use crate::models::{
    ContentId, ContentItem, ContentType, NewContent, NewPurchase, NewSubscription, Purchase,
    Subscription, SubscriptionId, TimestampNs, UserId,
};
use crate::storage::traits::{ContentStore, PurchaseStore, SubscriptionStore};
use crate::utils::time::Clock;
use candid::Principal;
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

pub fn principal(n: u8) -> Principal {
    Principal::from_slice(&[n; 29])
}

pub fn new_content(owner: UserId, title: &str, price_cents: u64) -> NewContent {
    NewContent {
        owner,
        title: title.to_string(),
        description: Some(format!("About {}", title)),
        content_type: ContentType::Video,
        price_cents,
        full_asset: format!("assets/{}/full.mp4", title),
        preview_asset: Some(format!("assets/{}/preview.jpg", title)),
        categories: vec!["music".to_string()],
        tags: vec!["live".to_string()],
        created_at: 1,
    }
}

pub struct FixedClock {
    now: Cell<TimestampNs>,
}

impl FixedClock {
    pub fn new(now: TimestampNs) -> Self {
        Self { now: Cell::new(now) }
    }

    pub fn advance(&self, by: TimestampNs) {
        self.now.set(self.now.get() + by);
    }

    pub fn set(&self, now: TimestampNs) {
        self.now.set(now);
    }
}

impl Clock for FixedClock {
    fn now_ns(&self) -> TimestampNs {
        self.now.get()
    }
}

#[derive(Default)]
pub struct InMemoryContentStore {
    items: RefCell<BTreeMap<ContentId, ContentItem>>,
    next_id: Cell<ContentId>,
}

impl ContentStore for InMemoryContentStore {
    fn get_content(&self, id: ContentId) -> Option<ContentItem> {
        self.items.borrow().get(&id).cloned()
    }

    fn insert_content(&self, new: NewContent) -> Result<ContentItem, PaywallError> {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        let item = new.into_item(id);
        self.items.borrow_mut().insert(id, item.clone());
        Ok(item)
    }

    fn update_content(&self, item: &ContentItem) -> Result<(), PaywallError> {
        let mut items = self.items.borrow_mut();
        match items.get_mut(&item.id) {
            Some(slot) => {
                *slot = item.clone();
                Ok(())
            }
            None => Err(PaywallError::NotFound(format!("Content {} not found", item.id))),
        }
    }

    fn remove_content(&self, id: ContentId) -> Option<ContentItem> {
        self.items.borrow_mut().remove(&id)
    }

    fn list_content(&self) -> Vec<ContentItem> {
        self.items.borrow().values().cloned().collect()
    }
}

#[derive(Default)]
pub struct InMemoryPurchaseStore {
    rows: RefCell<BTreeMap<(UserId, ContentId), Purchase>>,
    next_id: Cell<u64>,
    failing_writes: Cell<bool>,
}

impl InMemoryPurchaseStore {
    /// While set, inserts fail with `StorageError`.
    pub fn set_failing_writes(&self, failing: bool) {
        self.failing_writes.set(failing);
    }
}

impl PurchaseStore for InMemoryPurchaseStore {
    fn find_purchase(&self, user: UserId, content_id: ContentId) -> Option<Purchase> {
        self.rows.borrow().get(&(user, content_id)).cloned()
    }

    fn insert_purchase(&self, new: NewPurchase) -> Result<Purchase, PaywallError> {
        if self.failing_writes.get() {
            return Err(write_failure("purchase"));
        }
        let mut rows = self.rows.borrow_mut();
        let key = (new.user, new.content_id);
        if rows.contains_key(&key) {
            return Err(PaywallError::Conflict(format!(
                "Content {} already purchased by {}",
                new.content_id, new.user
            )));
        }
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        let purchase = new.into_purchase(id);
        rows.insert(key, purchase.clone());
        Ok(purchase)
    }

    fn purchases_by_user(&self, user: UserId) -> Vec<Purchase> {
        let mut purchases: Vec<Purchase> = self
            .rows
            .borrow()
            .values()
            .filter(|p| p.user == user)
            .cloned()
            .collect();
        purchases.sort_by(|a, b| b.id.cmp(&a.id));
        purchases
    }
}

#[derive(Default)]
pub struct InMemorySubscriptionStore {
    rows: RefCell<BTreeMap<SubscriptionId, Subscription>>,
    next_id: Cell<SubscriptionId>,
    failing_writes: Cell<bool>,
}

impl InMemorySubscriptionStore {
    /// While set, inserts and updates fail with `StorageError`.
    pub fn set_failing_writes(&self, failing: bool) {
        self.failing_writes.set(failing);
    }
}

fn write_failure(entity: &str) -> PaywallError {
    PaywallError::StorageError(format!("{} write rejected", entity))
}

impl SubscriptionStore for InMemorySubscriptionStore {
    fn get_subscription(&self, id: SubscriptionId) -> Option<Subscription> {
        self.rows.borrow().get(&id).cloned()
    }

    fn active_subscription(&self, user: UserId, now: TimestampNs) -> Option<Subscription> {
        self.rows
            .borrow()
            .values()
            .rev()
            .find(|s| s.user == user && s.grants_access_at(now))
            .cloned()
    }

    fn latest_subscription(&self, user: UserId) -> Option<Subscription> {
        self.rows
            .borrow()
            .values()
            .rev()
            .find(|s| s.user == user)
            .cloned()
    }

    fn count_for_user(&self, user: UserId) -> u64 {
        self.rows.borrow().values().filter(|s| s.user == user).count() as u64
    }

    fn insert_if_none_active(
        &self,
        new: NewSubscription,
        now: TimestampNs,
    ) -> Result<Subscription, PaywallError> {
        if self.failing_writes.get() {
            return Err(write_failure("subscription"));
        }
        if self.active_subscription(new.user, now).is_some() {
            return Err(PaywallError::Conflict(format!(
                "Active subscription already exists for {}",
                new.user
            )));
        }
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        let subscription = new.into_subscription(id);
        self.rows.borrow_mut().insert(id, subscription.clone());
        Ok(subscription)
    }

    fn update_subscription(&self, subscription: &Subscription) -> Result<(), PaywallError> {
        if self.failing_writes.get() {
            return Err(write_failure("subscription"));
        }
        let mut rows = self.rows.borrow_mut();
        match rows.get_mut(&subscription.id) {
            Some(slot) => {
                *slot = subscription.clone();
                Ok(())
            }
            None => Err(PaywallError::NotFound(format!(
                "Subscription {} not found",
                subscription.id
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum GatewayCall {
    Charge(ChargeRequest),
    Recurring(RecurringChargeRequest),
    Cancel(String),
}

/// Payment gateway fake. Confirmation ids are `ch_<n>` for charges and
/// `sub_<n>` for recurring charges, counted from 1.
#[derive(Default)]
pub struct RecordingGateway {
    pub calls: RefCell<Vec<GatewayCall>>,
    failing: Cell<bool>,
    yielding: Cell<bool>,
    issued: Cell<u64>,
}

impl RecordingGateway {
    pub fn failing() -> Self {
        let gateway = Self::default();
        gateway.failing.set(true);
        gateway
    }

    /// Every call suspends once before answering, so concurrent requests
    /// interleave at the gateway.
    pub fn yielding() -> Self {
        let gateway = Self::default();
        gateway.yielding.set(true);
        gateway
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.set(failing);
    }

    pub fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }

    async fn answer(&self, call: GatewayCall, prefix: &str) -> Result<String, PaywallError> {
        if self.yielding.get() {
            YieldOnce(false).await;
        }
        self.calls.borrow_mut().push(call);
        if self.failing.get() {
            return Err(PaywallError::PaymentError("card_declined".to_string()));
        }
        let n = self.issued.get() + 1;
        self.issued.set(n);
        Ok(format!("{}_{}", prefix, n))
    }
}

impl PaymentGateway for RecordingGateway {
    async fn charge_once(&self, req: ChargeRequest) -> Result<String, PaywallError> {
        self.answer(GatewayCall::Charge(req), "ch").await
    }

    async fn create_recurring_charge(&self, req: RecurringChargeRequest) -> Result<String, PaywallError> {
        self.answer(GatewayCall::Recurring(req), "sub").await
    }

    async fn cancel_recurring_charge(&self, reference: &str) -> Result<(), PaywallError> {
        self.answer(GatewayCall::Cancel(reference.to_string()), "cancel")
            .await
            .map(|_| ())
    }
}

struct YieldOnce(bool);

impl Future for YieldOnce {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.0 {
            Poll::Ready(())
        } else {
            self.0 = true;
            cx.waker().wake_by_ref();
            Poll::Pending
        }
    }
}
