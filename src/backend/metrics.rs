// src/backend/metrics.rs
use crate::models::common::{Cents, TimestampNs};
use crate::storage::{get_metrics, update_metrics};
use candid::{CandidType, Deserialize};
use serde::Serialize;

#[derive(CandidType, Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct PaywallMetrics {
    pub content_items: u64,
    pub purchases_total: u64,
    pub purchase_revenue_cents: Cents,
    pub subscriptions_started: u64,
    pub subscriptions_cancelled: u64,
    pub payment_failures: u64,
    pub last_updated: Option<TimestampNs>,
}

// --- Metrics Update Helpers ---
// A failed metrics write never fails the operation that triggered it.

fn apply<F>(now: TimestampNs, label: &str, update_fn: F)
where
    F: FnOnce(&mut PaywallMetrics),
{
    let result = update_metrics(|metrics| {
        update_fn(metrics);
        metrics.last_updated = Some(now);
    });
    if let Err(e) = result {
        crate::log_warn!("Metrics update ({}) failed: {}", label, e);
    }
}

pub fn record_content_created(now: TimestampNs) {
    apply(now, "content_created", |m| {
        m.content_items = m.content_items.saturating_add(1)
    });
}

pub fn record_content_deleted(now: TimestampNs) {
    apply(now, "content_deleted", |m| {
        m.content_items = m.content_items.saturating_sub(1)
    });
}

pub fn record_purchase(now: TimestampNs, amount_cents: Cents) {
    apply(now, "purchase", |m| {
        m.purchases_total = m.purchases_total.saturating_add(1);
        m.purchase_revenue_cents = m.purchase_revenue_cents.saturating_add(amount_cents);
    });
}

pub fn record_subscription_started(now: TimestampNs) {
    apply(now, "subscription_started", |m| {
        m.subscriptions_started = m.subscriptions_started.saturating_add(1)
    });
}

pub fn record_subscription_cancelled(now: TimestampNs) {
    apply(now, "subscription_cancelled", |m| {
        m.subscriptions_cancelled = m.subscriptions_cancelled.saturating_add(1)
    });
}

pub fn record_payment_failure(now: TimestampNs) {
    apply(now, "payment_failure", |m| {
        m.payment_failures = m.payment_failures.saturating_add(1)
    });
}

pub fn current_metrics() -> PaywallMetrics {
    get_metrics()
}
