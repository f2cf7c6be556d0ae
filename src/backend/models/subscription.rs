use crate::models::common::{Cents, PaymentMethod, SubscriptionId, SubscriptionStatus, TimestampNs, UserId};
use candid::CandidType;
use serde::{Deserialize, Serialize};

/// Monthly all-content access.
///
/// Lifecycle: created `Active` -> lapses when `end_date` passes (no status
/// change) -> `Cancelled` (terminal, set explicitly by the owner).
#[derive(CandidType, Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
pub struct Subscription {
    pub id: SubscriptionId,
    pub user: UserId,
    pub status: SubscriptionStatus,
    pub start_date: TimestampNs,
    pub end_date: TimestampNs, // Exclusive
    pub monthly_price_cents: Cents,
    pub payment_method: PaymentMethod,
    pub external_ref: Option<String>, // Gateway recurring charge reference (card only)
    pub crypto_tx_id: Option<String>,
    pub created_at: TimestampNs,
    pub cancelled_at: Option<TimestampNs>,
}

impl Subscription {
    /// Access requires both an `Active` status and an unexpired period.
    pub fn grants_access_at(&self, now: TimestampNs) -> bool {
        self.status == SubscriptionStatus::Active && now < self.end_date
    }
}

#[derive(Clone, Debug)]
pub struct NewSubscription {
    pub user: UserId,
    pub start_date: TimestampNs,
    pub end_date: TimestampNs,
    pub monthly_price_cents: Cents,
    pub payment_method: PaymentMethod,
    pub external_ref: Option<String>,
    pub crypto_tx_id: Option<String>,
}

impl NewSubscription {
    pub fn into_subscription(self, id: SubscriptionId) -> Subscription {
        Subscription {
            id,
            user: self.user,
            status: SubscriptionStatus::Active,
            start_date: self.start_date,
            end_date: self.end_date,
            monthly_price_cents: self.monthly_price_cents,
            payment_method: self.payment_method,
            external_ref: self.external_ref,
            crypto_tx_id: self.crypto_tx_id,
            created_at: self.start_date,
            cancelled_at: None,
        }
    }
}
