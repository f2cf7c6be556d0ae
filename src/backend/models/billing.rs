// src/backend/models/billing.rs
use crate::models::common::{Cents, ContentId, PaymentMethod, SubscriptionId, TimestampNs, UserId};
use candid::CandidType;
use serde::{Deserialize, Serialize};

#[derive(CandidType, Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
pub enum BillingKind {
    Purchase { content_id: ContentId },
    Subscription { subscription_id: SubscriptionId },
}

/// One accepted charge. Appended after the entitlement record is persisted.
#[derive(CandidType, Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
pub struct BillingEntry {
    pub timestamp: TimestampNs,
    pub user: UserId,
    pub kind: BillingKind,
    pub amount_cents: Cents,
    pub currency: String,
    pub payment_method: PaymentMethod,
    pub payment_ref: Option<String>, // Gateway confirmation / recurring ref, or crypto tx id
}
