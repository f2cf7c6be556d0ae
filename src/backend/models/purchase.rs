use crate::models::common::{Cents, ContentId, PaymentMethod, PurchaseId, TimestampNs, UserId};
use candid::CandidType;
use serde::{Deserialize, Serialize};

/// A one-off entitlement to a single content item.
/// At most one exists per (user, content_id).
#[derive(CandidType, Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
pub struct Purchase {
    pub id: PurchaseId,
    pub user: UserId,
    pub content_id: ContentId,
    pub amount_cents: Cents, // Price at the time of purchase
    pub payment_method: PaymentMethod,
    pub payment_id: String, // Gateway confirmation id or caller-supplied crypto tx id
    pub created_at: TimestampNs,
}

#[derive(Clone, Debug)]
pub struct NewPurchase {
    pub user: UserId,
    pub content_id: ContentId,
    pub amount_cents: Cents,
    pub payment_method: PaymentMethod,
    pub payment_id: String,
    pub created_at: TimestampNs,
}

impl NewPurchase {
    pub fn into_purchase(self, id: PurchaseId) -> Purchase {
        Purchase {
            id,
            user: self.user,
            content_id: self.content_id,
            amount_cents: self.amount_cents,
            payment_method: self.payment_method,
            payment_id: self.payment_id,
            created_at: self.created_at,
        }
    }
}

/// Minimal content details shown next to a purchase.
#[derive(CandidType, Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct PurchasedContent {
    pub title: String,
    pub content_type: crate::models::common::ContentType,
    pub full_asset: String,
    pub preview_asset: Option<String>,
}

#[derive(CandidType, Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct PurchaseView {
    pub purchase: Purchase,
    /// `None` once the creator has deleted the item.
    pub content: Option<PurchasedContent>,
}
