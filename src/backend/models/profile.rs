use crate::models::common::{Role, TimestampNs, UserId};
use candid::CandidType;
use serde::{Deserialize, Serialize};

#[derive(CandidType, Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
pub struct UserProfile {
    pub principal: UserId,
    pub email: String,
    pub role: Role,
    pub created_at: TimestampNs,
}

/// Payout details a creator keeps on file.
#[derive(CandidType, Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
pub struct CreatorProfile {
    pub principal: UserId,
    pub paypal_email: Option<String>,
    pub crypto_address: Option<String>,
    pub billing_info: Option<String>,
    pub updated_at: TimestampNs,
}

#[derive(CandidType, Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
pub struct ProfileView {
    pub user: UserProfile,
    pub creator_profile: Option<CreatorProfile>,
}
