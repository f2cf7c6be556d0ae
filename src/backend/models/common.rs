// src/backend/models/common.rs
use crate::error::PaywallError;
use candid::{CandidType, Principal};
use serde::{Deserialize, Serialize};

pub type UserId = Principal;         // Caller principal of a registered user
pub type ContentId = u64;            // Exposed id of a content item
pub type PurchaseId = u64;
pub type SubscriptionId = u64;

pub type TimestampNs = u64; // Nanoseconds since epoch
pub type Cents = u64;       // Minor units of the settlement currency
pub type Cycles = u128;

#[derive(CandidType, Deserialize, Serialize, Clone, Debug, PartialEq, Eq, Copy)]
pub enum Role {
    Creator,
    Viewer,
}

#[derive(CandidType, Deserialize, Serialize, Clone, Debug, PartialEq, Eq, Copy)]
pub enum ContentType {
    Video,
    Image,
}

#[derive(CandidType, Deserialize, Serialize, Clone, Debug, PartialEq, Eq, Copy)]
pub enum PaymentMethod {
    Card,
    Crypto,
}

impl PaymentMethod {
    /// Parses the wire value. Only the exact upper-case names are accepted.
    pub fn parse(value: &str) -> Result<Self, PaywallError> {
        match value {
            "CARD" => Ok(PaymentMethod::Card),
            "CRYPTO" => Ok(PaymentMethod::Crypto),
            other => Err(PaywallError::InvalidInput(format!(
                "Invalid payment method: {}",
                other
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Card => "CARD",
            PaymentMethod::Crypto => "CRYPTO",
        }
    }
}

#[derive(CandidType, Deserialize, Serialize, Clone, Debug, PartialEq, Eq, Copy)]
pub enum SubscriptionStatus {
    Active,
    Cancelled,
}
