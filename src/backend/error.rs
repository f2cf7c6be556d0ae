// src/backend/error.rs
use candid::CandidType;
use serde::Deserialize;
use thiserror::Error;

#[derive(CandidType, Deserialize, Error, Debug, Clone, PartialEq, Eq)]
pub enum PaywallError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Payment error: {0}")]
    PaymentError(String),

    #[error("Caller must be authenticated")]
    Unauthenticated,

    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Internal canister error: {0}")]
    InternalError(String),

    #[error("Canister cycle balance too low for operation")]
    CycleLow,
}

impl PaywallError {
    /// HTTP-equivalent status for clients that surface errors as status codes.
    pub fn status_code(&self) -> u16 {
        match self {
            PaywallError::NotFound(_) => 404,
            PaywallError::Conflict(_) | PaywallError::InvalidInput(_) => 400,
            PaywallError::Forbidden(_) => 403,
            PaywallError::Unauthenticated => 401,
            PaywallError::RateLimitExceeded(_) => 429,
            PaywallError::PaymentError(_) => 502,
            PaywallError::CycleLow => 503,
            PaywallError::StorageError(_) | PaywallError::InternalError(_) => 500,
        }
    }
}

impl From<validator::ValidationErrors> for PaywallError {
    fn from(errors: validator::ValidationErrors) -> Self {
        PaywallError::InvalidInput(errors.to_string())
    }
}
