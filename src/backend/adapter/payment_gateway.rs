use crate::error::PaywallError;
use crate::models::common::{Cents, ContentId, UserId};
use crate::storage::config::PaywallConfig;
use candid::{CandidType, Nat};
use ic_cdk::api::management_canister::http_request::{
    http_request, CanisterHttpRequestArgument, HttpHeader, HttpMethod, HttpResponse,
    TransformContext,
};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

// Payment bridge API paths
const CHARGES_PATH: &str = "/charges";
const RECURRING_PATH: &str = "/recurring";

const HTTP_OUTCALL_CYCLES: u128 = 2_000_000_000; // Cycles for one HTTP outcall
const MAX_RESPONSE_BYTES: u64 = 1024 * 10; // Max 10KiB response

/// Name of the canister query that strips volatile response parts.
pub const TRANSFORM_METHOD: &str = "transform_gateway_response";

#[derive(CandidType, Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BillingInterval {
    Month,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ChargeRequest {
    pub amount_cents: Cents,
    pub currency: String,
    #[serde(skip)]
    pub idempotency_key: String,
    pub metadata: BTreeMap<String, String>,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct RecurringChargeRequest {
    pub amount_cents: Cents,
    pub currency: String,
    pub interval: BillingInterval,
    pub product_name: String,
    #[serde(skip)]
    pub idempotency_key: String,
    pub metadata: BTreeMap<String, String>,
}

#[derive(Deserialize, Debug, Clone)]
struct GatewayReference {
    id: String,
}

/// The external payment provider. Calls are never retried here: a retried
/// charge risks billing twice, so failures surface as `PaymentError`.
#[allow(async_fn_in_trait)]
pub trait PaymentGateway {
    /// Charges once and returns the gateway confirmation id.
    async fn charge_once(&self, req: ChargeRequest) -> Result<String, PaywallError>;
    /// Registers a recurring charge and returns its reference.
    async fn create_recurring_charge(&self, req: RecurringChargeRequest) -> Result<String, PaywallError>;
    async fn cancel_recurring_charge(&self, reference: &str) -> Result<(), PaywallError>;
}

/// Idempotency key for a one-off purchase. Concurrent attempts by the same
/// user for the same item share it, so the gateway charges at most once.
pub fn purchase_idempotency_key(user: &UserId, content_id: ContentId) -> String {
    let mut hasher = Sha256::new();
    hasher.update(b"purchase");
    hasher.update(user.as_slice());
    hasher.update(content_id.to_be_bytes());
    hex::encode(hasher.finalize())
}

/// Idempotency key for the `ordinal`-th subscription of `user`.
pub fn subscription_idempotency_key(user: &UserId, ordinal: u64) -> String {
    let mut hasher = Sha256::new();
    hasher.update(b"subscription");
    hasher.update(user.as_slice());
    hasher.update(ordinal.to_be_bytes());
    hex::encode(hasher.finalize())
}

/// Interprets a gateway reply: 2xx bodies carry `{"id": ...}`.
fn read_reference(status: &Nat, body: &[u8], operation: &str) -> Result<String, PaywallError> {
    if *status >= Nat::from(200u64) && *status < Nat::from(300u64) {
        let reference: GatewayReference = serde_json::from_slice(body).map_err(|e| {
            PaywallError::PaymentError(format!("Unreadable {} response: {}", operation, e))
        })?;
        if reference.id.is_empty() {
            return Err(PaywallError::PaymentError(format!(
                "Gateway {} response carried an empty id",
                operation
            )));
        }
        Ok(reference.id)
    } else {
        Err(PaywallError::PaymentError(format!(
            "Gateway {} returned status {}: {}",
            operation,
            status,
            String::from_utf8_lossy(body)
        )))
    }
}

/// Path for cancelling `reference`. The reference goes into the URL path
/// verbatim, so only plain tokens (ASCII alphanumerics, `-`, `_`, `.`) pass.
fn recurring_cancel_path(reference: &str) -> Result<String, PaywallError> {
    let plain_token = !reference.is_empty()
        && reference != "."
        && reference != ".."
        && reference
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if !plain_token {
        return Err(PaywallError::PaymentError(format!(
            "Refusing to cancel malformed recurring charge reference {:?}",
            reference
        )));
    }
    Ok(format!("{}/{}/cancel", RECURRING_PATH, reference))
}

/// Keeps only status and body so every replica sees the same response.
pub fn sanitize_response(response: HttpResponse) -> HttpResponse {
    HttpResponse {
        status: response.status,
        headers: vec![],
        body: response.body,
    }
}

/// Payment bridge reached through IC HTTPS outcalls.
pub struct HttpPaymentGateway {
    base_url: String,
}

impl HttpPaymentGateway {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &PaywallConfig) -> Result<Self, PaywallError> {
        if config.gateway_url.is_empty() {
            return Err(PaywallError::InternalError(
                "Payment gateway URL is not configured".to_string(),
            ));
        }
        Ok(Self::new(config.gateway_url.clone()))
    }

    async fn post(
        &self,
        path: &str,
        body: Vec<u8>,
        idempotency_key: Option<&str>,
        operation: &str,
    ) -> Result<String, PaywallError> {
        let mut headers = vec![HttpHeader {
            name: String::from("Content-Type"),
            value: String::from("application/json"),
        }];
        if let Some(key) = idempotency_key {
            headers.push(HttpHeader {
                name: String::from("Idempotency-Key"),
                value: key.to_string(),
            });
        }

        let request_arg = CanisterHttpRequestArgument {
            url: format!("{}{}", self.base_url, path),
            method: HttpMethod::POST,
            body: Some(body),
            max_response_bytes: Some(MAX_RESPONSE_BYTES),
            transform: Some(TransformContext::from_name(TRANSFORM_METHOD.to_string(), vec![])),
            headers,
        };

        crate::log_info!("Gateway {} -> {}", operation, request_arg.url);
        match http_request(request_arg, HTTP_OUTCALL_CYCLES).await {
            Ok((response,)) => read_reference(&response.status, &response.body, operation),
            Err((code, msg)) => {
                crate::log_error!("Gateway {} outcall failed: {:?} - {}", operation, code, msg);
                Err(PaywallError::PaymentError(format!(
                    "Failed to reach payment gateway for {}: {:?} - {}",
                    operation, code, msg
                )))
            }
        }
    }

    async fn post_json<B: Serialize>(
        &self,
        path: &str,
        body: &B,
        idempotency_key: Option<&str>,
        operation: &str,
    ) -> Result<String, PaywallError> {
        let request_body = serde_json::to_vec(body).map_err(|e| {
            PaywallError::InternalError(format!("Failed to serialize {} request: {}", operation, e))
        })?;
        self.post(path, request_body, idempotency_key, operation).await
    }
}

impl PaymentGateway for HttpPaymentGateway {
    async fn charge_once(&self, req: ChargeRequest) -> Result<String, PaywallError> {
        self.post_json(CHARGES_PATH, &req, Some(&req.idempotency_key), "charge")
            .await
    }

    async fn create_recurring_charge(&self, req: RecurringChargeRequest) -> Result<String, PaywallError> {
        self.post_json(RECURRING_PATH, &req, Some(&req.idempotency_key), "recurring charge")
            .await
    }

    async fn cancel_recurring_charge(&self, reference: &str) -> Result<(), PaywallError> {
        let path = recurring_cancel_path(reference)?;
        self.post(&path, b"{}".to_vec(), None, "recurring cancel")
            .await
            .map(|_confirmation| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use candid::Principal;

    #[test]
    fn accepted_reply_yields_reference() {
        let id = read_reference(&Nat::from(201u64), br#"{"id":"pi_123","status":"ok"}"#, "charge");
        assert_eq!(id.unwrap(), "pi_123");
    }

    #[test]
    fn rejected_or_garbled_reply_is_payment_error() {
        let declined = read_reference(&Nat::from(402u64), b"card_declined", "charge");
        assert!(matches!(declined, Err(PaywallError::PaymentError(msg)) if msg.contains("402")));

        let garbled = read_reference(&Nat::from(200u64), b"<html>", "charge");
        assert!(matches!(garbled, Err(PaywallError::PaymentError(_))));

        let empty = read_reference(&Nat::from(200u64), br#"{"id":""}"#, "charge");
        assert!(matches!(empty, Err(PaywallError::PaymentError(_))));
    }

    #[test]
    fn idempotency_keys_are_stable_and_distinct() {
        let alice = Principal::from_slice(&[1; 29]);
        let bob = Principal::from_slice(&[2; 29]);
        assert_eq!(purchase_idempotency_key(&alice, 3), purchase_idempotency_key(&alice, 3));
        assert_ne!(purchase_idempotency_key(&alice, 3), purchase_idempotency_key(&alice, 4));
        assert_ne!(purchase_idempotency_key(&alice, 3), purchase_idempotency_key(&bob, 3));
        assert_ne!(purchase_idempotency_key(&alice, 0), subscription_idempotency_key(&alice, 0));
        assert_eq!(subscription_idempotency_key(&alice, 1).len(), 64);
    }

    #[test]
    fn idempotency_key_stays_out_of_the_json_body() {
        let req = ChargeRequest {
            amount_cents: 1_000,
            currency: "usd".to_string(),
            idempotency_key: "k".to_string(),
            metadata: BTreeMap::from([("content_id".to_string(), "3".to_string())]),
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["amount_cents"], 1_000);
        assert!(json.get("idempotency_key").is_none());
    }

    #[test]
    fn cancel_path_accepts_only_plain_references() {
        assert_eq!(
            recurring_cancel_path("sub_1A2b-3.x").unwrap(),
            "/recurring/sub_1A2b-3.x/cancel"
        );
        for bad in ["", ".", "..", "sub/../charges", "sub?force=1", "sub#frag", "sub 1", "süb"] {
            assert!(matches!(
                recurring_cancel_path(bad),
                Err(PaywallError::PaymentError(_))
            ));
        }
    }

    #[test]
    fn sanitized_response_drops_headers() {
        let raw = HttpResponse {
            status: Nat::from(200u64),
            headers: vec![HttpHeader {
                name: "Date".to_string(),
                value: "Thu, 01 Jan 2026 00:00:00 GMT".to_string(),
            }],
            body: b"{}".to_vec(),
        };
        let clean = sanitize_response(raw);
        assert!(clean.headers.is_empty());
        assert_eq!(clean.body, b"{}".to_vec());
    }
}
