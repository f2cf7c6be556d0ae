// src/backend/services/entitlement.rs
use crate::{
    adapter::payment_gateway::{
        purchase_idempotency_key, subscription_idempotency_key, BillingInterval, ChargeRequest,
        PaymentGateway, RecurringChargeRequest,
    },
    error::PaywallError,
    metrics,
    models::{
        BillingEntry, BillingKind, Cents, ContentId, ContentItem, NewPurchase, NewSubscription,
        PaymentMethod, Purchase, PurchaseView, PurchasedContent, Subscription, SubscriptionId,
        SubscriptionStatus, UserId,
    },
    storage::{
        self,
        config::PaywallConfig,
        traits::{ContentStore, PurchaseStore, SubscriptionStore},
    },
    utils::{guards::optional_identity, time::add_one_month, time::Clock},
};
use std::collections::BTreeMap;

const SUBSCRIPTION_PRODUCT_NAME: &str = "Unlimited access (monthly)";

/// Decides whether a viewer may see the full asset of a content item.
pub trait AccessPolicy {
    fn has_full_access(&self, user: Option<UserId>, content: &ContentItem) -> bool;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BillingSettings {
    pub currency: String,
    pub monthly_price_cents: Cents,
}

impl BillingSettings {
    pub fn from_config(config: &PaywallConfig) -> Self {
        Self {
            currency: config.currency.clone(),
            monthly_price_cents: config.monthly_price_cents,
        }
    }
}

/// Purchase and subscription state transitions, plus the access decision
/// derived from them. Owns no data: every answer is read from the stores
/// at call time.
pub struct EntitlementService<'a, G: PaymentGateway> {
    content: &'a dyn ContentStore,
    purchases: &'a dyn PurchaseStore,
    subscriptions: &'a dyn SubscriptionStore,
    gateway: &'a G,
    clock: &'a dyn Clock,
    billing: BillingSettings,
}

impl<'a, G: PaymentGateway> EntitlementService<'a, G> {
    pub fn new(
        content: &'a dyn ContentStore,
        purchases: &'a dyn PurchaseStore,
        subscriptions: &'a dyn SubscriptionStore,
        gateway: &'a G,
        clock: &'a dyn Clock,
        billing: BillingSettings,
    ) -> Self {
        Self {
            content,
            purchases,
            subscriptions,
            gateway,
            clock,
            billing,
        }
    }

    /// Records a one-off purchase of `content_id` by `user`.
    ///
    /// # Arguments
    /// * `method` - `"CARD"` or `"CRYPTO"`, as sent by the client.
    /// * `crypto_tx_id` - Required for `"CRYPTO"`; ignored for `"CARD"`.
    ///
    /// # Returns
    /// * `Result<Purchase, PaywallError>` - The stored purchase, charged at
    ///   the item's price at this moment.
    pub async fn create_purchase(
        &self,
        user: UserId,
        content_id: ContentId,
        method: &str,
        crypto_tx_id: Option<String>,
    ) -> Result<Purchase, PaywallError> {
        let user = optional_identity(user).ok_or(PaywallError::Unauthenticated)?;
        let payment_method = PaymentMethod::parse(method)?;
        let content = self
            .content
            .get_content(content_id)
            .ok_or_else(|| PaywallError::NotFound(format!("Content {} not found", content_id)))?;

        if self.purchases.find_purchase(user, content_id).is_some() {
            return Err(PaywallError::Conflict(format!(
                "Content {} already purchased by {}",
                content_id, user
            )));
        }

        let amount_cents = content.price_cents;
        let payment_id = match payment_method {
            PaymentMethod::Card => {
                let request = ChargeRequest {
                    amount_cents,
                    currency: self.billing.currency.clone(),
                    idempotency_key: purchase_idempotency_key(&user, content_id),
                    metadata: BTreeMap::from([
                        ("content_id".to_string(), content_id.to_string()),
                        ("user".to_string(), user.to_text()),
                    ]),
                };
                self.gateway
                    .charge_once(request)
                    .await
                    .map_err(|e| self.payment_failed("purchase", user, e))?
            }
            PaymentMethod::Crypto => accept_crypto_tx(crypto_tx_id, user)?,
        };

        let now = self.clock.now_ns();
        let purchase = self
            .purchases
            .insert_purchase(NewPurchase {
                user,
                content_id,
                amount_cents,
                payment_method,
                payment_id: payment_id.clone(),
                created_at: now,
            })
            .map_err(|e| {
                if payment_method == PaymentMethod::Card {
                    crate::log_error!(
                        "Charge {} for content {} by {} accepted but purchase not stored ({}); needs manual reconciliation",
                        payment_id, content_id, user, e
                    );
                }
                e
            })?;

        record_billing(BillingEntry {
            timestamp: now,
            user,
            kind: BillingKind::Purchase { content_id },
            amount_cents,
            currency: self.billing.currency.clone(),
            payment_method,
            payment_ref: Some(purchase.payment_id.clone()),
        });
        metrics::record_purchase(now, amount_cents);
        crate::log_info!(
            "Purchase {} recorded: content {} by {} for {} cents via {}",
            purchase.id, content_id, user, amount_cents, payment_method.as_str()
        );
        Ok(purchase)
    }

    /// Starts a one-month subscription granting access to every item.
    pub async fn create_subscription(
        &self,
        user: UserId,
        method: &str,
        crypto_tx_id: Option<String>,
    ) -> Result<Subscription, PaywallError> {
        let user = optional_identity(user).ok_or(PaywallError::Unauthenticated)?;
        let payment_method = PaymentMethod::parse(method)?;
        let start = self.clock.now_ns();

        if let Some(existing) = self.subscriptions.active_subscription(user, start) {
            return Err(PaywallError::Conflict(format!(
                "Subscription {} is still active for {}",
                existing.id, user
            )));
        }

        let (external_ref, crypto_tx_id) = match payment_method {
            PaymentMethod::Card => {
                let ordinal = self.subscriptions.count_for_user(user);
                let request = RecurringChargeRequest {
                    amount_cents: self.billing.monthly_price_cents,
                    currency: self.billing.currency.clone(),
                    interval: BillingInterval::Month,
                    product_name: SUBSCRIPTION_PRODUCT_NAME.to_string(),
                    idempotency_key: subscription_idempotency_key(&user, ordinal),
                    metadata: BTreeMap::from([("user".to_string(), user.to_text())]),
                };
                let reference = self
                    .gateway
                    .create_recurring_charge(request)
                    .await
                    .map_err(|e| self.payment_failed("subscription", user, e))?;
                (Some(reference), None)
            }
            PaymentMethod::Crypto => (None, Some(accept_crypto_tx(crypto_tx_id, user)?)),
        };

        let end = add_one_month(start)?;
        let subscription = self
            .subscriptions
            .insert_if_none_active(
                NewSubscription {
                    user,
                    start_date: start,
                    end_date: end,
                    monthly_price_cents: self.billing.monthly_price_cents,
                    payment_method,
                    external_ref: external_ref.clone(),
                    crypto_tx_id,
                },
                start,
            )
            .map_err(|e| {
                if let Some(reference) = &external_ref {
                    let active = self.subscriptions.active_subscription(user, start);
                    if is_orphaned_reference(reference, active.as_ref()) {
                        crate::log_error!(
                            "Recurring charge {} for {} registered but subscription not stored ({}); needs manual reconciliation",
                            reference, user, e
                        );
                    }
                }
                e
            })?;

        record_billing(BillingEntry {
            timestamp: start,
            user,
            kind: BillingKind::Subscription {
                subscription_id: subscription.id,
            },
            amount_cents: subscription.monthly_price_cents,
            currency: self.billing.currency.clone(),
            payment_method,
            payment_ref: subscription
                .external_ref
                .clone()
                .or_else(|| subscription.crypto_tx_id.clone()),
        });
        metrics::record_subscription_started(start);
        crate::log_info!(
            "Subscription {} created for {} via {}, valid until {}",
            subscription.id, user, payment_method.as_str(), subscription.end_date
        );
        Ok(subscription)
    }

    /// Cancels `subscription_id` on behalf of its owner. The gateway is asked
    /// first; if it refuses, the local record stays `Active`.
    pub async fn cancel_subscription(
        &self,
        user: UserId,
        subscription_id: SubscriptionId,
    ) -> Result<Subscription, PaywallError> {
        let mut subscription = self
            .subscriptions
            .get_subscription(subscription_id)
            .ok_or_else(|| {
                PaywallError::NotFound(format!("Subscription {} not found", subscription_id))
            })?;

        if optional_identity(user) != Some(subscription.user) {
            return Err(PaywallError::Forbidden(format!(
                "Subscription {} does not belong to {}",
                subscription_id, user
            )));
        }

        if subscription.status == SubscriptionStatus::Cancelled {
            return Ok(subscription);
        }

        if let Some(reference) = &subscription.external_ref {
            self.gateway
                .cancel_recurring_charge(reference)
                .await
                .map_err(|e| self.payment_failed("cancellation", user, e))?;
        }

        let now = self.clock.now_ns();
        subscription.status = SubscriptionStatus::Cancelled;
        subscription.cancelled_at = Some(now);
        self.subscriptions
            .update_subscription(&subscription)
            .map_err(|e| {
                if let Some(reference) = &subscription.external_ref {
                    crate::log_error!(
                        "Recurring charge {} cancelled at gateway but subscription {} not updated ({}); needs manual reconciliation",
                        reference, subscription_id, e
                    );
                }
                e
            })?;

        metrics::record_subscription_cancelled(now);
        crate::log_info!("Subscription {} cancelled by {}", subscription_id, user);
        Ok(subscription)
    }

    /// Purchases of `user`, newest first, with a summary of the item when it
    /// still exists.
    pub fn user_purchases(&self, user: UserId) -> Vec<PurchaseView> {
        self.purchases
            .purchases_by_user(user)
            .into_iter()
            .map(|purchase| {
                let content = self
                    .content
                    .get_content(purchase.content_id)
                    .map(|item| PurchasedContent {
                        title: item.title,
                        content_type: item.content_type,
                        full_asset: item.full_asset,
                        preview_asset: item.preview_asset,
                    });
                PurchaseView { purchase, content }
            })
            .collect()
    }

    pub fn user_subscription(&self, user: UserId) -> Option<Subscription> {
        self.subscriptions.latest_subscription(user)
    }

    fn payment_failed(&self, operation: &str, user: UserId, error: PaywallError) -> PaywallError {
        metrics::record_payment_failure(self.clock.now_ns());
        crate::log_warn!("Gateway rejected {} for {}: {}", operation, user, error);
        error
    }
}

impl<G: PaymentGateway> AccessPolicy for EntitlementService<'_, G> {
    /// True iff `user` bought this item or holds a subscription that is
    /// `Active` with an end date after now. Anonymous callers never qualify.
    fn has_full_access(&self, user: Option<UserId>, content: &ContentItem) -> bool {
        let Some(user) = user.and_then(optional_identity) else {
            return false;
        };
        if self.purchases.find_purchase(user, content.id).is_some() {
            return true;
        }
        self.subscriptions
            .active_subscription(user, self.clock.now_ns())
            .is_some()
    }
}

// TODO: verify the transaction on-chain before granting access.
fn accept_crypto_tx(crypto_tx_id: Option<String>, user: UserId) -> Result<String, PaywallError> {
    let tx_id = crypto_tx_id
        .map(|tx| tx.trim().to_string())
        .filter(|tx| !tx.is_empty())
        .ok_or_else(|| {
            PaywallError::InvalidInput("Crypto payment requires a transaction id".to_string())
        })?;
    crate::log_warn!("Accepting unverified crypto transaction {} from {}", tx_id, user);
    Ok(tx_id)
}

/// A recurring charge is orphaned when no stored subscription carries its
/// reference. A concurrent duplicate sends the same idempotency key, so the
/// gateway hands back the reference already held by the winner.
fn is_orphaned_reference(reference: &str, active: Option<&Subscription>) -> bool {
    active.and_then(|s| s.external_ref.as_deref()) != Some(reference)
}

fn record_billing(entry: BillingEntry) {
    if let Err(e) = storage::add_billing_entry(entry) {
        crate::log_error!("Failed to append billing entry: {}", e);
    }
}
