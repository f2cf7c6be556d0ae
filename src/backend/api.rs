// src/backend/api.rs
// Candid API endpoint definitions (query/update functions)

use crate::{
    adapter::payment_gateway::{sanitize_response, HttpPaymentGateway},
    error::PaywallError,
    metrics::{current_metrics, PaywallMetrics},
    models::{
        BillingEntry, ContentFilter, ContentId, ContentItem, ContentView, CreatorProfile, Cycles,
        ProfileView, Purchase, PurchaseView, Role, Subscription, SubscriptionId,
    },
    services::{
        content::{ContentService, CreateContentRequest, UpdateContentRequest},
        entitlement::{AccessPolicy, BillingSettings, EntitlementService},
        profile::{ProfileService, RegisterRequest, UpdateCreatorProfileRequest},
    },
    storage::{
        billing_entries, get_config, PaywallConfig, StableContentStore, StableProfileStore,
        StablePurchaseStore, StableSubscriptionStore,
    },
    utils::{
        guards::{admin_guard, authenticated_caller, check_cycles, optional_identity},
        rate_limit::rate_guard,
        time::IcClock,
    },
};
use candid::{CandidType, Deserialize, Principal};
use ic_cdk::api::management_canister::http_request::{HttpResponse, TransformArgs};
use ic_cdk_macros::{query, update};
use validator::Validate;

const DEFAULT_PAGE_SIZE: u32 = 20;

// --- Request/Response Structs ---

#[derive(CandidType, Deserialize, Clone, Debug, Validate)]
pub struct PurchaseRequest {
    pub content_id: ContentId,
    #[validate(length(min = 1, max = 16))]
    pub payment_method: String,
    #[validate(length(max = 256))]
    pub crypto_tx_id: Option<String>,
}

#[derive(CandidType, Deserialize, Clone, Debug, Validate)]
pub struct SubscribeRequest {
    #[validate(length(min = 1, max = 16))]
    pub payment_method: String,
    #[validate(length(max = 256))]
    pub crypto_tx_id: Option<String>,
}

#[derive(CandidType, Deserialize, Clone, Debug, Validate)]
pub struct ListRequest {
    pub offset: Option<u64>,
    #[validate(range(min = 1, max = 100))]
    pub limit: Option<u32>,
}

#[derive(CandidType, Deserialize, Clone, Debug)]
pub struct ListBillingResponse {
    pub entries: Vec<BillingEntry>,
    pub total_entries: u64,
}

#[derive(CandidType, Deserialize, Clone, Debug)]
pub struct GetMetricsResponse {
    pub metrics: PaywallMetrics,
    pub cycle_balance: Cycles,
}

// --- Wiring ---

fn entitlement_service<'a>(
    gateway: &'a HttpPaymentGateway,
    config: &PaywallConfig,
) -> EntitlementService<'a, HttpPaymentGateway> {
    EntitlementService::new(
        &StableContentStore,
        &StablePurchaseStore,
        &StableSubscriptionStore,
        gateway,
        &IcClock,
        BillingSettings::from_config(config),
    )
}

/// Read paths never reach the gateway, so an unconfigured URL is fine here.
fn read_only_gateway(config: &PaywallConfig) -> HttpPaymentGateway {
    HttpPaymentGateway::new(config.gateway_url.clone())
}

fn content_service<'a>(access: &'a dyn AccessPolicy) -> ContentService<'a> {
    ContentService::new(&StableContentStore, &StableProfileStore, access, &IcClock)
}

fn profile_service() -> ProfileService<'static> {
    ProfileService::new(&StableProfileStore, &IcClock)
}

/// Common checks for state-changing calls: identity, cycles, rate limit.
fn update_caller() -> Result<Principal, PaywallError> {
    let caller = authenticated_caller()?;
    check_cycles()?;
    rate_guard(caller)?;
    Ok(caller)
}

fn viewer() -> Option<Principal> {
    optional_identity(ic_cdk::caller())
}

// --- Public Queries ---

#[query]
fn health() -> String {
    "ok".to_string()
}

#[query]
fn list_content(filter: Option<ContentFilter>) -> Vec<ContentView> {
    let config = get_config();
    let gateway = read_only_gateway(&config);
    let entitlements = entitlement_service(&gateway, &config);
    content_service(&entitlements).list_content(viewer(), &filter.unwrap_or_default())
}

#[query]
fn get_content(content_id: ContentId) -> Result<ContentView, PaywallError> {
    let config = get_config();
    let gateway = read_only_gateway(&config);
    let entitlements = entitlement_service(&gateway, &config);
    content_service(&entitlements).get_content(viewer(), content_id)
}

#[query]
fn has_access(content_id: ContentId) -> Result<bool, PaywallError> {
    let config = get_config();
    let gateway = read_only_gateway(&config);
    let entitlements = entitlement_service(&gateway, &config);
    let view = content_service(&entitlements).get_content(viewer(), content_id)?;
    Ok(view.has_access)
}

#[query]
fn my_purchases() -> Result<Vec<PurchaseView>, PaywallError> {
    let caller = authenticated_caller()?;
    let config = get_config();
    let gateway = read_only_gateway(&config);
    Ok(entitlement_service(&gateway, &config).user_purchases(caller))
}

#[query]
fn my_subscription() -> Result<Option<Subscription>, PaywallError> {
    let caller = authenticated_caller()?;
    let config = get_config();
    let gateway = read_only_gateway(&config);
    Ok(entitlement_service(&gateway, &config).user_subscription(caller))
}

#[query]
fn get_profile() -> Result<ProfileView, PaywallError> {
    profile_service().get_profile(authenticated_caller()?)
}

#[query]
fn my_content() -> Result<Vec<ContentItem>, PaywallError> {
    let caller = authenticated_caller()?;
    profile_service().require_role(caller, Role::Creator)?;
    let config = get_config();
    let gateway = read_only_gateway(&config);
    let entitlements = entitlement_service(&gateway, &config);
    Ok(content_service(&entitlements).creator_content(caller))
}

/// Strips headers from gateway replies so all replicas reach consensus.
#[query]
fn transform_gateway_response(raw: TransformArgs) -> HttpResponse {
    sanitize_response(raw.response)
}

// --- Profile Endpoints ---

#[update]
fn register(req: RegisterRequest) -> Result<ProfileView, PaywallError> {
    let caller = update_caller()?;
    profile_service().register(caller, req)
}

#[update]
fn update_creator_profile(req: UpdateCreatorProfileRequest) -> Result<CreatorProfile, PaywallError> {
    let caller = update_caller()?;
    let profiles = profile_service();
    profiles.require_role(caller, Role::Creator)?;
    profiles.update_creator_profile(caller, req)
}

// --- Content Endpoints (creators) ---

#[update]
fn create_content(req: CreateContentRequest) -> Result<ContentItem, PaywallError> {
    let caller = update_caller()?;
    profile_service().require_role(caller, Role::Creator)?;
    let config = get_config();
    let gateway = read_only_gateway(&config);
    let entitlements = entitlement_service(&gateway, &config);
    content_service(&entitlements).create_content(caller, req)
}

#[update]
fn update_content(content_id: ContentId, req: UpdateContentRequest) -> Result<ContentItem, PaywallError> {
    let caller = update_caller()?;
    profile_service().require_role(caller, Role::Creator)?;
    let config = get_config();
    let gateway = read_only_gateway(&config);
    let entitlements = entitlement_service(&gateway, &config);
    content_service(&entitlements).update_content(caller, content_id, req)
}

#[update]
fn delete_content(content_id: ContentId) -> Result<(), PaywallError> {
    let caller = update_caller()?;
    profile_service().require_role(caller, Role::Creator)?;
    let config = get_config();
    let gateway = read_only_gateway(&config);
    let entitlements = entitlement_service(&gateway, &config);
    content_service(&entitlements).delete_content(caller, content_id)
}

// --- Purchase & Subscription Endpoints (viewers) ---

#[update]
async fn purchase_content(req: PurchaseRequest) -> Result<Purchase, PaywallError> {
    req.validate()?;
    let caller = update_caller()?;
    profile_service().require_role(caller, Role::Viewer)?;

    let config = get_config();
    let gateway = HttpPaymentGateway::from_config(&config)?;
    entitlement_service(&gateway, &config)
        .create_purchase(caller, req.content_id, &req.payment_method, req.crypto_tx_id)
        .await
}

#[update]
async fn subscribe(req: SubscribeRequest) -> Result<Subscription, PaywallError> {
    req.validate()?;
    let caller = update_caller()?;
    profile_service().require_role(caller, Role::Viewer)?;

    let config = get_config();
    let gateway = HttpPaymentGateway::from_config(&config)?;
    entitlement_service(&gateway, &config)
        .create_subscription(caller, &req.payment_method, req.crypto_tx_id)
        .await
}

#[update]
async fn cancel_subscription(subscription_id: SubscriptionId) -> Result<Subscription, PaywallError> {
    let caller = update_caller()?;
    let config = get_config();
    let gateway = HttpPaymentGateway::from_config(&config)?;
    entitlement_service(&gateway, &config)
        .cancel_subscription(caller, subscription_id)
        .await
}

// --- Admin Endpoints ---

#[query(guard = "admin_guard")]
fn list_billing(req: ListRequest) -> Result<ListBillingResponse, PaywallError> {
    req.validate()?;
    let offset = req.offset.unwrap_or(0);
    let limit = req.limit.unwrap_or(DEFAULT_PAGE_SIZE) as usize;
    let (entries, total_entries) = billing_entries(offset, limit);
    Ok(ListBillingResponse {
        entries,
        total_entries,
    })
}

#[query(guard = "admin_guard")]
fn get_metrics() -> GetMetricsResponse {
    GetMetricsResponse {
        metrics: current_metrics(),
        cycle_balance: ic_cdk::api::canister_balance128(),
    }
}
