// src/backend/lib.rs

pub mod adapter;
pub mod api;
pub mod error;
pub mod metrics;
pub mod models;
pub mod services;
pub mod storage;
pub mod utils;

#[cfg(test)]
pub(crate) mod testing;

use crate::api::*;
use crate::error::PaywallError;
use crate::models::*;
use crate::services::content::{CreateContentRequest, UpdateContentRequest};
use crate::services::profile::{RegisterRequest, UpdateCreatorProfileRequest};
use crate::storage::config::InitArgs;
use ic_cdk::api::management_canister::http_request::{HttpResponse, TransformArgs};

#[ic_cdk::init]
fn init(args: InitArgs) {
    match storage::init_config(args) {
        Ok(config) => crate::log_info!("Paywall canister initialized. Admin: {}", config.admin),
        Err(e) => ic_cdk::trap(&format!("Failed to initialize configuration: {}", e)),
    }
}

#[ic_cdk::post_upgrade]
fn post_upgrade(args: Option<InitArgs>) {
    // Stable structures reattach to their memories on first access.
    if let Some(args) = args {
        if let Err(e) = storage::init_config(args) {
            ic_cdk::trap(&format!("Failed to apply upgrade configuration: {}", e));
        }
    }
    crate::log_info!("Paywall canister upgraded. Admin: {}", storage::get_config().admin);
}

// Export Candid interface
ic_cdk::export_candid!();
