// src/backend/storage/config.rs
use crate::models::common::{Cents, Cycles};
use crate::storage::memory::{get_config_memory, Memory};
use crate::storage::storable::Cbor;
use candid::{CandidType, Principal};
use ic_stable_structures::StableCell;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;

// Default values (used until init args provide them)
const DEFAULT_CURRENCY: &str = "usd";
const DEFAULT_MONTHLY_PRICE_CENTS: Cents = 2_999; // 29.99
const DEFAULT_MIN_CYCLES_THRESHOLD: Cycles = 10_000_000_000; // 10B cycles

/// Arguments accepted by `init` and `post_upgrade`.
#[derive(CandidType, Deserialize, Clone, Debug)]
pub struct InitArgs {
    pub admin: Principal,
    /// Base URL of the payment bridge, e.g. `https://payments.example.com/v1`.
    pub gateway_url: String,
    pub currency: Option<String>,
    pub monthly_price_cents: Option<Cents>,
    pub min_cycles_threshold: Option<Cycles>,
}

#[derive(CandidType, Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
pub struct PaywallConfig {
    pub admin: Principal,
    pub gateway_url: String,
    pub currency: String,
    pub monthly_price_cents: Cents,
    pub min_cycles_threshold: Cycles,
}

impl Default for PaywallConfig {
    fn default() -> Self {
        Self {
            admin: Principal::anonymous(),
            gateway_url: String::new(),
            currency: DEFAULT_CURRENCY.to_string(),
            monthly_price_cents: DEFAULT_MONTHLY_PRICE_CENTS,
            min_cycles_threshold: DEFAULT_MIN_CYCLES_THRESHOLD,
        }
    }
}

impl PaywallConfig {
    /// Applies init args on top of `self`; absent optionals keep their current value.
    pub fn with_args(self, args: InitArgs) -> Self {
        Self {
            admin: args.admin,
            gateway_url: args.gateway_url,
            currency: args.currency.unwrap_or(self.currency),
            monthly_price_cents: args.monthly_price_cents.unwrap_or(self.monthly_price_cents),
            min_cycles_threshold: args.min_cycles_threshold.unwrap_or(self.min_cycles_threshold),
        }
    }
}

thread_local! {
    /// Stable cell for the canister configuration
    static CONFIG: RefCell<StableCell<Cbor<PaywallConfig>, Memory>> = RefCell::new(
        StableCell::init(get_config_memory(), Cbor(PaywallConfig::default()))
            .expect("Failed to initialize config stable cell")
    );
}

/// Initialize the configuration values from InitArgs.
/// Should be called only during canister initialization or upgrade.
pub fn init_config(args: InitArgs) -> Result<PaywallConfig, String> {
    let config = get_config().with_args(args);
    set_config(config.clone())?;
    crate::log_info!(
        "Configuration initialized: Admin={}, Gateway={}, Currency={}, MonthlyPrice={}",
        config.admin,
        config.gateway_url,
        config.currency,
        config.monthly_price_cents
    );
    Ok(config)
}

pub fn get_config() -> PaywallConfig {
    CONFIG.with(|cell| cell.borrow().get().0.clone())
}

pub fn set_config(config: PaywallConfig) -> Result<(), String> {
    CONFIG.with(|cell| {
        cell.borrow_mut()
            .set(Cbor(config))
            .map(|_old_value| ())
            .map_err(|e| format!("Failed to set config: {:?}", e))
    })
}
