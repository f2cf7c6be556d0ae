// src/backend/storage/mod.rs
// Stable memory management using ic-stable-structures

pub mod billing;
pub mod config;
pub mod content;
pub mod counter;
pub mod memory;
pub mod metrics;
pub mod profiles;
pub mod purchases;
pub mod storable;
pub mod subscriptions;
pub mod traits;

// Re-export key storage structures and functions for easier access
pub use billing::{add_billing_entry, billing_entries};
pub use config::{get_config, init_config, InitArgs, PaywallConfig};
pub use content::StableContentStore;
pub use memory::Memory;
pub use metrics::{get_metrics, update_metrics};
pub use profiles::StableProfileStore;
pub use purchases::StablePurchaseStore;
pub use storable::Cbor;
pub use subscriptions::StableSubscriptionStore;
pub use traits::{ContentStore, ProfileStore, PurchaseStore, SubscriptionStore};
