// src/backend/storage/memory.rs
use ic_stable_structures::memory_manager::{MemoryId, MemoryManager, VirtualMemory};
use ic_stable_structures::DefaultMemoryImpl;
use std::cell::RefCell;

// Define Memory IDs for stable structures
// Choose non-overlapping IDs
const CONFIG_MEM_ID: MemoryId = MemoryId::new(0);
const CONTENT_COUNTER_MEM_ID: MemoryId = MemoryId::new(1);
const CONTENT_ITEMS_MEM_ID: MemoryId = MemoryId::new(2);
const PURCHASE_COUNTER_MEM_ID: MemoryId = MemoryId::new(3);
const PURCHASES_MEM_ID: MemoryId = MemoryId::new(4);
const SUBSCRIPTION_COUNTER_MEM_ID: MemoryId = MemoryId::new(5);
const SUBSCRIPTIONS_MEM_ID: MemoryId = MemoryId::new(6);
const SUBSCRIPTIONS_BY_USER_MEM_ID: MemoryId = MemoryId::new(7);
const USERS_MEM_ID: MemoryId = MemoryId::new(8);
const CREATOR_PROFILES_MEM_ID: MemoryId = MemoryId::new(9);
const BILLING_LOG_INDEX_MEM_ID: MemoryId = MemoryId::new(10);
const BILLING_LOG_DATA_MEM_ID: MemoryId = MemoryId::new(11);
const METRICS_MEM_ID: MemoryId = MemoryId::new(12);
// Reserve IDs 13-99 for future use

// Define memory type alias
pub type Memory = VirtualMemory<DefaultMemoryImpl>;

thread_local! {
    // Memory manager
    static MEMORY_MANAGER: RefCell<MemoryManager<DefaultMemoryImpl>> = RefCell::new(
        MemoryManager::init(DefaultMemoryImpl::default())
    );
}

/// Get memory instance for a specific MemoryId.
pub fn get_memory(id: MemoryId) -> Memory {
    MEMORY_MANAGER.with(|m| m.borrow().get(id))
}

// Functions to get specific memory instances
pub fn get_config_memory() -> Memory {
    get_memory(CONFIG_MEM_ID)
}

pub fn get_content_counter_memory() -> Memory {
    get_memory(CONTENT_COUNTER_MEM_ID)
}

pub fn get_content_items_memory() -> Memory {
    get_memory(CONTENT_ITEMS_MEM_ID)
}

pub fn get_purchase_counter_memory() -> Memory {
    get_memory(PURCHASE_COUNTER_MEM_ID)
}

pub fn get_purchases_memory() -> Memory {
    get_memory(PURCHASES_MEM_ID)
}

pub fn get_subscription_counter_memory() -> Memory {
    get_memory(SUBSCRIPTION_COUNTER_MEM_ID)
}

pub fn get_subscriptions_memory() -> Memory {
    get_memory(SUBSCRIPTIONS_MEM_ID)
}

pub fn get_subscriptions_by_user_memory() -> Memory {
    get_memory(SUBSCRIPTIONS_BY_USER_MEM_ID)
}

pub fn get_users_memory() -> Memory {
    get_memory(USERS_MEM_ID)
}

pub fn get_creator_profiles_memory() -> Memory {
    get_memory(CREATOR_PROFILES_MEM_ID)
}

pub fn get_billing_log_index_memory() -> Memory {
    get_memory(BILLING_LOG_INDEX_MEM_ID)
}

pub fn get_billing_log_data_memory() -> Memory {
    get_memory(BILLING_LOG_DATA_MEM_ID)
}

pub fn get_metrics_memory() -> Memory {
    get_memory(METRICS_MEM_ID)
}
