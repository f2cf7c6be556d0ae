// src/backend/storage/counter.rs
use crate::error::PaywallError;
use crate::storage::memory::Memory;
use ic_stable_structures::StableCell;
use std::cell::RefCell;
use std::thread::LocalKey;

pub type IdCounter = RefCell<StableCell<u64, Memory>>;

/// Returns the next id from `counter` and advances it.
pub fn next_id(counter: &'static LocalKey<IdCounter>, label: &str) -> Result<u64, PaywallError> {
    counter.with(|cell_ref| {
        let current_val = *cell_ref.borrow().get();
        let next_val = current_val
            .checked_add(1)
            .ok_or_else(|| PaywallError::InternalError(format!("{} counter overflow", label)))?;
        cell_ref
            .borrow_mut()
            .set(next_val)
            .map_err(|e| PaywallError::StorageError(format!("Failed to update {} counter: {:?}", label, e)))?;
        Ok(current_val)
    })
}
