use crate::models::billing::BillingEntry;
use crate::storage::memory::{get_billing_log_data_memory, get_billing_log_index_memory, Memory};
use crate::storage::storable::Cbor;
use ic_stable_structures::StableLog;
use std::cell::RefCell;

type StorableBillingEntry = Cbor<BillingEntry>;

thread_local! {
    /// Billing Log: Append-only log of accepted charges.
    static BILLING_LOG: RefCell<StableLog<StorableBillingEntry, Memory, Memory>> = RefCell::new(
        StableLog::init(get_billing_log_index_memory(), get_billing_log_data_memory())
            .expect("Failed to initialize billing log")
    );
}

/// Appends a billing entry and returns its index.
pub fn add_billing_entry(entry: BillingEntry) -> Result<u64, String> {
    BILLING_LOG.with(|log| {
        log.borrow_mut()
            .append(&Cbor(entry))
            .map_err(|e| format!("Failed to append billing entry: {:?}", e))
    })
}

/// One page of the billing log, oldest first, plus the total entry count.
pub fn billing_entries(offset: u64, limit: usize) -> (Vec<BillingEntry>, u64) {
    BILLING_LOG.with(|log| {
        let log = log.borrow();
        let total = log.len();
        let entries = (offset..total)
            .take(limit)
            .filter_map(|idx| log.get(idx).map(|cbor_entry| cbor_entry.0))
            .collect();
        (entries, total)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BillingKind, PaymentMethod};
    use candid::Principal;

    fn entry(content_id: u64) -> BillingEntry {
        BillingEntry {
            timestamp: content_id,
            user: Principal::from_slice(&[1; 29]),
            kind: BillingKind::Purchase { content_id },
            amount_cents: 500,
            currency: "usd".to_string(),
            payment_method: PaymentMethod::Card,
            payment_ref: Some(format!("pi_{}", content_id)),
        }
    }

    #[test]
    fn pages_through_the_log() {
        for id in 0..5 {
            add_billing_entry(entry(id)).unwrap();
        }
        let (page, total) = billing_entries(3, 10);
        assert_eq!(total, 5);
        assert_eq!(page, vec![entry(3), entry(4)]);

        let (empty, _) = billing_entries(9, 10);
        assert!(empty.is_empty());
    }
}
