use crate::metrics::PaywallMetrics;
use crate::storage::memory::{get_metrics_memory, Memory};
use crate::storage::storable::Cbor;
use ic_stable_structures::StableCell;
use std::cell::RefCell;

type MetricsCell = StableCell<Cbor<PaywallMetrics>, Memory>;

thread_local! {
    // Counters read by the admin metrics endpoint.
    static METRICS_CELL: RefCell<MetricsCell> = RefCell::new(
        StableCell::init(get_metrics_memory(), Cbor(PaywallMetrics::default()))
            .expect("Failed to initialize paywall metrics cell")
    );
}

pub fn get_metrics() -> PaywallMetrics {
    METRICS_CELL.with(|cell| get_metrics_from(&cell.borrow()))
}

/// Applies `update_fn` to a copy of the counters and writes the copy back.
pub fn update_metrics<F>(update_fn: F) -> Result<(), String>
where
    F: FnOnce(&mut PaywallMetrics),
{
    METRICS_CELL.with(|cell| {
        let mut metrics = get_metrics_from(&cell.borrow());
        update_fn(&mut metrics);
        cell.borrow_mut()
            .set(Cbor(metrics))
            .map(|_previous| ())
            .map_err(|e| format!("Failed to persist paywall metrics: {:?}", e))
    })
}

fn get_metrics_from(cell: &MetricsCell) -> PaywallMetrics {
    cell.get().0.clone()
}
