use crate::error::PaywallError;
use crate::models::common::TimestampNs;
use crate::utils::time::{Clock, IcClock};
use candid::Principal;
use std::cell::RefCell;
use std::collections::HashMap;

// --- Configuration ---
const RATE_LIMIT_CAPACITY: u32 = 20; // Max tokens in bucket (burst capacity)
const RATE_LIMIT_REFILL_RATE_PER_SEC: f64 = 1.0; // Tokens added per second

struct TokenBucket {
    tokens: f64,
    last_refill_time_ns: TimestampNs,
}

impl TokenBucket {
    fn new(now_ns: TimestampNs) -> Self {
        TokenBucket {
            tokens: RATE_LIMIT_CAPACITY as f64,
            last_refill_time_ns: now_ns,
        }
    }

    fn refill(&mut self, now_ns: TimestampNs) {
        let elapsed_secs = (now_ns.saturating_sub(self.last_refill_time_ns)) as f64 / 1_000_000_000.0;
        let tokens_to_add = elapsed_secs * RATE_LIMIT_REFILL_RATE_PER_SEC;

        self.tokens = (self.tokens + tokens_to_add).min(RATE_LIMIT_CAPACITY as f64);
        self.last_refill_time_ns = now_ns;
    }

    fn take(&mut self, now_ns: TimestampNs) -> bool {
        self.refill(now_ns);
        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

thread_local! {
    // In-memory map for rate limiting. Cleared on upgrade.
    static PRINCIPAL_BUCKETS: RefCell<HashMap<Principal, TokenBucket>> = RefCell::new(HashMap::new());
}

/// Spends one token from `principal`'s bucket.
pub fn check_rate(principal: Principal, clock: &dyn Clock) -> Result<(), PaywallError> {
    let now_ns = clock.now_ns();
    PRINCIPAL_BUCKETS.with(|buckets_refcell| {
        let mut buckets = buckets_refcell.borrow_mut();
        let bucket = buckets
            .entry(principal)
            .or_insert_with(|| TokenBucket::new(now_ns));

        if bucket.take(now_ns) {
            Ok(())
        } else {
            Err(PaywallError::RateLimitExceeded(format!(
                "Rate limit exceeded for principal {}. Please try again later.",
                principal
            )))
        }
    })
}

/// Rate limit for the current caller on update endpoints.
pub fn rate_guard(caller: Principal) -> Result<(), PaywallError> {
    check_rate(caller, &IcClock)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FixedClock;

    #[test]
    fn burst_is_capped_then_refills() {
        let clock = FixedClock::new(1_000);
        let user = Principal::from_slice(&[9; 29]);
        for _ in 0..RATE_LIMIT_CAPACITY {
            check_rate(user, &clock).unwrap();
        }
        assert!(matches!(
            check_rate(user, &clock),
            Err(PaywallError::RateLimitExceeded(_))
        ));

        clock.advance(2_000_000_000);
        assert!(check_rate(user, &clock).is_ok());
        assert!(check_rate(user, &clock).is_ok());
        assert!(check_rate(user, &clock).is_err());
    }

    #[test]
    fn buckets_are_per_principal() {
        let clock = FixedClock::new(0);
        let a = Principal::from_slice(&[1; 29]);
        let b = Principal::from_slice(&[2; 29]);
        for _ in 0..RATE_LIMIT_CAPACITY {
            check_rate(a, &clock).unwrap();
        }
        assert!(check_rate(a, &clock).is_err());
        assert!(check_rate(b, &clock).is_ok());
    }
}
