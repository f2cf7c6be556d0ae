use crate::error::PaywallError;
use crate::models::common::TimestampNs;
use chrono::{Months, TimeZone, Utc};

/// Source of the current time. Entitlement decisions read it once per call.
pub trait Clock {
    fn now_ns(&self) -> TimestampNs;
}

/// Replica time, as seen by the executing message.
pub struct IcClock;

impl Clock for IcClock {
    fn now_ns(&self) -> TimestampNs {
        get_current_time_ns()
    }
}

/// Returns the current Internet Computer time as nanoseconds since epoch.
pub fn get_current_time_ns() -> TimestampNs {
    ic_cdk::api::time()
}

/// Moves a timestamp forward by one calendar month, keeping the day of month
/// and time of day. A day that does not exist in the next month is clamped
/// to that month's last day (Jan 31 -> Feb 28/29).
pub fn add_one_month(start_ns: TimestampNs) -> Result<TimestampNs, PaywallError> {
    let nanos = i64::try_from(start_ns)
        .map_err(|_| PaywallError::InternalError(format!("Timestamp {} out of range", start_ns)))?;
    let end = Utc
        .timestamp_nanos(nanos)
        .checked_add_months(Months::new(1))
        .ok_or_else(|| PaywallError::InternalError("Subscription end date overflow".to_string()))?;
    end.timestamp_nanos_opt()
        .and_then(|ns| u64::try_from(ns).ok())
        .ok_or_else(|| PaywallError::InternalError("Subscription end date out of range".to_string()))
}
