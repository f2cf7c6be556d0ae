use crate::error::PaywallError;
use crate::storage::config::get_config;
use candid::Principal;
use ic_cdk::api::canister_balance128;

/// Checks if the canister has sufficient cycles.
///
/// # Errors
///
/// Returns `PaywallError::CycleLow` if the balance is below the configured threshold.
pub fn check_cycles() -> Result<(), PaywallError> {
    let balance = canister_balance128();
    let threshold = get_config().min_cycles_threshold;
    if balance < threshold {
        crate::log_warn!(
            "Cycle balance low: {} cycles, threshold: {}",
            balance,
            threshold
        );
        Err(PaywallError::CycleLow)
    } else {
        Ok(())
    }
}

/// Maps the anonymous principal to "no identity".
pub fn optional_identity(principal: Principal) -> Option<Principal> {
    if principal == Principal::anonymous() {
        None
    } else {
        Some(principal)
    }
}

/// Returns the caller, rejecting anonymous calls.
pub fn authenticated_caller() -> Result<Principal, PaywallError> {
    optional_identity(ic_cdk::caller()).ok_or(PaywallError::Unauthenticated)
}

/// Checks that `principal` is the configured admin.
pub fn require_admin(principal: Principal, admin: Principal) -> Result<(), PaywallError> {
    if principal == admin {
        Ok(())
    } else {
        Err(PaywallError::Forbidden(
            "Caller is not the canister admin.".to_string(),
        ))
    }
}

/// Guard for admin-only endpoints (`#[query(guard = "admin_guard")]`).
pub fn admin_guard() -> Result<(), String> {
    require_admin(ic_cdk::caller(), get_config().admin).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anonymous_is_no_identity() {
        assert_eq!(optional_identity(Principal::anonymous()), None);
        let user = Principal::from_slice(&[7; 29]);
        assert_eq!(optional_identity(user), Some(user));
    }

    #[test]
    fn only_configured_admin_passes() {
        let admin = Principal::from_slice(&[1; 29]);
        let other = Principal::from_slice(&[2; 29]);
        assert!(require_admin(admin, admin).is_ok());
        assert!(matches!(require_admin(other, admin), Err(PaywallError::Forbidden(_))));
    }
}
