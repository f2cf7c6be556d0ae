// src/backend/services/profile.rs
use crate::{
    error::PaywallError,
    models::{CreatorProfile, ProfileView, Role, UserId, UserProfile},
    storage::traits::ProfileStore,
    utils::{guards::optional_identity, time::Clock},
};
use candid::CandidType;
use serde::Deserialize;
use validator::Validate;

#[derive(CandidType, Deserialize, Clone, Debug, Validate)]
pub struct RegisterRequest {
    #[validate(email)]
    pub email: String,
    pub role: Role,
}

#[derive(CandidType, Deserialize, Clone, Debug, Default, Validate)]
pub struct UpdateCreatorProfileRequest {
    #[validate(email)]
    pub paypal_email: Option<String>,
    #[validate(length(min = 1, max = 128))]
    pub crypto_address: Option<String>,
    #[validate(length(max = 2000))]
    pub billing_info: Option<String>,
}

pub struct ProfileService<'a> {
    profiles: &'a dyn ProfileStore,
    clock: &'a dyn Clock,
}

impl<'a> ProfileService<'a> {
    pub fn new(profiles: &'a dyn ProfileStore, clock: &'a dyn Clock) -> Self {
        Self { profiles, clock }
    }

    /// Registers the calling principal. Creators also get an empty payout
    /// profile they fill in later.
    pub fn register(&self, caller: UserId, req: RegisterRequest) -> Result<ProfileView, PaywallError> {
        let principal = optional_identity(caller).ok_or(PaywallError::Unauthenticated)?;
        req.validate()?;

        let now = self.clock.now_ns();
        let user = UserProfile {
            principal,
            email: req.email.trim().to_lowercase(),
            role: req.role,
            created_at: now,
        };
        self.profiles.insert_user(user.clone())?;

        let creator_profile = if user.role == Role::Creator {
            let profile = CreatorProfile {
                principal,
                paypal_email: None,
                crypto_address: None,
                billing_info: None,
                updated_at: now,
            };
            self.profiles.put_creator_profile(profile.clone());
            Some(profile)
        } else {
            None
        };

        crate::log_info!("Registered {} as {:?}", principal, user.role);
        Ok(ProfileView {
            user,
            creator_profile,
        })
    }

    pub fn get_profile(&self, caller: UserId) -> Result<ProfileView, PaywallError> {
        let user = self
            .profiles
            .get_user(caller)
            .ok_or_else(|| PaywallError::NotFound(format!("User {} is not registered", caller)))?;
        Ok(ProfileView {
            creator_profile: self.profiles.get_creator_profile(caller),
            user,
        })
    }

    /// Updates the payout details of `caller`'s creator profile. Fields left
    /// as `None` keep their stored value.
    pub fn update_creator_profile(
        &self,
        caller: UserId,
        req: UpdateCreatorProfileRequest,
    ) -> Result<CreatorProfile, PaywallError> {
        req.validate()?;
        let mut profile = self.profiles.get_creator_profile(caller).ok_or_else(|| {
            PaywallError::NotFound(format!("Creator profile not found for {}", caller))
        })?;
        if let Some(paypal_email) = req.paypal_email {
            profile.paypal_email = Some(paypal_email);
        }
        if let Some(crypto_address) = req.crypto_address {
            profile.crypto_address = Some(crypto_address);
        }
        if let Some(billing_info) = req.billing_info {
            profile.billing_info = Some(billing_info);
        }
        profile.updated_at = self.clock.now_ns();
        self.profiles.put_creator_profile(profile.clone());
        crate::log_info!("Creator profile of {} updated", caller);
        Ok(profile)
    }

    /// The registered profile of `caller`, provided it has `role`.
    pub fn require_role(&self, caller: UserId, role: Role) -> Result<UserProfile, PaywallError> {
        match self.profiles.get_user(caller) {
            Some(user) if user.role == role => Ok(user),
            Some(user) => Err(PaywallError::Forbidden(format!(
                "{} is registered as {:?}, not {:?}",
                caller, user.role, role
            ))),
            None => Err(PaywallError::Forbidden(format!(
                "{} must register as {:?} first",
                caller, role
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StableProfileStore;
    use crate::testing::{principal, FixedClock};
    use candid::Principal;

    fn register(email: &str, role: Role) -> RegisterRequest {
        RegisterRequest {
            email: email.to_string(),
            role,
        }
    }

    #[test]
    fn creators_get_an_empty_creator_profile() {
        let clock = FixedClock::new(5);
        let service = ProfileService::new(&StableProfileStore, &clock);

        let creator = service
            .register(principal(1), register("Maker@Example.com", Role::Creator))
            .unwrap();
        assert_eq!(creator.user.email, "maker@example.com");
        assert_eq!(creator.creator_profile.as_ref().map(|p| p.updated_at), Some(5));

        let viewer = service
            .register(principal(2), register("fan@example.com", Role::Viewer))
            .unwrap();
        assert_eq!(viewer.creator_profile, None);
        assert_eq!(service.get_profile(principal(1)).unwrap(), creator);
    }

    #[test]
    fn registration_rejections() {
        let clock = FixedClock::new(5);
        let service = ProfileService::new(&StableProfileStore, &clock);
        assert!(matches!(
            service.register(Principal::anonymous(), register("a@example.com", Role::Viewer)),
            Err(PaywallError::Unauthenticated)
        ));
        assert!(matches!(
            service.register(principal(1), register("not-an-email", Role::Viewer)),
            Err(PaywallError::InvalidInput(_))
        ));
        service
            .register(principal(1), register("a@example.com", Role::Viewer))
            .unwrap();
        assert!(matches!(
            service.register(principal(1), register("b@example.com", Role::Creator)),
            Err(PaywallError::Conflict(_))
        ));
        assert!(matches!(
            service.get_profile(principal(3)),
            Err(PaywallError::NotFound(_))
        ));
    }

    #[test]
    fn payout_details_belong_to_creators() {
        let clock = FixedClock::new(5);
        let service = ProfileService::new(&StableProfileStore, &clock);
        service
            .register(principal(1), register("maker@example.com", Role::Creator))
            .unwrap();
        service
            .register(principal(2), register("fan@example.com", Role::Viewer))
            .unwrap();

        let details = UpdateCreatorProfileRequest {
            paypal_email: Some("payouts@example.com".to_string()),
            crypto_address: Some("0x1234".to_string()),
            billing_info: None,
        };
        assert!(matches!(
            service.update_creator_profile(principal(2), details.clone()),
            Err(PaywallError::NotFound(_))
        ));

        clock.advance(10);
        let updated = service.update_creator_profile(principal(1), details).unwrap();
        assert_eq!(updated.crypto_address.as_deref(), Some("0x1234"));
        assert_eq!(updated.updated_at, 15);

        let address_only = UpdateCreatorProfileRequest {
            crypto_address: Some("0x5678".to_string()),
            ..UpdateCreatorProfileRequest::default()
        };
        let updated = service.update_creator_profile(principal(1), address_only).unwrap();
        assert_eq!(updated.paypal_email.as_deref(), Some("payouts@example.com"));
        assert_eq!(updated.crypto_address.as_deref(), Some("0x5678"));
        assert_eq!(updated.billing_info, None);
        assert_eq!(
            service.get_profile(principal(1)).unwrap().creator_profile,
            Some(updated)
        );

        assert!(service.require_role(principal(1), Role::Creator).is_ok());
        assert!(matches!(
            service.require_role(principal(2), Role::Creator),
            Err(PaywallError::Forbidden(_))
        ));
        assert!(matches!(
            service.require_role(principal(9), Role::Viewer),
            Err(PaywallError::Forbidden(_))
        ));
    }
}
