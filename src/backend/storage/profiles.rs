// src/backend/storage/profiles.rs
use crate::error::PaywallError;
use crate::models::{CreatorProfile, UserId, UserProfile};
use crate::storage::memory::{get_creator_profiles_memory, get_users_memory, Memory};
use crate::storage::storable::Cbor;
use crate::storage::traits::ProfileStore;
use ic_stable_structures::StableBTreeMap;
use std::cell::RefCell;

type PrincipalKey = Cbor<UserId>;

thread_local! {
    static USERS: RefCell<StableBTreeMap<PrincipalKey, Cbor<UserProfile>, Memory>> = RefCell::new(
        StableBTreeMap::init(get_users_memory())
    );

    static CREATOR_PROFILES: RefCell<StableBTreeMap<PrincipalKey, Cbor<CreatorProfile>, Memory>> = RefCell::new(
        StableBTreeMap::init(get_creator_profiles_memory())
    );
}

pub struct StableProfileStore;

impl ProfileStore for StableProfileStore {
    fn get_user(&self, principal: UserId) -> Option<UserProfile> {
        USERS.with(|map_ref| map_ref.borrow().get(&Cbor(principal)).map(|u| u.0))
    }

    fn insert_user(&self, user: UserProfile) -> Result<(), PaywallError> {
        USERS.with(|map_ref| {
            let mut map = map_ref.borrow_mut();
            let key = Cbor(user.principal);
            if map.contains_key(&key) {
                return Err(PaywallError::Conflict(format!(
                    "User {} is already registered",
                    user.principal
                )));
            }
            map.insert(key, Cbor(user));
            Ok(())
        })
    }

    fn get_creator_profile(&self, principal: UserId) -> Option<CreatorProfile> {
        CREATOR_PROFILES.with(|map_ref| map_ref.borrow().get(&Cbor(principal)).map(|p| p.0))
    }

    fn put_creator_profile(&self, profile: CreatorProfile) {
        CREATOR_PROFILES.with(|map_ref| {
            map_ref.borrow_mut().insert(Cbor(profile.principal), Cbor(profile));
        });
    }
}
