pub mod content;
pub mod entitlement;
pub mod profile;
