pub mod billing;
pub mod common;
pub mod content;
pub mod profile;
pub mod purchase;
pub mod subscription;

pub use billing::{BillingEntry, BillingKind};
pub use common::*;
pub use content::{ContentFilter, ContentItem, ContentView, NewContent};
pub use profile::{CreatorProfile, ProfileView, UserProfile};
pub use purchase::{NewPurchase, Purchase, PurchaseView, PurchasedContent};
pub use subscription::{NewSubscription, Subscription};
