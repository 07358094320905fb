//! Entity Module

pub mod account;
pub mod network_boundary;
pub mod resource;
pub mod subscription_target;

pub use account::Account;
pub use network_boundary::{NetworkBoundary, RuleDirection, SecurityRule, permits_flow};
pub use resource::{AccessPolicy, Resource, ResourceKind};
pub use subscription_target::{SubscriptionStatus, SubscriptionTarget};
