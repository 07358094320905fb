//! Domain Layer
//!
//! Contains entities, value objects, the authorization registry,
//! repository traits and external service ports.

pub mod entity;
pub mod gateway;
pub mod registry;
pub mod repository;
pub mod value_object;

// Re-exports
pub use entity::{
    account::Account, network_boundary::NetworkBoundary, resource::Resource,
    subscription_target::SubscriptionTarget,
};
pub use gateway::CloudPlatform;
pub use registry::{AuthorizationRegistry, RegistryState};
pub use repository::DescriptorStore;
