//! Repository Traits
//!
//! Interfaces for the resource descriptor store. Implementation is in the
//! infrastructure layer.

use kernel::id::{BoundaryId, SubscriptionTargetId};

use crate::domain::entity::{
    account::Account, network_boundary::NetworkBoundary, resource::Resource,
    subscription_target::SubscriptionTarget,
};
use crate::domain::value_object::{AccountId, ResourceName};
use crate::error::GovernanceResult;

/// Account descriptor repository trait
#[trait_variant::make(AccountRepository: Send)]
pub trait LocalAccountRepository {
    /// Insert or replace an account
    async fn put_account(&self, account: &Account) -> GovernanceResult<()>;

    async fn find_account(&self, account_id: &AccountId) -> GovernanceResult<Option<Account>>;
}

/// Shareable resource repository trait
///
/// Names are unique within the owning account's namespace.
#[trait_variant::make(ResourceRepository: Send)]
pub trait LocalResourceRepository {
    /// Create a resource, failing with `DuplicateResource` on a name clash
    async fn create_resource(&self, resource: &Resource) -> GovernanceResult<()>;

    /// Replace an existing resource, failing with `NotFound` if absent
    async fn update_resource(&self, resource: &Resource) -> GovernanceResult<()>;

    async fn find_resource(
        &self,
        owner: &AccountId,
        name: &ResourceName,
    ) -> GovernanceResult<Option<Resource>>;

    /// All resources of one account, ordered by name
    async fn list_resources(&self, owner: &AccountId) -> GovernanceResult<Vec<Resource>>;
}

/// Network boundary repository trait
#[trait_variant::make(BoundaryRepository: Send)]
pub trait LocalBoundaryRepository {
    /// Insert or replace a boundary
    async fn put_boundary(&self, boundary: &NetworkBoundary) -> GovernanceResult<()>;

    async fn find_boundary(&self, boundary_id: &BoundaryId)
    -> GovernanceResult<Option<NetworkBoundary>>;
}

/// Subscription target repository trait
#[trait_variant::make(SubscriptionRepository: Send)]
pub trait LocalSubscriptionRepository {
    /// Insert or replace a subscription target
    async fn put_subscription(&self, target: &SubscriptionTarget) -> GovernanceResult<()>;

    async fn find_subscription(
        &self,
        target_id: &SubscriptionTargetId,
    ) -> GovernanceResult<Option<SubscriptionTarget>>;
}

/// Combined descriptor store
#[trait_variant::make(DescriptorStore: Send)]
pub trait LocalDescriptorStore:
    AccountRepository + ResourceRepository + BoundaryRepository + SubscriptionRepository
{
    /// Drop every descriptor owned by `account`
    ///
    /// Removes the account's resources and boundaries and the subscription
    /// targets it consumes through. Returns the number of removed
    /// descriptors.
    async fn delete_owned_by(&self, account: &AccountId) -> GovernanceResult<usize>;
}
