//! In-Memory Descriptor Store

use std::collections::{BTreeMap, HashMap};

use kernel::id::{BoundaryId, SubscriptionTargetId};
use tokio::sync::RwLock;

use crate::domain::entity::{
    account::Account, network_boundary::NetworkBoundary, resource::Resource,
    subscription_target::SubscriptionTarget,
};
use crate::domain::repository::{
    AccountRepository, BoundaryRepository, DescriptorStore, ResourceRepository,
    SubscriptionRepository,
};
use crate::domain::value_object::{AccountId, ResourceName};
use crate::error::{GovernanceError, GovernanceResult};

#[derive(Debug, Default)]
struct Inner {
    accounts: HashMap<AccountId, Account>,
    /// Keyed by owner then name, so listings come out ordered
    resources: BTreeMap<(AccountId, ResourceName), Resource>,
    boundaries: HashMap<BoundaryId, NetworkBoundary>,
    subscriptions: HashMap<SubscriptionTargetId, SubscriptionTarget>,
}

/// Descriptor store kept in process memory
#[derive(Debug, Default)]
pub struct InMemoryDescriptorStore {
    inner: RwLock<Inner>,
}

impl InMemoryDescriptorStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored descriptors of every kind
    pub async fn len(&self) -> usize {
        let inner = self.inner.read().await;
        inner.accounts.len()
            + inner.resources.len()
            + inner.boundaries.len()
            + inner.subscriptions.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

fn key(resource: &Resource) -> (AccountId, ResourceName) {
    (resource.owner.clone(), resource.name.clone())
}

// ============================================================================
// Account Repository Implementation
// ============================================================================

impl AccountRepository for InMemoryDescriptorStore {
    async fn put_account(&self, account: &Account) -> GovernanceResult<()> {
        self.inner
            .write()
            .await
            .accounts
            .insert(account.account_id.clone(), account.clone());
        Ok(())
    }

    async fn find_account(&self, account_id: &AccountId) -> GovernanceResult<Option<Account>> {
        Ok(self.inner.read().await.accounts.get(account_id).cloned())
    }
}

// ============================================================================
// Resource Repository Implementation
// ============================================================================

impl ResourceRepository for InMemoryDescriptorStore {
    async fn create_resource(&self, resource: &Resource) -> GovernanceResult<()> {
        let mut inner = self.inner.write().await;
        let key = key(resource);
        if inner.resources.contains_key(&key) {
            return Err(GovernanceError::DuplicateResource {
                owner: resource.owner.to_string(),
                name: resource.name.to_string(),
            });
        }
        inner.resources.insert(key, resource.clone());
        Ok(())
    }

    async fn update_resource(&self, resource: &Resource) -> GovernanceResult<()> {
        let mut inner = self.inner.write().await;
        let stored = inner
            .resources
            .get_mut(&key(resource))
            .ok_or_else(|| GovernanceError::not_found("resource", &resource.name))?;
        *stored = resource.clone();
        Ok(())
    }

    async fn find_resource(
        &self,
        owner: &AccountId,
        name: &ResourceName,
    ) -> GovernanceResult<Option<Resource>> {
        let inner = self.inner.read().await;
        Ok(inner.resources.get(&(owner.clone(), name.clone())).cloned())
    }

    async fn list_resources(&self, owner: &AccountId) -> GovernanceResult<Vec<Resource>> {
        let inner = self.inner.read().await;
        Ok(inner
            .resources
            .iter()
            .filter(|((o, _), _)| o == owner)
            .map(|(_, r)| r.clone())
            .collect())
    }
}

// ============================================================================
// Boundary Repository Implementation
// ============================================================================

impl BoundaryRepository for InMemoryDescriptorStore {
    async fn put_boundary(&self, boundary: &NetworkBoundary) -> GovernanceResult<()> {
        self.inner
            .write()
            .await
            .boundaries
            .insert(boundary.boundary_id, boundary.clone());
        Ok(())
    }

    async fn find_boundary(
        &self,
        boundary_id: &BoundaryId,
    ) -> GovernanceResult<Option<NetworkBoundary>> {
        Ok(self.inner.read().await.boundaries.get(boundary_id).cloned())
    }
}

// ============================================================================
// Subscription Repository Implementation
// ============================================================================

impl SubscriptionRepository for InMemoryDescriptorStore {
    async fn put_subscription(&self, target: &SubscriptionTarget) -> GovernanceResult<()> {
        self.inner
            .write()
            .await
            .subscriptions
            .insert(target.target_id, target.clone());
        Ok(())
    }

    async fn find_subscription(
        &self,
        target_id: &SubscriptionTargetId,
    ) -> GovernanceResult<Option<SubscriptionTarget>> {
        Ok(self.inner.read().await.subscriptions.get(target_id).cloned())
    }
}

impl DescriptorStore for InMemoryDescriptorStore {
    async fn delete_owned_by(&self, account: &AccountId) -> GovernanceResult<usize> {
        let mut inner = self.inner.write().await;
        let before = inner.resources.len() + inner.boundaries.len() + inner.subscriptions.len();

        inner.resources.retain(|(owner, _), _| owner != account);
        inner.boundaries.retain(|_, b| &b.owner != account);
        inner
            .subscriptions
            .retain(|_, s| s.consumer_account() != account);

        let after = inner.resources.len() + inner.boundaries.len() + inner.subscriptions.len();
        tracing::debug!(account_id = %account, removed = before - after, "Descriptors removed");
        Ok(before - after)
    }
}
