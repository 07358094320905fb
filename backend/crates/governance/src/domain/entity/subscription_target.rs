//! Subscription Target Entity
//!
//! Binds a consumer principal to asset types under a domain. A target is
//! only a request: it stays `Pending` until the owning resource's access
//! policy also admits the consumer account.

use chrono::{DateTime, Utc};
use kernel::id::SubscriptionTargetId;
use serde::Serialize;

use crate::domain::entity::resource::Resource;
use crate::domain::value_object::{AccountId, AssetType, DomainId, EnvironmentId, Principal};

/// Target type understood by the governance service
pub const BASE_SUBSCRIPTION_TARGET_TYPE: &str = "BaseSubscriptionTargetType";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Pending,
    Active,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionTarget {
    pub target_id: SubscriptionTargetId,
    pub name: String,
    pub domain_id: DomainId,
    pub environment_id: EnvironmentId,
    pub principal: Principal,
    pub asset_types: Vec<AssetType>,
    /// Account owning the subscribed resources
    pub producer_account: AccountId,
    pub manage_access_role: Principal,
    /// Identifier issued by the governance service
    pub physical_id: Option<String>,
    pub status: SubscriptionStatus,
    pub created_at: DateTime<Utc>,
}

impl SubscriptionTarget {
    pub fn new(
        name: impl Into<String>,
        domain_id: DomainId,
        environment_id: EnvironmentId,
        principal: Principal,
        asset_types: Vec<AssetType>,
        producer_account: AccountId,
        manage_access_role: Principal,
    ) -> Self {
        Self {
            target_id: SubscriptionTargetId::new(),
            name: name.into(),
            domain_id,
            environment_id,
            principal,
            asset_types,
            producer_account,
            manage_access_role,
            physical_id: None,
            status: SubscriptionStatus::Pending,
            created_at: Utc::now(),
        }
    }

    pub fn consumer_account(&self) -> &AccountId {
        self.principal.account()
    }

    pub fn is_active(&self) -> bool {
        self.status == SubscriptionStatus::Active
    }

    pub fn references_account(&self, account: &AccountId) -> bool {
        &self.producer_account == account || self.consumer_account() == account
    }

    /// Re-evaluate the status against the current policy of `resource`
    ///
    /// Resources of other owners never activate the target. Revoked access
    /// moves an active target back to pending.
    pub fn converge(&mut self, resource: &Resource) -> SubscriptionStatus {
        if resource.owner != self.producer_account {
            return self.status;
        }
        self.status = if resource.access_policy().allows_consumer(self.consumer_account()) {
            SubscriptionStatus::Active
        } else {
            SubscriptionStatus::Pending
        };
        self.status
    }
}
