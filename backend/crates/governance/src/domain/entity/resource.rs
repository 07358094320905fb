//! Resource Entity
//!
//! A resource (cluster, topic or schema registry) owned by one account,
//! with the access policy that decides who may produce to it and which
//! accounts may consume from it. Only topics are ever shared.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use kernel::id::ResourceId;
use serde::Serialize;

use crate::domain::value_object::{
    AccountId, AuthMode, Principal, RemovalPolicy, ResourceName,
};
use crate::error::{GovernanceError, GovernanceResult};

/// Kind of shareable resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResourceKind {
    Topic { partitions: u32 },
    SchemaRegistry,
    Cluster { volume_gib: u32 },
}

impl ResourceKind {
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Topic { .. } => "topic",
            Self::SchemaRegistry => "schema_registry",
            Self::Cluster { .. } => "cluster",
        }
    }
}

/// Who may produce to / consume from a resource
///
/// Both sets are ordered so that repeated grants are no-ops and listings are
/// deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AccessPolicy {
    producers: BTreeSet<Principal>,
    consumer_accounts: BTreeSet<AccountId>,
}

impl AccessPolicy {
    /// Returns `true` if the principal was not already allowed
    pub fn grant_producer(&mut self, principal: Principal) -> bool {
        self.producers.insert(principal)
    }

    /// Returns `true` if the account was not already allowed
    pub fn grant_consumer(&mut self, account: AccountId) -> bool {
        self.consumer_accounts.insert(account)
    }

    pub fn allows_producer(&self, principal: &Principal) -> bool {
        self.producers.contains(principal)
    }

    pub fn allows_consumer(&self, account: &AccountId) -> bool {
        self.consumer_accounts.contains(account)
    }

    pub fn producers(&self) -> impl Iterator<Item = &Principal> {
        self.producers.iter()
    }

    pub fn consumer_accounts(&self) -> impl Iterator<Item = &AccountId> {
        self.consumer_accounts.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.producers.is_empty() && self.consumer_accounts.is_empty()
    }
}

/// Resource descriptor
#[derive(Debug, Clone, Serialize)]
pub struct Resource {
    pub resource_id: ResourceId,
    pub name: ResourceName,
    pub kind: ResourceKind,
    pub owner: AccountId,
    pub auth_mode: AuthMode,
    pub removal_policy: RemovalPolicy,
    /// Physical identifier once the provisioning service created it
    pub physical_id: Option<String>,
    /// Physical identifier of the hosting cluster (topics only)
    pub cluster_arn: Option<String>,
    access_policy: AccessPolicy,
    pub created_at: DateTime<Utc>,
}

impl Resource {
    /// Topic descriptor with an empty access policy
    ///
    /// Fails with [`GovernanceError::Capacity`] when `partitions` is zero.
    pub fn topic(
        name: ResourceName,
        owner: AccountId,
        partitions: u32,
        auth_mode: AuthMode,
    ) -> GovernanceResult<Self> {
        if partitions < 1 {
            return Err(GovernanceError::Capacity {
                resource: name.to_string(),
                reason: format!("partition count must be at least 1, got {partitions}"),
            });
        }
        Ok(Self::new(name, ResourceKind::Topic { partitions }, owner, auth_mode))
    }

    /// Schema registry descriptor (registries are always IAM-authenticated)
    pub fn schema_registry(name: ResourceName, owner: AccountId) -> Self {
        Self::new(name, ResourceKind::SchemaRegistry, owner, AuthMode::Iam)
    }

    /// Cluster descriptor
    ///
    /// Fails with [`GovernanceError::Capacity`] for a zero-sized broker volume.
    pub fn cluster(
        name: ResourceName,
        owner: AccountId,
        volume_gib: u32,
        auth_mode: AuthMode,
    ) -> GovernanceResult<Self> {
        if volume_gib < 1 {
            return Err(GovernanceError::Capacity {
                resource: name.to_string(),
                reason: "broker volume must be at least 1 GiB".to_string(),
            });
        }
        Ok(Self::new(name, ResourceKind::Cluster { volume_gib }, owner, auth_mode))
    }

    fn new(name: ResourceName, kind: ResourceKind, owner: AccountId, auth_mode: AuthMode) -> Self {
        Self {
            resource_id: ResourceId::new(),
            name,
            kind,
            owner,
            auth_mode,
            removal_policy: RemovalPolicy::default(),
            physical_id: None,
            cluster_arn: None,
            access_policy: AccessPolicy::default(),
            created_at: Utc::now(),
        }
    }

    pub fn with_removal_policy(mut self, policy: RemovalPolicy) -> Self {
        self.removal_policy = policy;
        self
    }

    pub fn partitions(&self) -> Option<u32> {
        match self.kind {
            ResourceKind::Topic { partitions } => Some(partitions),
            ResourceKind::SchemaRegistry | ResourceKind::Cluster { .. } => None,
        }
    }

    pub fn access_policy(&self) -> &AccessPolicy {
        &self.access_policy
    }

    /// Add `principal` to the producer allow-list
    ///
    /// Idempotent: returns `false` when the principal was already allowed.
    pub fn grant_produce(&mut self, principal: Principal, auth_mode: AuthMode) -> GovernanceResult<bool> {
        if auth_mode != self.auth_mode {
            return Err(GovernanceError::AuthModeMismatch {
                resource: self.name.to_string(),
                expected: self.auth_mode,
                requested: auth_mode,
            });
        }
        Ok(self.access_policy.grant_producer(principal))
    }

    /// Add `account` to the consumer allow-list. Idempotent.
    pub fn grant_consume(&mut self, account: AccountId) -> bool {
        self.access_policy.grant_consumer(account)
    }
}
