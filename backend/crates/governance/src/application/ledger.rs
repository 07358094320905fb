//! Deployment Ledger
//!
//! Records every physical resource a run creates, in creation order, so
//! teardown can walk it backwards step by step.

use chrono::{DateTime, Utc};
use kernel::id::DeploymentId;
use serde::Serialize;

use crate::domain::value_object::{AccountId, AssetType, DomainId, Principal, RemovalPolicy};
use crate::error::ProvisionStep;

/// A physical resource created through one of the service ports
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PhysicalResource {
    AssetType {
        domain_id: DomainId,
        asset_type: AssetType,
    },
    SubscriptionTarget {
        domain_id: DomainId,
        target_id: String,
    },
    Cluster {
        cluster_arn: String,
    },
    /// Removed together with its cluster
    Topic {
        topic_arn: String,
    },
    SchemaRegistry {
        registry_arn: String,
    },
    Role {
        principal: Principal,
    },
    SecurityGroup {
        security_group_id: String,
    },
}

impl PhysicalResource {
    pub fn label(&self) -> String {
        match self {
            Self::AssetType { asset_type, .. } => format!("asset-type/{asset_type}"),
            Self::SubscriptionTarget { target_id, .. } => format!("subscription-target/{target_id}"),
            Self::Cluster { cluster_arn } => cluster_arn.clone(),
            Self::Topic { topic_arn } => topic_arn.clone(),
            Self::SchemaRegistry { registry_arn } => registry_arn.clone(),
            Self::Role { principal } => principal.arn(),
            Self::SecurityGroup { security_group_id } => security_group_id.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LedgerEntry {
    pub step: ProvisionStep,
    pub owner: AccountId,
    pub resource: PhysicalResource,
    pub removal_policy: RemovalPolicy,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeploymentLedger {
    deployment_id: DeploymentId,
    entries: Vec<LedgerEntry>,
}

impl Default for DeploymentLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl DeploymentLedger {
    pub fn new() -> Self {
        Self {
            deployment_id: DeploymentId::new(),
            entries: Vec::new(),
        }
    }

    pub fn deployment_id(&self) -> DeploymentId {
        self.deployment_id
    }

    pub fn record(
        &mut self,
        step: ProvisionStep,
        owner: &AccountId,
        resource: PhysicalResource,
        removal_policy: RemovalPolicy,
    ) {
        tracing::debug!(
            deployment_id = %self.deployment_id,
            step = %step,
            resource = %resource.label(),
            "Resource recorded"
        );
        self.entries.push(LedgerEntry {
            step,
            owner: owner.clone(),
            resource,
            removal_policy,
            recorded_at: Utc::now(),
        });
    }

    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Newest entry recorded by `step`
    pub fn latest(&self, step: ProvisionStep) -> Option<&LedgerEntry> {
        self.entries.iter().rev().find(|e| e.step == step)
    }

    /// Drop the newest entry recorded by `step`
    ///
    /// Teardown calls this only once the resource is gone or retained, so a
    /// failed delete leaves the entry in place for the next attempt.
    pub fn remove_latest(&mut self, step: ProvisionStep) -> Option<LedgerEntry> {
        let position = self.entries.iter().rposition(|e| e.step == step)?;
        Some(self.entries.remove(position))
    }
}
