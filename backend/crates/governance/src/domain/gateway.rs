//! External Service Ports
//!
//! Stable interfaces to the cloud services the provisioning core drives.
//! Every call is awaited in sequence by the application layer; timeouts and
//! retries belong to the adapters.

use serde::Serialize;

use crate::domain::entity::resource::{Resource, ResourceKind};
use crate::domain::entity::subscription_target::SubscriptionTarget;
use crate::domain::entity::subscription_target::BASE_SUBSCRIPTION_TARGET_TYPE;
use crate::domain::value_object::{
    AccountId, AssetType, AuthMode, DomainId, EnvironmentId, Port, Principal, ResourceName,
};
use crate::error::GovernanceResult;

/// Streaming engine version of provisioned clusters
pub const KAFKA_VERSION: &str = "3.7.x.kraft";

/// Provider tag attached to subscription targets
pub const SUBSCRIPTION_PROVIDER: &str = "dsf";

// ============================================================================
// Request / response types
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClusterSpec {
    pub name: ResourceName,
    pub owner: AccountId,
    /// Broker storage per node
    pub volume_gib: u32,
    pub kafka_version: String,
    pub auth_mode: AuthMode,
}

impl ClusterSpec {
    /// `None` when `resource` is not a cluster
    pub fn from_resource(resource: &Resource) -> Option<Self> {
        match resource.kind {
            ResourceKind::Cluster { volume_gib } => Some(Self {
                name: resource.name.clone(),
                owner: resource.owner.clone(),
                volume_gib,
                kafka_version: KAFKA_VERSION.to_string(),
                auth_mode: resource.auth_mode,
            }),
            _ => None,
        }
    }
}

/// What the cluster service reports back after creating a cluster
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClusterHandle {
    pub cluster_arn: String,
    pub network_id: String,
    pub broker_security_group: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopicSpec {
    pub name: ResourceName,
    pub partitions: u32,
    pub auth_mode: AuthMode,
}

impl TopicSpec {
    /// `None` when `resource` is not a topic
    pub fn from_resource(resource: &Resource) -> Option<Self> {
        resource.partitions().map(|partitions| Self {
            name: resource.name.clone(),
            partitions,
            auth_mode: resource.auth_mode,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubscriptionTargetRequest {
    pub name: String,
    pub domain_id: DomainId,
    pub environment_id: EnvironmentId,
    pub asset_types: Vec<AssetType>,
    pub authorized_principals: Vec<Principal>,
    pub manage_access_role: Principal,
    pub provider: String,
    pub target_type: String,
}

impl From<&SubscriptionTarget> for SubscriptionTargetRequest {
    fn from(target: &SubscriptionTarget) -> Self {
        Self {
            name: target.name.clone(),
            domain_id: target.domain_id.clone(),
            environment_id: target.environment_id.clone(),
            asset_types: target.asset_types.clone(),
            authorized_principals: vec![target.principal.clone()],
            manage_access_role: target.manage_access_role.clone(),
            provider: SUBSCRIPTION_PROVIDER.to_string(),
            target_type: BASE_SUBSCRIPTION_TARGET_TYPE.to_string(),
        }
    }
}

// ============================================================================
// Ports
// ============================================================================

/// Data governance service (domain, asset types, subscription targets)
#[trait_variant::make(GovernanceService: Send)]
pub trait LocalGovernanceService {
    /// Returns the revision of the created asset type
    async fn create_asset_type(
        &self,
        domain_id: &DomainId,
        asset_type: &AssetType,
    ) -> GovernanceResult<String>;

    async fn register_account(
        &self,
        domain_id: &DomainId,
        account_id: &AccountId,
    ) -> GovernanceResult<()>;

    async fn authorize_environment(
        &self,
        domain_id: &DomainId,
        account_id: &AccountId,
        central_account: &AccountId,
    ) -> GovernanceResult<()>;

    /// Returns the service-issued target id
    async fn create_subscription_target(
        &self,
        request: &SubscriptionTargetRequest,
    ) -> GovernanceResult<String>;

    async fn delete_subscription_target(
        &self,
        domain_id: &DomainId,
        target_id: &str,
    ) -> GovernanceResult<()>;

    async fn delete_asset_type(
        &self,
        domain_id: &DomainId,
        asset_type: &AssetType,
    ) -> GovernanceResult<()>;
}

/// Managed streaming cluster service
#[trait_variant::make(ClusterService: Send)]
pub trait LocalClusterService {
    async fn create_cluster(&self, spec: &ClusterSpec) -> GovernanceResult<ClusterHandle>;

    /// Returns the topic ARN
    async fn create_topic(&self, cluster_arn: &str, topic: &TopicSpec) -> GovernanceResult<String>;

    async fn grant_produce(
        &self,
        cluster_arn: &str,
        topic: &ResourceName,
        principal: &Principal,
    ) -> GovernanceResult<()>;

    async fn grant_consume(
        &self,
        cluster_arn: &str,
        topic: &ResourceName,
        account: &AccountId,
    ) -> GovernanceResult<()>;

    /// Deletes the cluster together with its topics
    async fn delete_cluster(&self, cluster_arn: &str) -> GovernanceResult<()>;
}

/// Schema registry service
#[trait_variant::make(SchemaRegistryService: Send)]
pub trait LocalSchemaRegistryService {
    /// Returns the registry ARN
    async fn create_registry(
        &self,
        owner: &AccountId,
        name: &ResourceName,
    ) -> GovernanceResult<String>;

    async fn delete_registry(&self, registry_arn: &str) -> GovernanceResult<()>;
}

/// Identity service (execution roles)
#[trait_variant::make(IdentityService: Send)]
pub trait LocalIdentityService {
    /// Create a role assumable by `trusted_service`
    async fn create_role(
        &self,
        account: &AccountId,
        name: &str,
        trusted_service: &str,
    ) -> GovernanceResult<Principal>;

    async fn delete_role(&self, role: &Principal) -> GovernanceResult<()>;
}

/// Network service (security groups and their rules)
#[trait_variant::make(NetworkService: Send)]
pub trait LocalNetworkService {
    /// Returns the security group id
    async fn create_security_group(
        &self,
        owner: &AccountId,
        network_id: &str,
        name: &str,
    ) -> GovernanceResult<String>;

    async fn add_ingress_rule(
        &self,
        security_group: &str,
        peer_security_group: &str,
        port: Port,
    ) -> GovernanceResult<()>;

    async fn add_egress_rule(
        &self,
        security_group: &str,
        peer_security_group: &str,
        port: Port,
    ) -> GovernanceResult<()>;

    async fn delete_security_group(&self, security_group: &str) -> GovernanceResult<()>;
}

/// Everything the orchestrator needs from the outside world
pub trait CloudPlatform:
    GovernanceService
    + ClusterService
    + SchemaRegistryService
    + IdentityService
    + NetworkService
    + Send
    + Sync
{
}

impl<T> CloudPlatform for T where
    T: GovernanceService
        + ClusterService
        + SchemaRegistryService
        + IdentityService
        + NetworkService
        + Send
        + Sync
{
}
