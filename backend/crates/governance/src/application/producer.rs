//! Producer Topology Use Case
//!
//! Builds the producer side: execution role, cluster, topic with its
//! producer grant, a client boundary wired to the brokers and the schema
//! registry. The broker boundary is returned so the consumer side can peer
//! with it.

use std::sync::Arc;

use serde::Serialize;

use crate::application::config::GovernanceConfig;
use crate::application::ledger::{DeploymentLedger, PhysicalResource};
use crate::application::network::wire_client_to_broker;
use crate::domain::entity::{network_boundary::NetworkBoundary, resource::Resource};
use crate::domain::gateway::{CloudPlatform, ClusterHandle, ClusterSpec, TopicSpec};
use crate::domain::registry::AuthorizationRegistry;
use crate::domain::repository::DescriptorStore;
use crate::domain::value_object::{AccountId, AuthMode, Principal, RemovalPolicy, ResourceName};
use crate::error::{GovernanceError, GovernanceResult, ProvisionStep};

const STEP: ProvisionStep = ProvisionStep::ProducerTopology;

/// Name of the security group attached to producer clients
pub const PRODUCER_SECURITY_GROUP: &str = "ProducerSecurityGroup";

/// Producer step output, threaded into the consumer step
#[derive(Debug, Clone, Serialize)]
pub struct ProducerOutput {
    pub cluster: ClusterHandle,
    /// Boundary guarding the brokers
    pub broker_boundary: NetworkBoundary,
    pub producer_boundary: NetworkBoundary,
    pub topic: Resource,
    pub schema_registry: Resource,
    pub producer_role: Principal,
}

/// Producer topology use case
pub struct ProducerTopologyUseCase<P, S>
where
    P: CloudPlatform,
    S: DescriptorStore,
{
    platform: Arc<P>,
    store: Arc<S>,
    config: Arc<GovernanceConfig>,
}

impl<P, S> ProducerTopologyUseCase<P, S>
where
    P: CloudPlatform,
    S: DescriptorStore,
{
    pub fn new(platform: Arc<P>, store: Arc<S>, config: Arc<GovernanceConfig>) -> Self {
        Self {
            platform,
            store,
            config,
        }
    }

    pub async fn execute(
        &self,
        registry: &mut AuthorizationRegistry,
        ledger: &mut DeploymentLedger,
    ) -> GovernanceResult<ProducerOutput> {
        let config = &self.config;
        let owner = &config.producer_account;
        let streaming = &config.streaming;

        // Trust edge first: nothing is created for an unregistered account
        registry.authorize_environment(owner, &config.central_account)?;
        self.platform
            .authorize_environment(&config.domain_id, owner, &config.central_account)
            .await?;

        let producer_role = self
            .platform
            .create_role(owner, &config.producer_role.name, &config.producer_role.trusted_service)
            .await?;
        ledger.record(
            STEP,
            owner,
            PhysicalResource::Role {
                principal: producer_role.clone(),
            },
            RemovalPolicy::Destroy,
        );

        let mut cluster_resource = Resource::cluster(
            streaming.cluster_name.clone(),
            owner.clone(),
            streaming.broker_volume_gib,
            streaming.auth_mode,
        )?
        .with_removal_policy(config.removal_policy);
        let spec = ClusterSpec::from_resource(&cluster_resource)
            .ok_or_else(|| GovernanceError::not_found("cluster", &cluster_resource.name))?;
        self.store.create_resource(&cluster_resource).await?;
        let cluster = self.platform.create_cluster(&spec).await?;
        cluster_resource.physical_id = Some(cluster.cluster_arn.clone());
        self.store.update_resource(&cluster_resource).await?;
        ledger.record(
            STEP,
            owner,
            PhysicalResource::Cluster {
                cluster_arn: cluster.cluster_arn.clone(),
            },
            config.removal_policy,
        );
        tracing::info!(
            cluster_arn = %cluster.cluster_arn,
            network_id = %cluster.network_id,
            "Cluster created"
        );

        let mut broker_boundary = NetworkBoundary::new(
            cluster.network_id.clone(),
            cluster.broker_security_group.clone(),
            owner.clone(),
        );

        let mut topic = self
            .create_resource(
                owner,
                streaming.topic_name.clone(),
                streaming.topic_partitions,
                streaming.auth_mode,
            )
            .await?;
        let topic_spec = TopicSpec::from_resource(&topic)
            .ok_or_else(|| GovernanceError::not_found("topic", &topic.name))?;
        let topic_arn = self
            .platform
            .create_topic(&cluster.cluster_arn, &topic_spec)
            .await?;
        topic.physical_id = Some(topic_arn.clone());
        topic.cluster_arn = Some(cluster.cluster_arn.clone());
        ledger.record(
            STEP,
            owner,
            PhysicalResource::Topic { topic_arn },
            config.removal_policy,
        );

        self.grant_produce(&mut topic, producer_role.clone(), streaming.auth_mode)
            .await?;

        let producer_sg = self
            .platform
            .create_security_group(owner, &cluster.network_id, PRODUCER_SECURITY_GROUP)
            .await?;
        ledger.record(
            STEP,
            owner,
            PhysicalResource::SecurityGroup {
                security_group_id: producer_sg.clone(),
            },
            RemovalPolicy::Destroy,
        );
        let mut producer_boundary =
            NetworkBoundary::peered_with(&broker_boundary, producer_sg, owner.clone());
        self.open_ingress(&mut broker_boundary, &mut producer_boundary, streaming.broker_port)
            .await?;

        let mut schema_registry = Resource::schema_registry(
            streaming.schema_registry_name.clone(),
            owner.clone(),
        )
        .with_removal_policy(config.removal_policy);
        self.store.create_resource(&schema_registry).await?;
        let registry_arn = self
            .platform
            .create_registry(owner, &schema_registry.name)
            .await?;
        schema_registry.physical_id = Some(registry_arn.clone());
        self.store.update_resource(&schema_registry).await?;
        ledger.record(
            STEP,
            owner,
            PhysicalResource::SchemaRegistry { registry_arn },
            config.removal_policy,
        );

        tracing::info!(
            account_id = %owner,
            topic = %topic.name,
            broker_security_group = %broker_boundary.security_group_id,
            "Producer topology provisioned"
        );

        Ok(ProducerOutput {
            cluster,
            broker_boundary,
            producer_boundary,
            topic,
            schema_registry,
            producer_role,
        })
    }

    /// Create a topic descriptor in `owner`'s namespace
    ///
    /// The returned resource has an empty access policy.
    pub async fn create_resource(
        &self,
        owner: &AccountId,
        name: ResourceName,
        partitions: u32,
        auth_mode: AuthMode,
    ) -> GovernanceResult<Resource> {
        let resource = Resource::topic(name, owner.clone(), partitions, auth_mode)?
            .with_removal_policy(self.config.removal_policy);
        self.store.create_resource(&resource).await?;
        Ok(resource)
    }

    /// Allow `principal` to produce to `resource`
    ///
    /// The cluster is only called for a new grant, and only once the topic
    /// exists on it.
    pub async fn grant_produce(
        &self,
        resource: &mut Resource,
        principal: Principal,
        auth_mode: AuthMode,
    ) -> GovernanceResult<bool> {
        let newly = resource.grant_produce(principal.clone(), auth_mode)?;
        if newly {
            if let Some(cluster_arn) = &resource.cluster_arn {
                self.platform
                    .grant_produce(cluster_arn, &resource.name, &principal)
                    .await?;
            }
            tracing::info!(
                resource = %resource.name,
                principal = %principal,
                "Produce access granted"
            );
        }
        self.store.update_resource(resource).await?;
        Ok(newly)
    }

    /// Permit `peer -> boundary` on `port` (and the matching egress on `peer`)
    pub async fn open_ingress(
        &self,
        boundary: &mut NetworkBoundary,
        peer: &mut NetworkBoundary,
        port: u32,
    ) -> GovernanceResult<()> {
        wire_client_to_broker(self.platform.as_ref(), boundary, peer, port).await?;
        self.store.put_boundary(boundary).await?;
        self.store.put_boundary(peer).await?;
        Ok(())
    }
}
