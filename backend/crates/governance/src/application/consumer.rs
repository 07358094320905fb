//! Consumer Topology Use Case
//!
//! Builds the consumer side against the producer's published boundary:
//! execution role, a client boundary in the same network with two-sided
//! rules to the brokers, and a subscription target for the governed topic.

use std::sync::Arc;

use serde::Serialize;

use crate::application::config::GovernanceConfig;
use crate::application::ledger::{DeploymentLedger, PhysicalResource};
use crate::application::network::wire_client_to_broker;
use crate::application::producer::ProducerOutput;
use crate::domain::entity::{
    network_boundary::NetworkBoundary, resource::Resource, subscription_target::SubscriptionTarget,
};
use crate::domain::gateway::{CloudPlatform, SubscriptionTargetRequest};
use crate::domain::registry::AuthorizationRegistry;
use crate::domain::repository::DescriptorStore;
use crate::domain::value_object::{
    AccountId, AssetType, DomainId, EnvironmentId, Principal, RemovalPolicy,
};
use crate::error::{GovernanceError, GovernanceResult, ProvisionStep};

const STEP: ProvisionStep = ProvisionStep::ConsumerTopology;

/// Name of the security group attached to consumer clients
pub const CONSUMER_SECURITY_GROUP: &str = "ConsumerSecurityGroup";

/// Consumer step output
#[derive(Debug, Clone, Serialize)]
pub struct ConsumerOutput {
    pub consumer_role: Principal,
    pub consumer_boundary: NetworkBoundary,
    pub subscription: SubscriptionTarget,
}

/// Consumer topology use case
pub struct ConsumerTopologyUseCase<P, S>
where
    P: CloudPlatform,
    S: DescriptorStore,
{
    platform: Arc<P>,
    store: Arc<S>,
    config: Arc<GovernanceConfig>,
}

impl<P, S> ConsumerTopologyUseCase<P, S>
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

    /// Provision the consumer side
    ///
    /// `producer` is updated in place: the broker boundary gains the
    /// ingress rule matching the consumer's egress.
    pub async fn execute(
        &self,
        registry: &mut AuthorizationRegistry,
        ledger: &mut DeploymentLedger,
        producer: &mut ProducerOutput,
    ) -> GovernanceResult<ConsumerOutput> {
        let config = &self.config;
        let owner = &config.consumer_account;

        registry.authorize_environment(owner, &config.central_account)?;
        self.platform
            .authorize_environment(&config.domain_id, owner, &config.central_account)
            .await?;

        let consumer_role = self
            .platform
            .create_role(owner, &config.consumer_role.name, &config.consumer_role.trusted_service)
            .await?;
        ledger.record(
            STEP,
            owner,
            PhysicalResource::Role {
                principal: consumer_role.clone(),
            },
            RemovalPolicy::Destroy,
        );

        let mut consumer_boundary = self
            .create_consumer_boundary(&producer.broker_boundary, owner)
            .await?;
        ledger.record(
            STEP,
            owner,
            PhysicalResource::SecurityGroup {
                security_group_id: consumer_boundary.security_group_id.clone(),
            },
            RemovalPolicy::Destroy,
        );

        self.open_egress(
            &mut consumer_boundary,
            &mut producer.broker_boundary,
            config.streaming.broker_port,
        )
        .await?;

        let subscription = self
            .request_subscription(
                registry,
                consumer_role.clone(),
                vec![config.asset_type.clone()],
                &config.domain_id,
                &config.environment_id,
                &producer.topic,
            )
            .await?;
        if let Some(target_id) = &subscription.physical_id {
            ledger.record(
                STEP,
                owner,
                PhysicalResource::SubscriptionTarget {
                    domain_id: config.domain_id.clone(),
                    target_id: target_id.clone(),
                },
                RemovalPolicy::Destroy,
            );
        }

        tracing::info!(
            account_id = %owner,
            consumer_security_group = %consumer_boundary.security_group_id,
            subscription = %subscription.name,
            status = ?subscription.status,
            "Consumer topology provisioned"
        );

        Ok(ConsumerOutput {
            consumer_role,
            consumer_boundary,
            subscription,
        })
    }

    /// New boundary in the same network as `shared`, owned by `owner`
    pub async fn create_consumer_boundary(
        &self,
        shared: &NetworkBoundary,
        owner: &AccountId,
    ) -> GovernanceResult<NetworkBoundary> {
        let security_group = self
            .platform
            .create_security_group(owner, &shared.network_id, CONSUMER_SECURITY_GROUP)
            .await?;
        let boundary = NetworkBoundary::peered_with(shared, security_group, owner.clone());
        self.store.put_boundary(&boundary).await?;
        Ok(boundary)
    }

    /// Permit `boundary -> peer` on `port` (and the matching ingress on `peer`)
    pub async fn open_egress(
        &self,
        boundary: &mut NetworkBoundary,
        peer: &mut NetworkBoundary,
        port: u32,
    ) -> GovernanceResult<()> {
        wire_client_to_broker(self.platform.as_ref(), peer, boundary, port).await?;
        self.store.put_boundary(boundary).await?;
        self.store.put_boundary(peer).await?;
        Ok(())
    }

    /// Ask for access to `asset_types` of `domain_id` on behalf of `principal`
    ///
    /// The target starts `pending` and becomes `active` once the access
    /// policy of `resource` admits the consumer account.
    pub async fn request_subscription(
        &self,
        registry: &AuthorizationRegistry,
        principal: Principal,
        asset_types: Vec<AssetType>,
        domain_id: &DomainId,
        environment_id: &EnvironmentId,
        resource: &Resource,
    ) -> GovernanceResult<SubscriptionTarget> {
        registry.ensure_can_subscribe(&principal, &asset_types, domain_id)?;
        if !registry.is_registered(&resource.owner) {
            return Err(GovernanceError::UnauthorizedPrincipal {
                principal: resource.owner.to_string(),
            });
        }

        let mut target = SubscriptionTarget::new(
            self.config.subscription_target_name.clone(),
            domain_id.clone(),
            environment_id.clone(),
            principal,
            asset_types,
            resource.owner.clone(),
            self.config.manage_access_role.clone(),
        );
        target.converge(resource);

        let request = SubscriptionTargetRequest::from(&target);
        let target_id = self.platform.create_subscription_target(&request).await?;
        target.physical_id = Some(target_id);
        self.store.put_subscription(&target).await?;

        tracing::info!(
            domain_id = %domain_id,
            principal = %target.principal,
            target_id = %target.target_id,
            "Subscription target requested"
        );
        Ok(target)
    }
}
