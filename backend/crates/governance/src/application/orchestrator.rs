//! Provisioning Orchestrator
//!
//! Runs the central, producer and consumer steps in order, threading each
//! step's output into the next. The first failure aborts the run and is
//! reported with the step that produced it.
//!
//! The orchestrator is the single owner of the authorization registry and
//! the deployment ledger; every port call is awaited in sequence.

use std::sync::Arc;

use kernel::id::DeploymentId;
use serde::Serialize;

use crate::application::central::{CentralAuthorityUseCase, CentralOutput};
use crate::application::config::GovernanceConfig;
use crate::application::consumer::{ConsumerOutput, ConsumerTopologyUseCase};
use crate::application::ledger::{DeploymentLedger, LedgerEntry, PhysicalResource};
use crate::application::producer::{ProducerOutput, ProducerTopologyUseCase};
use crate::domain::entity::network_boundary::SecurityRule;
use crate::domain::entity::subscription_target::SubscriptionStatus;
use crate::domain::gateway::CloudPlatform;
use crate::domain::registry::{AuthorizationRegistry, RegistryState};
use crate::domain::repository::DescriptorStore;
use crate::domain::value_object::{AccountId, AssetType, DomainId, EnvironmentId, Principal};
use crate::error::{GovernanceError, GovernanceResult, ProvisionError, ProvisionStep};

/// Teardown walks the steps backwards
const TEARDOWN_ORDER: [ProvisionStep; 3] = [
    ProvisionStep::ConsumerTopology,
    ProvisionStep::ProducerTopology,
    ProvisionStep::CentralAuthority,
];

/// Outcome of a full or partial run
#[derive(Debug, Clone, Serialize)]
pub struct DeploymentSummary {
    pub deployment_id: DeploymentId,
    pub domain_id: DomainId,
    pub environment_id: EnvironmentId,
    pub central_account: AccountId,
    pub producer_account: AccountId,
    pub consumer_account: AccountId,
    pub registry_state: RegistryState,
    pub topic: Option<TopicSummary>,
    pub broker_security_group: Option<String>,
    pub broker_rules: Vec<SecurityRule>,
    pub consumer_security_group: Option<String>,
    pub consumer_rules: Vec<SecurityRule>,
    pub subscription: Option<SubscriptionSummary>,
    pub ledger: Vec<LedgerEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TopicSummary {
    pub name: String,
    pub arn: Option<String>,
    pub partitions: Option<u32>,
    pub producers: Vec<Principal>,
    pub consumer_accounts: Vec<AccountId>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionSummary {
    pub name: String,
    pub target_id: Option<String>,
    pub principal: Principal,
    pub asset_types: Vec<AssetType>,
    pub producer_account: AccountId,
    pub consumer_account: AccountId,
    pub status: SubscriptionStatus,
}

/// Outcome of [`Orchestrator::teardown`]
#[derive(Debug, Clone, Default, Serialize)]
pub struct TeardownReport {
    pub deleted: Vec<String>,
    pub retained: Vec<String>,
    /// Descriptors dropped from the store
    pub descriptors_removed: usize,
}

pub struct Orchestrator<P, S>
where
    P: CloudPlatform,
    S: DescriptorStore,
{
    platform: Arc<P>,
    store: Arc<S>,
    config: Arc<GovernanceConfig>,
    central: CentralAuthorityUseCase<P, S>,
    producer: ProducerTopologyUseCase<P, S>,
    consumer: ConsumerTopologyUseCase<P, S>,
    registry: AuthorizationRegistry,
    ledger: DeploymentLedger,
    central_output: Option<CentralOutput>,
    producer_output: Option<ProducerOutput>,
    consumer_output: Option<ConsumerOutput>,
}

impl<P, S> Orchestrator<P, S>
where
    P: CloudPlatform,
    S: DescriptorStore,
{
    pub fn new(platform: Arc<P>, store: Arc<S>, config: GovernanceConfig) -> Self {
        let config = Arc::new(config);
        Self {
            central: CentralAuthorityUseCase::new(platform.clone(), store.clone(), config.clone()),
            producer: ProducerTopologyUseCase::new(platform.clone(), store.clone(), config.clone()),
            consumer: ConsumerTopologyUseCase::new(platform.clone(), store.clone(), config.clone()),
            platform,
            store,
            config,
            registry: AuthorizationRegistry::new(),
            ledger: DeploymentLedger::new(),
            central_output: None,
            producer_output: None,
            consumer_output: None,
        }
    }

    pub fn config(&self) -> &GovernanceConfig {
        &self.config
    }

    pub fn registry(&self) -> &AuthorizationRegistry {
        &self.registry
    }

    pub fn ledger(&self) -> &DeploymentLedger {
        &self.ledger
    }

    pub fn producer_output(&self) -> Option<&ProducerOutput> {
        self.producer_output.as_ref()
    }

    pub fn consumer_output(&self) -> Option<&ConsumerOutput> {
        self.consumer_output.as_ref()
    }

    /// Central, producer, consumer
    pub async fn run(&mut self) -> Result<DeploymentSummary, ProvisionError> {
        tracing::info!(
            deployment_id = %self.ledger.deployment_id(),
            domain_id = %self.config.domain_id,
            "Deployment started"
        );

        self.provision_central().await?;
        self.provision_producer().await?;
        self.provision_consumer().await?;

        let summary = self.summary();
        tracing::info!(
            deployment_id = %summary.deployment_id,
            resources = summary.ledger.len(),
            "Deployment finished"
        );
        Ok(summary)
    }

    pub async fn provision_central(&mut self) -> Result<&CentralOutput, ProvisionError> {
        let output = self
            .central
            .execute(&mut self.registry, &mut self.ledger)
            .await
            .map_err(|e| fail(ProvisionStep::CentralAuthority, e))?;
        Ok(self.central_output.insert(output))
    }

    pub async fn provision_producer(&mut self) -> Result<&ProducerOutput, ProvisionError> {
        let output = self
            .producer
            .execute(&mut self.registry, &mut self.ledger)
            .await
            .map_err(|e| fail(ProvisionStep::ProducerTopology, e))?;
        Ok(self.producer_output.insert(output))
    }

    /// Fails with `MissingProducerBoundary` until the producer step ran
    pub async fn provision_consumer(&mut self) -> Result<&ConsumerOutput, ProvisionError> {
        let step = ProvisionStep::ConsumerTopology;
        let producer = self
            .producer_output
            .as_mut()
            .ok_or_else(|| fail(step, GovernanceError::MissingProducerBoundary))?;

        let output = self
            .consumer
            .execute(&mut self.registry, &mut self.ledger, producer)
            .await
            .map_err(|e| fail(step, e))?;
        Ok(self.consumer_output.insert(output))
    }

    /// Producer grants consume on the topic to the consumer account
    ///
    /// The subscription converges to `active`.
    pub async fn grant_subscription(&mut self) -> Result<SubscriptionStatus, ProvisionError> {
        self.converge_subscription()
            .await
            .map_err(|e| fail(ProvisionStep::SubscriptionGrant, e))
    }

    async fn converge_subscription(&mut self) -> GovernanceResult<SubscriptionStatus> {
        let producer = self
            .producer_output
            .as_mut()
            .ok_or(GovernanceError::MissingProducerBoundary)?;
        let consumer = self
            .consumer_output
            .as_mut()
            .ok_or_else(|| GovernanceError::not_found("subscription target", "consumer topology"))?;

        let account = consumer.subscription.consumer_account().clone();
        if producer.topic.grant_consume(account.clone()) {
            if let Some(cluster_arn) = &producer.topic.cluster_arn {
                self.platform
                    .grant_consume(cluster_arn, &producer.topic.name, &account)
                    .await?;
            }
            self.store.update_resource(&producer.topic).await?;
            tracing::info!(
                topic = %producer.topic.name,
                account_id = %account,
                "Consume access granted"
            );
        }

        let status = consumer.subscription.converge(&producer.topic);
        self.store.put_subscription(&consumer.subscription).await?;
        tracing::info!(
            target_id = %consumer.subscription.target_id,
            status = ?status,
            "Subscription converged"
        );
        Ok(status)
    }

    /// Remove what the run created, consumer side first
    ///
    /// Resources under a `retain` policy are left in place and reported.
    pub async fn teardown(&mut self) -> Result<TeardownReport, ProvisionError> {
        self.remove_all()
            .await
            .map_err(|e| fail(ProvisionStep::Teardown, e))
    }

    async fn remove_all(&mut self) -> GovernanceResult<TeardownReport> {
        let mut report = TeardownReport::default();

        for step in TEARDOWN_ORDER {
            // An entry leaves the ledger only after its resource is handled
            while let Some(entry) = self.ledger.latest(step).cloned() {
                let label = entry.resource.label();
                if entry.removal_policy.deletes() {
                    self.delete(&entry.resource).await?;
                    tracing::info!(step = %step, resource = %label, "Resource deleted");
                    report.deleted.push(label);
                } else {
                    tracing::info!(step = %step, resource = %label, "Resource retained");
                    report.retained.push(label);
                }
                self.ledger.remove_latest(step);
            }

            match step {
                ProvisionStep::ConsumerTopology => {
                    report.descriptors_removed +=
                        self.store.delete_owned_by(&self.config.consumer_account).await?;
                    self.consumer_output = None;
                }
                ProvisionStep::ProducerTopology => {
                    report.descriptors_removed +=
                        self.store.delete_owned_by(&self.config.producer_account).await?;
                    self.producer_output = None;
                }
                _ => {
                    self.central_output = None;
                    self.registry = AuthorizationRegistry::new();
                }
            }
        }

        Ok(report)
    }

    async fn delete(&self, resource: &PhysicalResource) -> GovernanceResult<()> {
        let platform = self.platform.as_ref();
        match resource {
            PhysicalResource::AssetType {
                domain_id,
                asset_type,
            } => platform.delete_asset_type(domain_id, asset_type).await,
            PhysicalResource::SubscriptionTarget {
                domain_id,
                target_id,
            } => platform.delete_subscription_target(domain_id, target_id).await,
            PhysicalResource::Cluster { cluster_arn } => platform.delete_cluster(cluster_arn).await,
            PhysicalResource::Topic { topic_arn } => {
                tracing::debug!(topic_arn = %topic_arn, "Topic removed with its cluster");
                Ok(())
            }
            PhysicalResource::SchemaRegistry { registry_arn } => {
                platform.delete_registry(registry_arn).await
            }
            PhysicalResource::Role { principal } => platform.delete_role(principal).await,
            PhysicalResource::SecurityGroup { security_group_id } => {
                platform.delete_security_group(security_group_id).await
            }
        }
    }

    /// Snapshot of what has been provisioned so far
    pub fn summary(&self) -> DeploymentSummary {
        let config = &self.config;
        let producer = self.producer_output.as_ref();
        let consumer = self.consumer_output.as_ref();

        DeploymentSummary {
            deployment_id: self.ledger.deployment_id(),
            domain_id: config.domain_id.clone(),
            environment_id: config.environment_id.clone(),
            central_account: config.central_account.clone(),
            producer_account: config.producer_account.clone(),
            consumer_account: config.consumer_account.clone(),
            registry_state: self.registry.state(),
            topic: producer.map(|p| TopicSummary {
                name: p.topic.name.to_string(),
                arn: p.topic.physical_id.clone(),
                partitions: p.topic.partitions(),
                producers: p.topic.access_policy().producers().cloned().collect(),
                consumer_accounts: p.topic.access_policy().consumer_accounts().cloned().collect(),
            }),
            broker_security_group: producer.map(|p| p.broker_boundary.security_group_id.clone()),
            broker_rules: producer
                .map(|p| p.broker_boundary.rules().to_vec())
                .unwrap_or_default(),
            consumer_security_group: consumer
                .map(|c| c.consumer_boundary.security_group_id.clone()),
            consumer_rules: consumer
                .map(|c| c.consumer_boundary.rules().to_vec())
                .unwrap_or_default(),
            subscription: consumer.map(|c| SubscriptionSummary {
                name: c.subscription.name.clone(),
                target_id: c.subscription.physical_id.clone(),
                principal: c.subscription.principal.clone(),
                asset_types: c.subscription.asset_types.clone(),
                producer_account: c.subscription.producer_account.clone(),
                consumer_account: c.subscription.consumer_account().clone(),
                status: c.subscription.status,
            }),
            ledger: self.ledger.entries().to_vec(),
        }
    }
}

fn fail(step: ProvisionStep, source: GovernanceError) -> ProvisionError {
    source.log();
    tracing::error!(step = %step, error = %source, "Provisioning step failed");
    ProvisionError::new(step, source)
}
