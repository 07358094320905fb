//! Simulated Cloud Platform
//!
//! In-memory implementation of every service port. Identifiers are shaped
//! like the real ones, each call is journaled, and a single operation can be
//! made to fail to exercise the fail-fast paths.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::Serialize;
use tokio::sync::{Mutex, MutexGuard};

use crate::domain::gateway::{
    ClusterHandle, ClusterService, ClusterSpec, GovernanceService, IdentityService,
    NetworkService, SchemaRegistryService, SubscriptionTargetRequest, TopicSpec,
};
use crate::domain::value_object::{AccountId, AssetType, DomainId, Port, Principal, ResourceName};
use crate::error::{GovernanceError, GovernanceResult};

/// One recorded port call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JournalEntry {
    pub operation: &'static str,
    pub target: String,
}

#[derive(Debug)]
struct SimTopic {
    arn: String,
    producers: BTreeSet<Principal>,
    consumers: BTreeSet<AccountId>,
}

#[derive(Debug)]
struct SimCluster {
    name: String,
    owner: AccountId,
    broker_security_group: String,
    topics: BTreeMap<String, SimTopic>,
}

#[derive(Debug)]
struct SimSecurityGroup {
    ingress: BTreeSet<(String, u16)>,
    egress: BTreeSet<(String, u16)>,
}

#[derive(Debug, Default)]
struct State {
    journal: Vec<JournalEntry>,
    asset_types: BTreeSet<(DomainId, AssetType)>,
    registered: BTreeSet<(DomainId, AccountId)>,
    authorized: BTreeSet<(DomainId, AccountId)>,
    subscription_targets: HashMap<String, SubscriptionTargetRequest>,
    clusters: HashMap<String, SimCluster>,
    registries: BTreeSet<String>,
    roles: HashMap<String, String>,
    security_groups: HashMap<String, SimSecurityGroup>,
}

pub struct SimulatedCloud {
    region: String,
    failing_on: Option<&'static str>,
    state: Mutex<State>,
}

fn short_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()[..8].to_string()
}

fn missing(service: &'static str, what: &str, id: &str) -> GovernanceError {
    GovernanceError::service(service, format!("{what} {id} does not exist"))
}

impl SimulatedCloud {
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            failing_on: None,
            state: Mutex::new(State::default()),
        }
    }

    /// Make every call of `operation` fail with a service error
    pub fn failing_on(mut self, operation: &'static str) -> Self {
        self.failing_on = Some(operation);
        self
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub async fn journal(&self) -> Vec<JournalEntry> {
        self.state.lock().await.journal.clone()
    }

    /// Operation names in call order
    pub async fn operations(&self) -> Vec<&'static str> {
        self.state
            .lock()
            .await
            .journal
            .iter()
            .map(|e| e.operation)
            .collect()
    }

    pub async fn ingress_rules(&self, security_group: &str) -> Vec<(String, u16)> {
        let state = self.state.lock().await;
        state
            .security_groups
            .get(security_group)
            .map(|sg| sg.ingress.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub async fn egress_rules(&self, security_group: &str) -> Vec<(String, u16)> {
        let state = self.state.lock().await;
        state
            .security_groups
            .get(security_group)
            .map(|sg| sg.egress.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub async fn topic_consumers(&self, cluster_arn: &str, topic: &str) -> Vec<AccountId> {
        let state = self.state.lock().await;
        state
            .clusters
            .get(cluster_arn)
            .and_then(|c| c.topics.get(topic))
            .map(|t| t.consumers.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub async fn is_authorized(&self, domain_id: &DomainId, account_id: &AccountId) -> bool {
        let state = self.state.lock().await;
        state
            .authorized
            .contains(&(domain_id.clone(), account_id.clone()))
    }

    /// Physical resources still alive
    pub async fn live_resources(&self) -> usize {
        let state = self.state.lock().await;
        state.asset_types.len()
            + state.subscription_targets.len()
            + state.clusters.len()
            + state.registries.len()
            + state.roles.len()
            + state.security_groups.len()
    }

    /// Journal the call and hand out the state, or fail if injected
    async fn call(
        &self,
        service: &'static str,
        operation: &'static str,
        target: impl Into<String>,
    ) -> GovernanceResult<MutexGuard<'_, State>> {
        let target = target.into();
        let mut state = self.state.lock().await;
        state.journal.push(JournalEntry {
            operation,
            target: target.clone(),
        });
        if self.failing_on == Some(operation) {
            return Err(GovernanceError::service(
                service,
                format!("{operation} failed for {target}"),
            ));
        }
        tracing::debug!(service, operation, target = %target, "Simulated call");
        Ok(state)
    }
}

impl GovernanceService for SimulatedCloud {
    async fn create_asset_type(
        &self,
        domain_id: &DomainId,
        asset_type: &AssetType,
    ) -> GovernanceResult<String> {
        let mut state = self
            .call("governance", "create_asset_type", asset_type.as_str())
            .await?;
        state
            .asset_types
            .insert((domain_id.clone(), asset_type.clone()));
        Ok("1".to_string())
    }

    async fn register_account(
        &self,
        domain_id: &DomainId,
        account_id: &AccountId,
    ) -> GovernanceResult<()> {
        let mut state = self
            .call("governance", "register_account", account_id.as_str())
            .await?;
        state
            .registered
            .insert((domain_id.clone(), account_id.clone()));
        Ok(())
    }

    async fn authorize_environment(
        &self,
        domain_id: &DomainId,
        account_id: &AccountId,
        central_account: &AccountId,
    ) -> GovernanceResult<()> {
        let mut state = self
            .call(
                "governance",
                "authorize_environment",
                format!("{account_id}->{central_account}"),
            )
            .await?;
        let key = (domain_id.clone(), account_id.clone());
        if !state.registered.contains(&key) {
            return Err(missing("governance", "registered account", account_id.as_str()));
        }
        state.authorized.insert(key);
        Ok(())
    }

    async fn create_subscription_target(
        &self,
        request: &SubscriptionTargetRequest,
    ) -> GovernanceResult<String> {
        let mut state = self
            .call("governance", "create_subscription_target", request.name.clone())
            .await?;
        let target_id = short_id();
        state
            .subscription_targets
            .insert(target_id.clone(), request.clone());
        Ok(target_id)
    }

    async fn delete_subscription_target(
        &self,
        _domain_id: &DomainId,
        target_id: &str,
    ) -> GovernanceResult<()> {
        let mut state = self
            .call("governance", "delete_subscription_target", target_id)
            .await?;
        state
            .subscription_targets
            .remove(target_id)
            .map(|_| ())
            .ok_or_else(|| missing("governance", "subscription target", target_id))
    }

    async fn delete_asset_type(
        &self,
        domain_id: &DomainId,
        asset_type: &AssetType,
    ) -> GovernanceResult<()> {
        let mut state = self
            .call("governance", "delete_asset_type", asset_type.as_str())
            .await?;
        if state
            .asset_types
            .remove(&(domain_id.clone(), asset_type.clone()))
        {
            Ok(())
        } else {
            Err(missing("governance", "asset type", asset_type.as_str()))
        }
    }
}

impl ClusterService for SimulatedCloud {
    async fn create_cluster(&self, spec: &ClusterSpec) -> GovernanceResult<ClusterHandle> {
        let mut state = self
            .call("cluster", "create_cluster", spec.name.as_str())
            .await?;

        let handle = ClusterHandle {
            cluster_arn: format!(
                "arn:aws:kafka:{}:{}:cluster/{}/{}",
                self.region,
                spec.owner,
                spec.name,
                uuid::Uuid::new_v4()
            ),
            network_id: format!("vpc-{}", short_id()),
            broker_security_group: format!("sg-{}", short_id()),
        };

        state.security_groups.insert(
            handle.broker_security_group.clone(),
            SimSecurityGroup {
                ingress: BTreeSet::new(),
                egress: BTreeSet::new(),
            },
        );
        state.clusters.insert(
            handle.cluster_arn.clone(),
            SimCluster {
                name: spec.name.to_string(),
                owner: spec.owner.clone(),
                broker_security_group: handle.broker_security_group.clone(),
                topics: BTreeMap::new(),
            },
        );
        Ok(handle)
    }

    async fn create_topic(&self, cluster_arn: &str, topic: &TopicSpec) -> GovernanceResult<String> {
        let mut state = self
            .call("cluster", "create_topic", topic.name.as_str())
            .await?;
        let region = &self.region;
        let cluster = state
            .clusters
            .get_mut(cluster_arn)
            .ok_or_else(|| missing("cluster", "cluster", cluster_arn))?;

        let arn = format!(
            "arn:aws:kafka:{region}:{}:topic/{}/{}/{}",
            cluster.owner,
            cluster.name,
            short_id(),
            topic.name
        );
        cluster.topics.insert(
            topic.name.to_string(),
            SimTopic {
                arn: arn.clone(),
                producers: BTreeSet::new(),
                consumers: BTreeSet::new(),
            },
        );
        Ok(arn)
    }

    async fn grant_produce(
        &self,
        cluster_arn: &str,
        topic: &ResourceName,
        principal: &Principal,
    ) -> GovernanceResult<()> {
        let mut state = self
            .call("cluster", "grant_produce", principal.arn())
            .await?;
        let sim_topic = state
            .clusters
            .get_mut(cluster_arn)
            .and_then(|c| c.topics.get_mut(topic.as_str()))
            .ok_or_else(|| missing("cluster", "topic", topic.as_str()))?;
        sim_topic.producers.insert(principal.clone());
        Ok(())
    }

    async fn grant_consume(
        &self,
        cluster_arn: &str,
        topic: &ResourceName,
        account: &AccountId,
    ) -> GovernanceResult<()> {
        let mut state = self
            .call("cluster", "grant_consume", account.as_str())
            .await?;
        let sim_topic = state
            .clusters
            .get_mut(cluster_arn)
            .and_then(|c| c.topics.get_mut(topic.as_str()))
            .ok_or_else(|| missing("cluster", "topic", topic.as_str()))?;
        sim_topic.consumers.insert(account.clone());
        Ok(())
    }

    async fn delete_cluster(&self, cluster_arn: &str) -> GovernanceResult<()> {
        let mut state = self.call("cluster", "delete_cluster", cluster_arn).await?;
        let cluster = state
            .clusters
            .remove(cluster_arn)
            .ok_or_else(|| missing("cluster", "cluster", cluster_arn))?;
        tracing::debug!(
            cluster = %cluster.name,
            topics = cluster.topics.len(),
            arns = ?cluster.topics.values().map(|t| t.arn.as_str()).collect::<Vec<_>>(),
            "Cluster removed with its topics"
        );
        state.security_groups.remove(&cluster.broker_security_group);
        Ok(())
    }
}

impl SchemaRegistryService for SimulatedCloud {
    async fn create_registry(
        &self,
        owner: &AccountId,
        name: &ResourceName,
    ) -> GovernanceResult<String> {
        let mut state = self
            .call("schema-registry", "create_registry", name.as_str())
            .await?;
        let arn = format!("arn:aws:glue:{}:{owner}:registry/{name}", self.region);
        if !state.registries.insert(arn.clone()) {
            return Err(GovernanceError::service(
                "schema-registry",
                format!("registry {name} already exists"),
            ));
        }
        Ok(arn)
    }

    async fn delete_registry(&self, registry_arn: &str) -> GovernanceResult<()> {
        let mut state = self
            .call("schema-registry", "delete_registry", registry_arn)
            .await?;
        if state.registries.remove(registry_arn) {
            Ok(())
        } else {
            Err(missing("schema-registry", "registry", registry_arn))
        }
    }
}

impl IdentityService for SimulatedCloud {
    async fn create_role(
        &self,
        account: &AccountId,
        name: &str,
        trusted_service: &str,
    ) -> GovernanceResult<Principal> {
        let principal = Principal::role(account.clone(), name)?;
        let mut state = self
            .call("identity", "create_role", principal.arn())
            .await?;
        state
            .roles
            .insert(principal.arn(), trusted_service.to_string());
        Ok(principal)
    }

    async fn delete_role(&self, role: &Principal) -> GovernanceResult<()> {
        let arn = role.arn();
        let mut state = self.call("identity", "delete_role", arn.clone()).await?;
        state
            .roles
            .remove(&arn)
            .map(|_| ())
            .ok_or_else(|| missing("identity", "role", &arn))
    }
}

impl NetworkService for SimulatedCloud {
    async fn create_security_group(
        &self,
        _owner: &AccountId,
        network_id: &str,
        name: &str,
    ) -> GovernanceResult<String> {
        let mut state = self
            .call("network", "create_security_group", format!("{network_id}/{name}"))
            .await?;
        let security_group = format!("sg-{}", short_id());
        state.security_groups.insert(
            security_group.clone(),
            SimSecurityGroup {
                ingress: BTreeSet::new(),
                egress: BTreeSet::new(),
            },
        );
        Ok(security_group)
    }

    async fn add_ingress_rule(
        &self,
        security_group: &str,
        peer_security_group: &str,
        port: Port,
    ) -> GovernanceResult<()> {
        let mut state = self
            .call("network", "add_ingress_rule", security_group)
            .await?;
        let sg = state
            .security_groups
            .get_mut(security_group)
            .ok_or_else(|| missing("network", "security group", security_group))?;
        sg.ingress.insert((peer_security_group.to_string(), port.get()));
        Ok(())
    }

    async fn add_egress_rule(
        &self,
        security_group: &str,
        peer_security_group: &str,
        port: Port,
    ) -> GovernanceResult<()> {
        let mut state = self
            .call("network", "add_egress_rule", security_group)
            .await?;
        let sg = state
            .security_groups
            .get_mut(security_group)
            .ok_or_else(|| missing("network", "security group", security_group))?;
        sg.egress.insert((peer_security_group.to_string(), port.get()));
        Ok(())
    }

    async fn delete_security_group(&self, security_group: &str) -> GovernanceResult<()> {
        let mut state = self
            .call("network", "delete_security_group", security_group)
            .await?;
        state
            .security_groups
            .remove(security_group)
            .map(|_| ())
            .ok_or_else(|| missing("network", "security group", security_group))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::resource::Resource;
    use crate::domain::value_object::AuthMode;

    fn owner() -> AccountId {
        AccountId::new("111111111111").unwrap()
    }

    async fn cluster(cloud: &SimulatedCloud) -> ClusterHandle {
        let resource = Resource::cluster(
            ResourceName::new("producer-cluster").unwrap(),
            owner(),
            20,
            AuthMode::Iam,
        )
        .unwrap();
        cloud
            .create_cluster(&ClusterSpec::from_resource(&resource).unwrap())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_identifier_shapes() {
        let cloud = SimulatedCloud::new("us-east-1");
        let handle = cluster(&cloud).await;

        assert!(handle
            .cluster_arn
            .starts_with("arn:aws:kafka:us-east-1:111111111111:cluster/producer-cluster/"));
        assert!(handle.network_id.starts_with("vpc-"));
        assert_eq!(handle.broker_security_group.len(), "sg-".len() + 8);

        let role = cloud
            .create_role(&owner(), "MsfProducerRole", "kinesisanalytics.amazonaws.com")
            .await
            .unwrap();
        assert_eq!(role.arn(), "arn:aws:iam::111111111111:role/MsfProducerRole");
    }

    #[tokio::test]
    async fn test_journal_and_failure_injection() {
        let cloud = SimulatedCloud::new("us-east-1").failing_on("create_security_group");
        let handle = cluster(&cloud).await;

        let result = cloud
            .create_security_group(&owner(), &handle.network_id, "ProducerSecurityGroup")
            .await;
        assert!(matches!(
            result,
            Err(GovernanceError::Service { service: "network", .. })
        ));
        assert_eq!(
            cloud.operations().await,
            vec!["create_cluster", "create_security_group"]
        );
    }

    #[tokio::test]
    async fn test_rules_require_existing_group() {
        let cloud = SimulatedCloud::new("us-east-1");
        let handle = cluster(&cloud).await;

        cloud
            .add_ingress_rule(&handle.broker_security_group, "sg-peer", Port::BROKER_IAM)
            .await
            .unwrap();
        assert_eq!(
            cloud.ingress_rules(&handle.broker_security_group).await,
            vec![("sg-peer".to_string(), 9098)]
        );

        assert!(cloud
            .add_egress_rule("sg-missing", "sg-peer", Port::BROKER_IAM)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_authorize_requires_registration() {
        let cloud = SimulatedCloud::new("us-east-1");
        let domain = DomainId::new("dzd_test").unwrap();
        let central = AccountId::new("333333333333").unwrap();

        assert!(cloud
            .authorize_environment(&domain, &owner(), &central)
            .await
            .is_err());

        cloud.register_account(&domain, &owner()).await.unwrap();
        cloud
            .authorize_environment(&domain, &owner(), &central)
            .await
            .unwrap();
        assert!(cloud.is_authorized(&domain, &owner()).await);
    }

    #[tokio::test]
    async fn test_delete_cluster_removes_broker_group() {
        let cloud = SimulatedCloud::new("us-east-1");
        let handle = cluster(&cloud).await;
        assert_eq!(cloud.live_resources().await, 2);

        cloud.delete_cluster(&handle.cluster_arn).await.unwrap();
        assert_eq!(cloud.live_resources().await, 0);
        assert!(cloud.delete_cluster(&handle.cluster_arn).await.is_err());
    }
}
