//! End-to-end tests for the governance crate
//! Runs the orchestrator against the simulated cloud and in-memory store.

#[cfg(test)]
mod deployment_tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use crate::application::config::{GovernanceConfig, keys};
    use crate::domain::entity::network_boundary::{RuleDirection, permits_flow};
    use crate::domain::entity::subscription_target::SubscriptionStatus;
    use crate::domain::registry::RegistryState;
    use crate::domain::value_object::{AccountId, AssetType, Port};
    use crate::error::{GovernanceError, ProvisionStep};
    use crate::infra::memory::InMemoryDescriptorStore;
    use crate::infra::simulated_cloud::SimulatedCloud;
    use crate::application::orchestrator::Orchestrator;

    const CENTRAL: &str = "333333333333";
    const PRODUCER: &str = "111111111111";
    const CONSUMER: &str = "222222222222";
    const DOMAIN: &str = "dzd_bfo0zlhaxvdc13";

    type TestOrchestrator = Orchestrator<SimulatedCloud, InMemoryDescriptorStore>;

    struct Harness {
        orchestrator: TestOrchestrator,
        cloud: Arc<SimulatedCloud>,
        store: Arc<InMemoryDescriptorStore>,
    }

    fn settings() -> HashMap<&'static str, String> {
        HashMap::from([
            (keys::CENTRAL_ACCOUNT, CENTRAL.to_string()),
            (keys::PRODUCER_ACCOUNT, PRODUCER.to_string()),
            (keys::CONSUMER_ACCOUNT, CONSUMER.to_string()),
            (keys::DOMAIN_ID, DOMAIN.to_string()),
            (keys::ENVIRONMENT_ID, "42jxo43y9oj95z".to_string()),
            (
                keys::MANAGE_ACCESS_ROLE_ARN,
                format!("arn:aws:iam::{CENTRAL}:role/DataZoneManageAccess"),
            ),
        ])
    }

    fn harness_with(
        overrides: &[(&'static str, &str)],
        cloud: SimulatedCloud,
    ) -> Harness {
        let mut map = settings();
        for (key, value) in overrides {
            map.insert(key, value.to_string());
        }
        let config = GovernanceConfig::from_lookup(|key| map.get(key).cloned()).unwrap();

        let cloud = Arc::new(cloud);
        let store = Arc::new(InMemoryDescriptorStore::new());
        Harness {
            orchestrator: Orchestrator::new(cloud.clone(), store.clone(), config),
            cloud,
            store,
        }
    }

    fn harness() -> Harness {
        harness_with(&[], SimulatedCloud::new("us-east-1"))
    }

    fn account(raw: &str) -> AccountId {
        AccountId::new(raw).unwrap()
    }

    #[tokio::test]
    async fn test_end_to_end_scenario() {
        let mut h = harness();
        let summary = h.orchestrator.run().await.unwrap();

        assert_eq!(summary.registry_state, RegistryState::EnvironmentsAuthorized);
        assert_eq!(summary.domain_id.as_str(), DOMAIN);

        let subscription = summary.subscription.as_ref().unwrap();
        assert_eq!(subscription.producer_account, account(PRODUCER));
        assert_eq!(subscription.consumer_account, account(CONSUMER));
        assert_eq!(subscription.asset_types, vec![AssetType::msk_topic()]);
        assert_eq!(subscription.principal.account(), &account(CONSUMER));
        assert_eq!(subscription.status, SubscriptionStatus::Pending);
        assert!(subscription.target_id.is_some());

        let topic = summary.topic.as_ref().unwrap();
        assert_eq!(topic.name, "streaming-data-product");
        assert_eq!(topic.partitions, Some(1));
        assert_eq!(topic.producers.len(), 1);
        assert_eq!(topic.producers[0].account(), &account(PRODUCER));
        assert!(topic.consumer_accounts.is_empty());

        // producer clients and consumer clients both reach the brokers
        assert_eq!(summary.broker_rules.len(), 2);
        assert!(summary
            .broker_rules
            .iter()
            .all(|r| r.direction == RuleDirection::Ingress && r.port.get() == 9098));
        assert_eq!(summary.consumer_rules.len(), 1);
        assert_eq!(summary.consumer_rules[0].direction, RuleDirection::Egress);

        // 1 central + 5 producer + 3 consumer resources
        assert_eq!(summary.ledger.len(), 9);

        let domain = crate::domain::value_object::DomainId::new(DOMAIN).unwrap();
        assert!(h.cloud.is_authorized(&domain, &account(PRODUCER)).await);
        assert!(h.cloud.is_authorized(&domain, &account(CONSUMER)).await);
    }

    #[tokio::test]
    async fn test_two_sided_rules_after_run() {
        let mut h = harness();
        h.orchestrator.run().await.unwrap();

        let producer = h.orchestrator.producer_output().unwrap();
        let consumer = h.orchestrator.consumer_output().unwrap();
        let broker = &producer.broker_boundary;
        let client = &consumer.consumer_boundary;

        assert_eq!(client.network_id, broker.network_id);
        assert!(permits_flow(broker, client, Port::BROKER_IAM));
        assert!(permits_flow(broker, &producer.producer_boundary, Port::BROKER_IAM));
        assert!(!permits_flow(broker, client, Port::BROKER_TLS));

        assert!(h
            .cloud
            .ingress_rules(&broker.security_group_id)
            .await
            .contains(&(client.security_group_id.clone(), 9098)));
        assert_eq!(
            h.cloud.egress_rules(&client.security_group_id).await,
            vec![(broker.security_group_id.clone(), 9098)]
        );
    }

    #[tokio::test]
    async fn test_step_order_of_service_calls() {
        let mut h = harness();
        h.orchestrator.run().await.unwrap();

        let ops = h.cloud.operations().await;
        let position = |op: &str| ops.iter().position(|o| *o == op).unwrap();

        assert_eq!(ops[0], "create_asset_type");
        assert!(position("register_account") < position("authorize_environment"));
        assert!(position("create_cluster") < position("create_topic"));
        assert!(position("create_topic") < position("grant_produce"));
        assert!(position("create_registry") < position("create_subscription_target"));
        assert_eq!(*ops.last().unwrap(), "create_subscription_target");
    }

    #[tokio::test]
    async fn test_grant_subscription_activates_target() {
        let mut h = harness();
        h.orchestrator.run().await.unwrap();

        let status = h.orchestrator.grant_subscription().await.unwrap();
        assert_eq!(status, SubscriptionStatus::Active);

        // granting again is a no-op
        let status = h.orchestrator.grant_subscription().await.unwrap();
        assert_eq!(status, SubscriptionStatus::Active);
        let grants = h
            .cloud
            .operations()
            .await
            .into_iter()
            .filter(|op| *op == "grant_consume")
            .count();
        assert_eq!(grants, 1);

        let producer = h.orchestrator.producer_output().unwrap();
        let cluster_arn = producer.cluster.cluster_arn.clone();
        assert_eq!(
            h.cloud
                .topic_consumers(&cluster_arn, "streaming-data-product")
                .await,
            vec![account(CONSUMER)]
        );

        let summary = h.orchestrator.summary();
        assert_eq!(summary.subscription.unwrap().status, SubscriptionStatus::Active);
        assert_eq!(summary.topic.unwrap().consumer_accounts, vec![account(CONSUMER)]);
    }

    #[tokio::test]
    async fn test_consumer_before_producer_fails() {
        let mut h = harness();
        h.orchestrator.provision_central().await.unwrap();

        let err = h.orchestrator.provision_consumer().await.unwrap_err();
        assert_eq!(err.step, ProvisionStep::ConsumerTopology);
        assert!(matches!(err.source, GovernanceError::MissingProducerBoundary));

        // nothing beyond the central step reached the cloud
        assert!(!h
            .cloud
            .operations()
            .await
            .iter()
            .any(|op| *op == "create_role" || *op == "create_security_group"));
    }

    #[tokio::test]
    async fn test_consumer_first_is_deterministic() {
        for _ in 0..3 {
            let mut h = harness();
            let err = h.orchestrator.provision_consumer().await.unwrap_err();
            assert_eq!(err.step, ProvisionStep::ConsumerTopology);
            assert!(err.to_string().starts_with("step `consumer-topology` failed"));
            assert!(h.cloud.operations().await.is_empty());
        }
    }

    #[tokio::test]
    async fn test_producer_before_central_fails() {
        let mut h = harness();
        let err = h.orchestrator.provision_producer().await.unwrap_err();
        assert_eq!(err.step, ProvisionStep::ProducerTopology);
        assert!(matches!(err.source, GovernanceError::UnauthorizedDomain { .. }));
        assert!(h.cloud.operations().await.is_empty());
    }

    #[tokio::test]
    async fn test_zero_partitions_aborts_producer_step() {
        let mut h = harness_with(
            &[(keys::TOPIC_PARTITIONS, "0")],
            SimulatedCloud::new("us-east-1"),
        );
        let err = h.orchestrator.run().await.unwrap_err();

        assert_eq!(err.step, ProvisionStep::ProducerTopology);
        assert!(matches!(err.source, GovernanceError::Capacity { .. }));
        let ops = h.cloud.operations().await;
        assert!(!ops.contains(&"create_topic"));
        assert!(!ops.contains(&"create_subscription_target"));
        assert!(h.orchestrator.consumer_output().is_none());
    }

    #[tokio::test]
    async fn test_zero_volume_aborts_producer_step() {
        let mut h = harness_with(
            &[(keys::BROKER_VOLUME_GIB, "0")],
            SimulatedCloud::new("us-east-1"),
        );
        let err = h.orchestrator.run().await.unwrap_err();
        assert_eq!(err.step, ProvisionStep::ProducerTopology);
        assert!(matches!(err.source, GovernanceError::Capacity { .. }));
        assert!(!h.cloud.operations().await.contains(&"create_cluster"));
    }

    #[tokio::test]
    async fn test_invalid_port_aborts_producer_step() {
        for port in ["0", "65536"] {
            let mut h = harness_with(&[(keys::BROKER_PORT, port)], SimulatedCloud::new("us-east-1"));
            let err = h.orchestrator.run().await.unwrap_err();
            assert_eq!(err.step, ProvisionStep::ProducerTopology);
            assert!(matches!(err.source, GovernanceError::InvalidPort(_)), "{port}");
            assert!(!h.cloud.operations().await.contains(&"add_ingress_rule"));
        }
    }

    #[tokio::test]
    async fn test_service_failure_names_step() {
        let mut h = harness_with(&[], SimulatedCloud::new("us-east-1").failing_on("create_subscription_target"));
        let err = h.orchestrator.run().await.unwrap_err();

        assert_eq!(err.step, ProvisionStep::ConsumerTopology);
        assert!(matches!(
            err.source,
            GovernanceError::Service { service: "governance", .. }
        ));
        assert_eq!(err.kind(), kernel::error::kind::ErrorKind::ServiceUnavailable);
    }

    #[tokio::test]
    async fn test_central_step_is_idempotent() {
        let mut h = harness();
        let first = h.orchestrator.provision_central().await.unwrap().registered.clone();
        let second = h.orchestrator.provision_central().await.unwrap().registered.clone();

        assert_eq!(first, vec![account(PRODUCER), account(CONSUMER)]);
        assert!(second.is_empty());

        let ops = h.cloud.operations().await;
        assert_eq!(ops.iter().filter(|op| **op == "register_account").count(), 2);
        assert_eq!(ops.iter().filter(|op| **op == "create_asset_type").count(), 1);
    }

    #[tokio::test]
    async fn test_teardown_reverses_and_destroys() {
        let mut h = harness();
        h.orchestrator.run().await.unwrap();
        h.orchestrator.grant_subscription().await.unwrap();
        let created = h.cloud.operations().await.len();

        let report = h.orchestrator.teardown().await.unwrap();
        assert_eq!(report.deleted.len(), 9);
        assert!(report.retained.is_empty());
        assert_eq!(report.descriptors_removed, 7);

        let ops = h.cloud.operations().await;
        assert_eq!(
            ops[created..].to_vec(),
            vec![
                "delete_subscription_target",
                "delete_security_group",
                "delete_role",
                "delete_registry",
                "delete_security_group",
                "delete_cluster",
                "delete_role",
                "delete_asset_type",
            ]
        );

        assert_eq!(h.cloud.live_resources().await, 0);
        // registrations are kept in the store
        assert_eq!(h.store.len().await, 2);
        assert!(h.orchestrator.ledger().is_empty());
        assert_eq!(h.orchestrator.registry().state(), RegistryState::Unconfigured);
        assert!(h.orchestrator.producer_output().is_none());
    }

    #[tokio::test]
    async fn test_teardown_retains_stateful_resources() {
        let mut h = harness_with(
            &[(keys::REMOVAL_POLICY, "retain")],
            SimulatedCloud::new("us-east-1"),
        );
        h.orchestrator.run().await.unwrap();

        let report = h.orchestrator.teardown().await.unwrap();
        assert_eq!(report.retained.len(), 4);
        assert_eq!(report.deleted.len(), 5);
        assert!(report
            .retained
            .iter()
            .any(|label| label.starts_with("arn:aws:glue:us-east-1:111111111111:registry/")));

        // asset type, cluster with its broker group, registry
        assert_eq!(h.cloud.live_resources().await, 4);
    }

    #[tokio::test]
    async fn test_failed_teardown_keeps_remaining_entries() {
        let mut h = harness_with(
            &[],
            SimulatedCloud::new("us-east-1").failing_on("delete_subscription_target"),
        );
        h.orchestrator.run().await.unwrap();
        let live = h.cloud.live_resources().await;

        let err = h.orchestrator.teardown().await.unwrap_err();
        assert_eq!(err.step, ProvisionStep::Teardown);
        assert!(matches!(
            err.source,
            GovernanceError::Service { service: "governance", .. }
        ));

        // nothing was deleted and every resource is still tracked
        assert_eq!(h.cloud.live_resources().await, live);
        assert_eq!(h.orchestrator.ledger().len(), 9);
        let consumer_entries = h
            .orchestrator
            .ledger()
            .entries()
            .iter()
            .filter(|e| e.step == ProvisionStep::ConsumerTopology)
            .count();
        assert_eq!(consumer_entries, 3);
        assert!(h.orchestrator.consumer_output().is_some());
    }

    #[tokio::test]
    async fn test_mtls_opens_tls_listener_port() {
        let mut h = harness_with(
            &[(keys::CLIENT_AUTH_MODE, "mtls")],
            SimulatedCloud::new("us-east-1"),
        );
        let summary = h.orchestrator.run().await.unwrap();

        assert!(summary.broker_rules.iter().all(|r| r.port == Port::BROKER_TLS));
        assert_eq!(summary.consumer_rules[0].port, Port::BROKER_TLS);

        let broker = summary.broker_security_group.unwrap();
        let client = summary.consumer_security_group.unwrap();
        assert_eq!(h.cloud.egress_rules(&client).await, vec![(broker, 9094)]);
    }

    #[tokio::test]
    async fn test_summary_serializes() {
        let mut h = harness();
        let summary = h.orchestrator.run().await.unwrap();

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["registry_state"], "environments_authorized");
        assert_eq!(json["subscription"]["status"], "pending");
        assert_eq!(json["subscription"]["asset_types"][0], "MskTopicAssetType");
        assert_eq!(json["producer_account"], PRODUCER);
        assert_eq!(json["broker_rules"][0]["port"], 9098);
        assert_eq!(json["ledger"][0]["resource"]["kind"], "asset_type");
    }
}

#[cfg(test)]
mod use_case_tests {
    use std::sync::Arc;

    use crate::application::central::CentralAuthorityUseCase;
    use crate::application::config::GovernanceConfig;
    use crate::application::consumer::ConsumerTopologyUseCase;
    use crate::application::ledger::DeploymentLedger;
    use crate::application::producer::ProducerTopologyUseCase;
    use crate::domain::entity::network_boundary::NetworkBoundary;
    use crate::domain::registry::{AuthorizationRegistry, RegistryState};
    use crate::domain::repository::ResourceRepository;
    use crate::domain::value_object::{
        AccountId, AccountRole, AssetType, AuthMode, DomainId, EnvironmentId, Principal,
        ResourceName,
    };
    use crate::error::GovernanceError;
    use crate::infra::memory::InMemoryDescriptorStore;
    use crate::infra::simulated_cloud::SimulatedCloud;

    fn config() -> Arc<GovernanceConfig> {
        let config = GovernanceConfig::from_lookup(|key| {
            match key {
                "CENTRAL_ACCOUNT" => Some("333333333333"),
                "PRODUCER_ACCOUNT" => Some("111111111111"),
                "CONSUMER_ACCOUNT" => Some("222222222222"),
                "DOMAIN_ID" => Some("dzd_test"),
                "ENVIRONMENT_ID" => Some("env1"),
                "MANAGE_ACCESS_ROLE_ARN" => Some("arn:aws:iam::333333333333:role/manage"),
                _ => None,
            }
            .map(str::to_string)
        })
        .unwrap();
        Arc::new(config)
    }

    fn producer() -> AccountId {
        AccountId::new("111111111111").unwrap()
    }

    fn consumer() -> AccountId {
        AccountId::new("222222222222").unwrap()
    }

    #[tokio::test]
    async fn test_central_retry_after_asset_type_failure() {
        let store = Arc::new(InMemoryDescriptorStore::new());
        let mut registry = AuthorizationRegistry::new();
        let mut ledger = DeploymentLedger::new();

        let failing = Arc::new(SimulatedCloud::new("us-east-1").failing_on("create_asset_type"));
        let use_case = CentralAuthorityUseCase::new(failing, store.clone(), config());
        assert!(use_case.execute(&mut registry, &mut ledger).await.is_err());
        assert!(!registry.governs(&AssetType::msk_topic()));
        assert_eq!(registry.state(), RegistryState::DomainCreated);
        assert!(ledger.is_empty());

        let healthy = Arc::new(SimulatedCloud::new("us-east-1"));
        let use_case = CentralAuthorityUseCase::new(healthy.clone(), store, config());
        let output = use_case.execute(&mut registry, &mut ledger).await.unwrap();

        assert!(registry.governs(&AssetType::msk_topic()));
        assert_eq!(output.registered, vec![producer(), consumer()]);
        assert_eq!(ledger.len(), 1);
        assert_eq!(
            healthy.operations().await,
            vec!["create_asset_type", "register_account", "register_account"]
        );
    }

    #[tokio::test]
    async fn test_central_retry_after_registration_failure() {
        let store = Arc::new(InMemoryDescriptorStore::new());
        let mut registry = AuthorizationRegistry::new();
        let mut ledger = DeploymentLedger::new();

        let failing = Arc::new(SimulatedCloud::new("us-east-1").failing_on("register_account"));
        let use_case = CentralAuthorityUseCase::new(failing, store.clone(), config());
        assert!(use_case.execute(&mut registry, &mut ledger).await.is_err());
        assert!(!registry.is_registered(&producer()));
        assert!(store.is_empty().await);

        let healthy = Arc::new(SimulatedCloud::new("us-east-1"));
        let use_case = CentralAuthorityUseCase::new(healthy.clone(), store.clone(), config());
        let output = use_case.execute(&mut registry, &mut ledger).await.unwrap();

        assert_eq!(output.registered, vec![producer(), consumer()]);
        assert_eq!(store.len().await, 2);
        // the asset type went through on the first attempt
        assert_eq!(
            healthy.operations().await,
            vec!["register_account", "register_account"]
        );
    }

    #[tokio::test]
    async fn test_create_resource_and_grant_produce() {
        let cloud = Arc::new(SimulatedCloud::new("us-east-1"));
        let store = Arc::new(InMemoryDescriptorStore::new());
        let use_case = ProducerTopologyUseCase::new(cloud.clone(), store.clone(), config());
        let name = ResourceName::new("orders").unwrap();

        assert!(matches!(
            use_case.create_resource(&producer(), name.clone(), 0, AuthMode::Iam).await,
            Err(GovernanceError::Capacity { .. })
        ));

        let mut topic = use_case
            .create_resource(&producer(), name.clone(), 1, AuthMode::Iam)
            .await
            .unwrap();
        assert!(topic.access_policy().is_empty());
        assert!(matches!(
            use_case.create_resource(&producer(), name.clone(), 1, AuthMode::Iam).await,
            Err(GovernanceError::DuplicateResource { .. })
        ));

        let role = Principal::role(producer(), "ProducerRole").unwrap();
        assert!(use_case.grant_produce(&mut topic, role.clone(), AuthMode::Iam).await.unwrap());
        assert!(!use_case.grant_produce(&mut topic, role.clone(), AuthMode::Iam).await.unwrap());

        let stored = store.find_resource(&producer(), &name).await.unwrap().unwrap();
        let producers: Vec<_> = stored.access_policy().producers().collect();
        assert_eq!(producers, vec![&role]);

        // the topic was never created on a cluster
        assert!(!cloud.operations().await.contains(&"grant_produce"));
    }

    #[tokio::test]
    async fn test_open_ingress_and_egress() {
        let cloud = Arc::new(SimulatedCloud::new("us-east-1"));
        let store = Arc::new(InMemoryDescriptorStore::new());
        let producer_side = ProducerTopologyUseCase::new(cloud.clone(), store.clone(), config());
        let consumer_side = ConsumerTopologyUseCase::new(cloud.clone(), store.clone(), config());

        let mut broker = NetworkBoundary::new("vpc-1", "sg-broker", producer());
        let mut client = consumer_side
            .create_consumer_boundary(&broker, &consumer())
            .await
            .unwrap();

        assert!(matches!(
            producer_side.open_ingress(&mut broker, &mut client, 0).await,
            Err(GovernanceError::InvalidPort(_))
        ));
        assert!(broker.rules().is_empty());

        // the broker group is unknown to the simulated network service
        assert!(consumer_side.open_egress(&mut client, &mut broker, 9098).await.is_err());
    }

    #[tokio::test]
    async fn test_request_subscription_checks_registry() {
        let cloud = Arc::new(SimulatedCloud::new("us-east-1"));
        let store = Arc::new(InMemoryDescriptorStore::new());
        let producer_side = ProducerTopologyUseCase::new(cloud.clone(), store.clone(), config());
        let consumer_side = ConsumerTopologyUseCase::new(cloud.clone(), store.clone(), config());

        let domain = DomainId::new("dzd_test").unwrap();
        let environment = EnvironmentId::new("env1").unwrap();
        let mut registry = AuthorizationRegistry::new();
        registry
            .create_domain(domain.clone(), AccountId::new("333333333333").unwrap())
            .unwrap();
        registry.register_asset_type(AssetType::msk_topic()).unwrap();
        registry.register_account("111111111111", AccountRole::Producer).unwrap();

        let topic = producer_side
            .create_resource(&producer(), ResourceName::new("orders").unwrap(), 1, AuthMode::Iam)
            .await
            .unwrap();
        let principal = Principal::role(consumer(), "ConsumerRole").unwrap();
        let asset_types = vec![AssetType::msk_topic()];

        let unregistered = consumer_side
            .request_subscription(&registry, principal.clone(), asset_types.clone(), &domain, &environment, &topic)
            .await;
        assert!(matches!(
            unregistered,
            Err(GovernanceError::UnauthorizedPrincipal { .. })
        ));
        assert!(!cloud.operations().await.contains(&"create_subscription_target"));

        registry.register_account("222222222222", AccountRole::Consumer).unwrap();
        let target = consumer_side
            .request_subscription(&registry, principal, asset_types, &domain, &environment, &topic)
            .await
            .unwrap();
        assert!(!target.is_active());
        assert!(target.references_account(&producer()));
        assert!(target.references_account(&consumer()));
        assert!(target.physical_id.is_some());
    }
}
