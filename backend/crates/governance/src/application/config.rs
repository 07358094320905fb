//! Application Configuration
//!
//! Configuration for one provisioning run. Everything is read from a plain
//! key/value source (the process environment in production, a map in tests)
//! and validated up front, so a bad value never reaches a cloud service.

use std::str::FromStr;

use serde::Serialize;

use crate::domain::value_object::{
    AccountId, AssetType, AuthMode, DomainId, EnvironmentId, Principal, RemovalPolicy,
    ResourceName,
};
use crate::error::{GovernanceError, GovernanceResult};

/// Role to create and the service principal allowed to assume it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleConfig {
    pub name: String,
    pub trusted_service: String,
}

/// Producer-side streaming resources
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StreamingConfig {
    pub cluster_name: ResourceName,
    /// Broker storage in GiB
    pub broker_volume_gib: u32,
    pub topic_name: ResourceName,
    pub topic_partitions: u32,
    pub auth_mode: AuthMode,
    /// Kept unvalidated; the port is checked when the rule is opened
    pub broker_port: u32,
    pub schema_registry_name: ResourceName,
}

/// Governance application configuration
#[derive(Debug, Clone, Serialize)]
pub struct GovernanceConfig {
    pub region: String,
    pub central_account: AccountId,
    pub producer_account: AccountId,
    pub consumer_account: AccountId,
    pub domain_id: DomainId,
    pub environment_id: EnvironmentId,
    /// Role the governance service assumes to manage subscription grants
    pub manage_access_role: Principal,
    pub asset_type: AssetType,
    pub subscription_target_name: String,
    pub streaming: StreamingConfig,
    pub producer_role: RoleConfig,
    pub consumer_role: RoleConfig,
    /// Applied to stateful resources (asset type, cluster, topic, registry)
    pub removal_policy: RemovalPolicy,
}

/// Configuration keys
pub mod keys {
    pub const AWS_REGION: &str = "AWS_REGION";
    pub const CENTRAL_ACCOUNT: &str = "CENTRAL_ACCOUNT";
    pub const PRODUCER_ACCOUNT: &str = "PRODUCER_ACCOUNT";
    pub const CONSUMER_ACCOUNT: &str = "CONSUMER_ACCOUNT";
    pub const DOMAIN_ID: &str = "DOMAIN_ID";
    pub const ENVIRONMENT_ID: &str = "ENVIRONMENT_ID";
    pub const MANAGE_ACCESS_ROLE_ARN: &str = "MANAGE_ACCESS_ROLE_ARN";
    pub const ASSET_TYPE: &str = "ASSET_TYPE";
    pub const SUBSCRIPTION_TARGET_NAME: &str = "SUBSCRIPTION_TARGET_NAME";
    pub const TOPIC_NAME: &str = "TOPIC_NAME";
    pub const TOPIC_PARTITIONS: &str = "TOPIC_PARTITIONS";
    pub const CLUSTER_NAME: &str = "CLUSTER_NAME";
    pub const BROKER_VOLUME_GIB: &str = "BROKER_VOLUME_GIB";
    pub const BROKER_PORT: &str = "BROKER_PORT";
    pub const CLIENT_AUTH_MODE: &str = "CLIENT_AUTH_MODE";
    pub const SCHEMA_REGISTRY_NAME: &str = "SCHEMA_REGISTRY_NAME";
    pub const PRODUCER_ROLE_NAME: &str = "PRODUCER_ROLE_NAME";
    pub const CONSUMER_ROLE_NAME: &str = "CONSUMER_ROLE_NAME";
    pub const REMOVAL_POLICY: &str = "REMOVAL_POLICY";
}

pub const DEFAULT_REGION: &str = "us-east-1";
pub const DEFAULT_TOPIC_NAME: &str = "streaming-data-product";
pub const DEFAULT_CLUSTER_NAME: &str = "producer-cluster";
pub const DEFAULT_BROKER_VOLUME_GIB: u32 = 20;
pub const DEFAULT_SCHEMA_REGISTRY_NAME: &str = "producer-registry";
pub const DEFAULT_SUBSCRIPTION_TARGET_NAME: &str = "MskTopicsTarget";
pub const DEFAULT_PRODUCER_ROLE_NAME: &str = "MsfProducerRole";
pub const DEFAULT_CONSUMER_ROLE_NAME: &str = "EmrConsumerRole";

/// Stream-processing service trusted by the producer role
pub const PRODUCER_TRUSTED_SERVICE: &str = "kinesisanalytics.amazonaws.com";
/// Batch-processing service trusted by the consumer role
pub const CONSUMER_TRUSTED_SERVICE: &str = "emr.amazonaws.com";

impl GovernanceConfig {
    /// Build from an arbitrary key/value lookup
    ///
    /// Blank values count as missing.
    pub fn from_lookup<F>(lookup: F) -> GovernanceResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let source = Source(&lookup);
        let auth_mode = source.parsed_or(
            keys::CLIENT_AUTH_MODE,
            |v| AuthMode::from_code(&v).ok_or("expected `iam` or `mtls`"),
            AuthMode::default,
        )?;

        Ok(Self {
            region: source
                .optional(keys::AWS_REGION)
                .unwrap_or_else(|| DEFAULT_REGION.to_string()),
            central_account: source.required_parsed(keys::CENTRAL_ACCOUNT, AccountId::new)?,
            producer_account: source.required_parsed(keys::PRODUCER_ACCOUNT, AccountId::new)?,
            consumer_account: source.required_parsed(keys::CONSUMER_ACCOUNT, AccountId::new)?,
            domain_id: source.required_parsed(keys::DOMAIN_ID, DomainId::new)?,
            environment_id: source.required_parsed(keys::ENVIRONMENT_ID, EnvironmentId::new)?,
            manage_access_role: source
                .required_parsed(keys::MANAGE_ACCESS_ROLE_ARN, |v| Principal::parse_arn(&v))?,
            asset_type: source.parsed_or(keys::ASSET_TYPE, AssetType::new, AssetType::msk_topic)?,
            subscription_target_name: source
                .optional(keys::SUBSCRIPTION_TARGET_NAME)
                .unwrap_or_else(|| DEFAULT_SUBSCRIPTION_TARGET_NAME.to_string()),
            streaming: StreamingConfig {
                cluster_name: source.name_or(keys::CLUSTER_NAME, DEFAULT_CLUSTER_NAME)?,
                broker_volume_gib: source.number_or(
                    keys::BROKER_VOLUME_GIB,
                    DEFAULT_BROKER_VOLUME_GIB,
                )?,
                topic_name: source.name_or(keys::TOPIC_NAME, DEFAULT_TOPIC_NAME)?,
                topic_partitions: source.number_or(keys::TOPIC_PARTITIONS, 1)?,
                auth_mode,
                // Defaults to the listener of the configured client authentication
                broker_port: source.number_or(
                    keys::BROKER_PORT,
                    u32::from(auth_mode.listener_port().get()),
                )?,
                schema_registry_name: source
                    .name_or(keys::SCHEMA_REGISTRY_NAME, DEFAULT_SCHEMA_REGISTRY_NAME)?,
            },
            producer_role: RoleConfig {
                name: source
                    .optional(keys::PRODUCER_ROLE_NAME)
                    .unwrap_or_else(|| DEFAULT_PRODUCER_ROLE_NAME.to_string()),
                trusted_service: PRODUCER_TRUSTED_SERVICE.to_string(),
            },
            consumer_role: RoleConfig {
                name: source
                    .optional(keys::CONSUMER_ROLE_NAME)
                    .unwrap_or_else(|| DEFAULT_CONSUMER_ROLE_NAME.to_string()),
                trusted_service: CONSUMER_TRUSTED_SERVICE.to_string(),
            },
            removal_policy: source.parsed_or(
                keys::REMOVAL_POLICY,
                |v| RemovalPolicy::from_code(&v).ok_or("expected `destroy` or `retain`"),
                RemovalPolicy::default,
            )?,
        })
    }

    /// Build from the process environment
    pub fn from_env() -> GovernanceResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }
}

struct Source<'a, F>(&'a F);

impl<F> Source<'_, F>
where
    F: Fn(&str) -> Option<String>,
{
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn required_parsed<T, E, P>(&self, key: &'static str, parse: P) -> GovernanceResult<T>
    where
        P: FnOnce(String) -> Result<T, E>,
        E: ToString,
    {
        let raw = self
            .optional(key)
            .ok_or_else(|| GovernanceError::InvalidConfig {
                key,
                reason: "required value is missing".to_string(),
            })?;
        parse(raw).map_err(|e| GovernanceError::InvalidConfig {
            key,
            reason: e.to_string(),
        })
    }

    fn parsed_or<T, E, P, D>(&self, key: &'static str, parse: P, default: D) -> GovernanceResult<T>
    where
        P: FnOnce(String) -> Result<T, E>,
        E: ToString,
        D: FnOnce() -> T,
    {
        match self.optional(key) {
            Some(raw) => parse(raw).map_err(|e| GovernanceError::InvalidConfig {
                key,
                reason: e.to_string(),
            }),
            None => Ok(default()),
        }
    }

    fn name_or(&self, key: &'static str, default: &str) -> GovernanceResult<ResourceName> {
        let raw = self.optional(key).unwrap_or_else(|| default.to_string());
        ResourceName::new(raw).map_err(|e| GovernanceError::InvalidConfig {
            key,
            reason: e.to_string(),
        })
    }

    fn number_or<T>(&self, key: &'static str, default: T) -> GovernanceResult<T>
    where
        T: FromStr,
        T::Err: ToString,
    {
        self.parsed_or(key, |v| v.parse::<T>(), || default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn base() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            (keys::CENTRAL_ACCOUNT, "333333333333"),
            (keys::PRODUCER_ACCOUNT, "111111111111"),
            (keys::CONSUMER_ACCOUNT, "222222222222"),
            (keys::DOMAIN_ID, "dzd_bfo0zlhaxvdc13"),
            (keys::ENVIRONMENT_ID, "42jxo43y9oj95z"),
            (
                keys::MANAGE_ACCESS_ROLE_ARN,
                "arn:aws:iam::333333333333:role/service-role/DataZoneManageAccess",
            ),
        ])
    }

    fn load(map: &HashMap<&'static str, &'static str>) -> GovernanceResult<GovernanceConfig> {
        GovernanceConfig::from_lookup(|key| map.get(key).map(|v| v.to_string()))
    }

    #[test]
    fn test_defaults() {
        let config = load(&base()).unwrap();
        assert_eq!(config.region, "us-east-1");
        assert_eq!(config.streaming.topic_name.as_str(), "streaming-data-product");
        assert_eq!(config.streaming.topic_partitions, 1);
        assert_eq!(config.streaming.broker_port, 9098);
        assert_eq!(config.streaming.cluster_name.as_str(), "producer-cluster");
        assert_eq!(config.streaming.broker_volume_gib, 20);
        assert_eq!(config.streaming.schema_registry_name.as_str(), "producer-registry");
        assert_eq!(config.streaming.auth_mode, AuthMode::Iam);
        assert_eq!(config.asset_type.as_str(), "MskTopicAssetType");
        assert_eq!(config.removal_policy, RemovalPolicy::Destroy);
        assert_eq!(config.manage_access_role.role_name(), "DataZoneManageAccess");
        assert_eq!(config.producer_role.trusted_service, PRODUCER_TRUSTED_SERVICE);
        assert_eq!(config.consumer_role.name, "EmrConsumerRole");
    }

    #[test]
    fn test_missing_required_key() {
        for key in [
            keys::CENTRAL_ACCOUNT,
            keys::PRODUCER_ACCOUNT,
            keys::CONSUMER_ACCOUNT,
            keys::DOMAIN_ID,
            keys::ENVIRONMENT_ID,
            keys::MANAGE_ACCESS_ROLE_ARN,
        ] {
            let mut map = base();
            map.remove(key);
            match load(&map) {
                Err(GovernanceError::InvalidConfig { key: reported, .. }) => {
                    assert_eq!(reported, key)
                }
                other => panic!("expected InvalidConfig for {key}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_blank_is_missing() {
        let mut map = base();
        map.insert(keys::DOMAIN_ID, "   ");
        assert!(matches!(
            load(&map),
            Err(GovernanceError::InvalidConfig { key: keys::DOMAIN_ID, .. })
        ));
    }

    #[test]
    fn test_invalid_values() {
        let cases = [
            (keys::PRODUCER_ACCOUNT, "12345"),
            (keys::TOPIC_PARTITIONS, "many"),
            (keys::BROKER_PORT, "-1"),
            (keys::REMOVAL_POLICY, "snapshot"),
            (keys::CLIENT_AUTH_MODE, "sasl"),
            (keys::MANAGE_ACCESS_ROLE_ARN, "not-an-arn"),
            (keys::TOPIC_NAME, "bad/name"),
        ];
        for (key, value) in cases {
            let mut map = base();
            map.insert(key, value);
            assert!(
                matches!(load(&map), Err(GovernanceError::InvalidConfig { .. })),
                "{key}={value}"
            );
        }
    }

    #[test]
    fn test_overrides() {
        let mut map = base();
        map.insert(keys::TOPIC_PARTITIONS, "6");
        map.insert(keys::BROKER_PORT, "9094");
        map.insert(keys::CLIENT_AUTH_MODE, "mtls");
        map.insert(keys::REMOVAL_POLICY, "RETAIN");

        let config = load(&map).unwrap();
        assert_eq!(config.streaming.topic_partitions, 6);
        assert_eq!(config.streaming.broker_port, 9094);
        assert_eq!(config.streaming.auth_mode, AuthMode::Mtls);
        assert_eq!(config.removal_policy, RemovalPolicy::Retain);
    }

    #[test]
    fn test_default_port_follows_auth_mode() {
        let mut map = base();
        map.insert(keys::CLIENT_AUTH_MODE, "mtls");
        let config = load(&map).unwrap();
        assert_eq!(config.streaming.auth_mode, AuthMode::Mtls);
        assert_eq!(config.streaming.broker_port, 9094);

        // an explicit port still wins
        map.insert(keys::BROKER_PORT, "9098");
        assert_eq!(load(&map).unwrap().streaming.broker_port, 9098);
    }

    #[test]
    fn test_out_of_range_values_are_deferred() {
        // validated by the step that uses them
        let mut map = base();
        map.insert(keys::TOPIC_PARTITIONS, "0");
        map.insert(keys::BROKER_PORT, "70000");
        let config = load(&map).unwrap();
        assert_eq!(config.streaming.topic_partitions, 0);
        assert_eq!(config.streaming.broker_port, 70000);
    }
}
