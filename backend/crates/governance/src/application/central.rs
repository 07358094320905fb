//! Central Authority Use Case
//!
//! Creates the governed domain, registers the governed asset type and
//! registers the producer and consumer accounts.

use std::sync::Arc;

use serde::Serialize;

use crate::application::config::GovernanceConfig;
use crate::application::ledger::{DeploymentLedger, PhysicalResource};
use crate::domain::gateway::CloudPlatform;
use crate::domain::registry::{AuthorizationRegistry, GovernedDomain};
use crate::domain::repository::DescriptorStore;
use crate::domain::value_object::{AccountId, AccountRole};
use crate::error::{GovernanceError, GovernanceResult, ProvisionStep};

/// Central step output
#[derive(Debug, Clone, Serialize)]
pub struct CentralOutput {
    pub domain: GovernedDomain,
    /// Accounts registered by this run (re-registrations excluded)
    pub registered: Vec<AccountId>,
}

/// Central authority use case
pub struct CentralAuthorityUseCase<P, S>
where
    P: CloudPlatform,
    S: DescriptorStore,
{
    platform: Arc<P>,
    store: Arc<S>,
    config: Arc<GovernanceConfig>,
}

impl<P, S> CentralAuthorityUseCase<P, S>
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
    ) -> GovernanceResult<CentralOutput> {
        let config = &self.config;

        registry.create_domain(config.domain_id.clone(), config.central_account.clone())?;

        // The registry only records what the service accepted
        if !registry.governs(&config.asset_type) {
            let revision = self
                .platform
                .create_asset_type(&config.domain_id, &config.asset_type)
                .await?;
            registry.register_asset_type(config.asset_type.clone())?;
            ledger.record(
                ProvisionStep::CentralAuthority,
                &config.central_account,
                PhysicalResource::AssetType {
                    domain_id: config.domain_id.clone(),
                    asset_type: config.asset_type.clone(),
                },
                config.removal_policy,
            );
            tracing::info!(
                domain_id = %config.domain_id,
                asset_type = %config.asset_type,
                revision = %revision,
                "Asset type registered"
            );
        }

        let mut registered = Vec::new();
        for (account_id, role) in [
            (&config.producer_account, AccountRole::Producer),
            (&config.consumer_account, AccountRole::Consumer),
        ] {
            if registry.is_registered(account_id) {
                tracing::debug!(account_id = %account_id, "Account already registered");
                continue;
            }

            self.platform
                .register_account(&config.domain_id, account_id)
                .await?;
            let registration = registry.register_account(account_id.as_str(), role)?;
            self.store.put_account(&registration.account).await?;

            tracing::info!(
                domain_id = %config.domain_id,
                account_id = %account_id,
                role = %role,
                "Account registered"
            );
            registered.push(account_id.clone());
        }

        let domain = registry
            .domain()
            .cloned()
            .ok_or_else(|| GovernanceError::not_found("domain", &config.domain_id))?;

        Ok(CentralOutput { domain, registered })
    }
}
