//! Authorization Registry
//!
//! Central authority of the governed domain. Tracks the domain itself, the
//! asset types it governs, the accounts allowed to interact with it and the
//! environments whose trust edge to the central account has been
//! established.
//!
//! ```text
//! Unconfigured -> DomainCreated -> AccountsRegistered -> EnvironmentsAuthorized
//! ```
//!
//! The registry is owned by a single orchestrator and mutated through
//! `&mut self`; it never needs interior locking.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::domain::entity::account::Account;
use crate::domain::value_object::{AccountId, AccountRole, AssetType, DomainId, Principal};
use crate::error::{GovernanceError, GovernanceResult};

/// Lifecycle state of the registry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistryState {
    #[default]
    Unconfigured,
    DomainCreated,
    AccountsRegistered,
    EnvironmentsAuthorized,
}

/// The governed domain and the account that administers it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GovernedDomain {
    pub domain_id: DomainId,
    pub central_account: AccountId,
}

/// Result of [`AuthorizationRegistry::register_account`]
#[derive(Debug, Clone)]
pub struct AccountRegistration {
    pub account: Account,
    /// `false` when the account was already registered
    pub newly_registered: bool,
}

#[derive(Debug, Default)]
pub struct AuthorizationRegistry {
    domain: Option<GovernedDomain>,
    asset_types: BTreeSet<AssetType>,
    accounts: BTreeMap<AccountId, Account>,
    authorized: BTreeSet<AccountId>,
    state: RegistryState,
}

const UNCONFIGURED: &str = "<unconfigured>";

impl AuthorizationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> RegistryState {
        self.state
    }

    pub fn domain(&self) -> Option<&GovernedDomain> {
        self.domain.as_ref()
    }

    /// Create the governed domain
    ///
    /// Repeating the call with the same domain and central account is a
    /// no-op returning `Ok(false)`.
    pub fn create_domain(
        &mut self,
        domain_id: DomainId,
        central_account: AccountId,
    ) -> GovernanceResult<bool> {
        if let Some(existing) = &self.domain {
            if existing.domain_id == domain_id && existing.central_account == central_account {
                return Ok(false);
            }
            return Err(GovernanceError::DomainAlreadyConfigured {
                existing: existing.domain_id.to_string(),
            });
        }

        tracing::debug!(domain_id = %domain_id, central_account = %central_account, "Domain created");
        self.domain = Some(GovernedDomain {
            domain_id,
            central_account,
        });
        self.advance(RegistryState::DomainCreated);
        Ok(true)
    }

    /// Record an asset type as governed by the domain
    pub fn register_asset_type(&mut self, asset_type: AssetType) -> GovernanceResult<bool> {
        self.require_domain("asset types can only be registered with a created domain")?;
        Ok(self.asset_types.insert(asset_type))
    }

    pub fn governs(&self, asset_type: &AssetType) -> bool {
        self.asset_types.contains(asset_type)
    }

    pub fn asset_types(&self) -> impl Iterator<Item = &AssetType> {
        self.asset_types.iter()
    }

    /// Register an account with the domain
    ///
    /// The raw id is validated first. Re-registration keeps the existing
    /// record and reports `newly_registered = false`.
    pub fn register_account(
        &mut self,
        raw_account_id: &str,
        role: AccountRole,
    ) -> GovernanceResult<AccountRegistration> {
        let account_id = AccountId::new(raw_account_id)?;
        self.require_domain("accounts can only be registered with a created domain")?;

        if let Some(existing) = self.accounts.get(&account_id) {
            return Ok(AccountRegistration {
                account: existing.clone(),
                newly_registered: false,
            });
        }

        let account = Account::new(account_id.clone(), role);
        self.accounts.insert(account_id, account.clone());
        self.advance(RegistryState::AccountsRegistered);

        Ok(AccountRegistration {
            account,
            newly_registered: true,
        })
    }

    pub fn is_registered(&self, account_id: &AccountId) -> bool {
        self.accounts.contains_key(account_id)
    }

    pub fn account(&self, account_id: &AccountId) -> Option<&Account> {
        self.accounts.get(account_id)
    }

    pub fn accounts(&self) -> impl Iterator<Item = &Account> {
        self.accounts.values()
    }

    /// Establish the trust edge `account -> central_account`
    pub fn authorize_environment(
        &mut self,
        account_id: &AccountId,
        central_account: &AccountId,
    ) -> GovernanceResult<bool> {
        let domain = self.require_domain("no domain has been created")?;
        if &domain.central_account != central_account {
            return Err(GovernanceError::UnauthorizedDomain {
                domain_id: domain.domain_id.to_string(),
                reason: format!("account {central_account} does not govern the domain"),
            });
        }
        if !self.is_registered(account_id) {
            return Err(GovernanceError::UnauthorizedPrincipal {
                principal: account_id.to_string(),
            });
        }

        let newly = self.authorized.insert(account_id.clone());
        self.advance(RegistryState::EnvironmentsAuthorized);
        Ok(newly)
    }

    pub fn is_authorized(&self, account_id: &AccountId) -> bool {
        self.authorized.contains(account_id)
    }

    /// Check that `principal` may subscribe to `asset_types` of `domain_id`
    pub fn ensure_can_subscribe(
        &self,
        principal: &Principal,
        asset_types: &[AssetType],
        domain_id: &DomainId,
    ) -> GovernanceResult<()> {
        let domain = self.require_domain("no domain has been created")?;
        if &domain.domain_id != domain_id {
            return Err(GovernanceError::UnauthorizedDomain {
                domain_id: domain_id.to_string(),
                reason: format!("registry governs {}", domain.domain_id),
            });
        }
        if !self.is_registered(principal.account()) {
            return Err(GovernanceError::UnauthorizedPrincipal {
                principal: principal.arn(),
            });
        }
        if let Some(unknown) = asset_types.iter().find(|t| !self.governs(t)) {
            return Err(GovernanceError::UnknownAssetType {
                asset_type: unknown.to_string(),
            });
        }
        Ok(())
    }

    fn require_domain(&self, reason: &str) -> GovernanceResult<&GovernedDomain> {
        self.domain
            .as_ref()
            .ok_or_else(|| GovernanceError::UnauthorizedDomain {
                domain_id: UNCONFIGURED.to_string(),
                reason: reason.to_string(),
            })
    }

    /// States only move forward
    fn advance(&mut self, next: RegistryState) {
        if self.state < next {
            self.state = next;
        }
    }
}
