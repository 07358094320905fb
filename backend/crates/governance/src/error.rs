//! Governance Error Types
//!
//! This module provides provisioning error variants that integrate
//! with the unified `kernel::error::AppError` system.

use kernel::error::{app_error::AppError, kind::ErrorKind};
use serde::Serialize;
use std::fmt;
use thiserror::Error;

use crate::domain::value_object::{
    account_id::AccountIdError, governance_id::IdentifierError, port::PortOutOfRange,
    principal::PrincipalError, resource_name::ResourceNameError, AuthMode,
};

/// Governance-specific result type alias
pub type GovernanceResult<T> = Result<T, GovernanceError>;

/// Governance-specific error variants
#[derive(Debug, Error)]
pub enum GovernanceError {
    /// Empty or malformed account id
    #[error("Invalid account id: {0}")]
    InvalidAccount(#[from] AccountIdError),

    /// Operation against a domain that is unknown or not governed by the
    /// given central account
    #[error("Unauthorized domain {domain_id}: {reason}")]
    UnauthorizedDomain { domain_id: String, reason: String },

    /// Principal or account never registered with the central authority
    #[error("Unauthorized principal {principal}: account is not registered with the domain")]
    UnauthorizedPrincipal { principal: String },

    /// Invalid partition count or storage size
    #[error("Capacity error on {resource}: {reason}")]
    Capacity { resource: String, reason: String },

    /// Port outside the protocol range
    #[error("Invalid port: {0}")]
    InvalidPort(#[from] PortOutOfRange),

    /// Same resource name already used in the owner's namespace
    #[error("Resource {name} already exists in account {owner}")]
    DuplicateResource { owner: String, name: String },

    /// Asset type not registered with the domain
    #[error("Asset type {asset_type} is not governed by the domain")]
    UnknownAssetType { asset_type: String },

    /// Grant requested with a different client authentication than the
    /// resource's listener
    #[error("Resource {resource} uses {expected} authentication, {requested} was requested")]
    AuthModeMismatch {
        resource: String,
        expected: AuthMode,
        requested: AuthMode,
    },

    /// A domain with a different id is already configured
    #[error("Domain {existing} is already configured")]
    DomainAlreadyConfigured { existing: String },

    /// Consumer topology requested before the producer published its boundary
    #[error("Producer network boundary is not available; the producer topology must be provisioned first")]
    MissingProducerBoundary,

    /// Descriptor lookup failed
    #[error("{what} not found: {id}")]
    NotFound { what: &'static str, id: String },

    #[error("Invalid resource name: {0}")]
    InvalidName(#[from] ResourceNameError),

    #[error("Invalid principal: {0}")]
    InvalidPrincipal(#[from] PrincipalError),

    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(#[from] IdentifierError),

    /// Missing or unparsable configuration key
    #[error("Invalid configuration {key}: {reason}")]
    InvalidConfig { key: &'static str, reason: String },

    /// External service failure
    #[error("{service} service error: {message}")]
    Service {
        service: &'static str,
        message: String,
    },
}

impl GovernanceError {
    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        use GovernanceError::*;
        match self {
            InvalidAccount(_)
            | Capacity { .. }
            | InvalidPort(_)
            | AuthModeMismatch { .. }
            | InvalidName(_)
            | InvalidPrincipal(_)
            | InvalidIdentifier(_) => ErrorKind::InvalidInput,
            UnauthorizedDomain { .. } | UnauthorizedPrincipal { .. } => ErrorKind::Unauthorized,
            UnknownAssetType { .. } | NotFound { .. } => ErrorKind::NotFound,
            DuplicateResource { .. } | DomainAlreadyConfigured { .. } => ErrorKind::Conflict,
            MissingProducerBoundary => ErrorKind::FailedPrecondition,
            InvalidConfig { .. } => ErrorKind::Configuration,
            Service { .. } => ErrorKind::ServiceUnavailable,
        }
    }

    pub(crate) fn not_found(what: &'static str, id: impl fmt::Display) -> Self {
        Self::NotFound {
            what,
            id: id.to_string(),
        }
    }

    pub(crate) fn service(service: &'static str, message: impl Into<String>) -> Self {
        Self::Service {
            service,
            message: message.into(),
        }
    }

    /// Convert to AppError
    pub fn to_app_error(&self) -> AppError {
        AppError::new(self.kind(), self.to_string())
    }

    /// Log the error with appropriate level
    pub fn log(&self) {
        match self {
            GovernanceError::Service { service, message } => {
                tracing::error!(service = %service, message = %message, "Provisioning service error");
            }
            GovernanceError::UnauthorizedDomain { .. }
            | GovernanceError::UnauthorizedPrincipal { .. } => {
                tracing::warn!(error = %self, "Authorization rejected");
            }
            _ => {
                tracing::debug!(error = %self, "Governance error");
            }
        }
    }
}

impl From<GovernanceError> for AppError {
    fn from(err: GovernanceError) -> Self {
        err.to_app_error().with_source(err)
    }
}

// ============================================================================
// Step-level error
// ============================================================================

/// Identifier of an orchestrated provisioning step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProvisionStep {
    CentralAuthority,
    ProducerTopology,
    ConsumerTopology,
    SubscriptionGrant,
    Teardown,
}

impl ProvisionStep {
    #[inline]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::CentralAuthority => "central-authority",
            Self::ProducerTopology => "producer-topology",
            Self::ConsumerTopology => "consumer-topology",
            Self::SubscriptionGrant => "subscription-grant",
            Self::Teardown => "teardown",
        }
    }
}

impl fmt::Display for ProvisionStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Failure of one orchestrated step; the run is aborted
#[derive(Debug, Error)]
#[error("step `{step}` failed: {source}")]
pub struct ProvisionError {
    pub step: ProvisionStep,
    #[source]
    pub source: GovernanceError,
}

impl ProvisionError {
    pub fn new(step: ProvisionStep, source: GovernanceError) -> Self {
        Self { step, source }
    }

    pub fn kind(&self) -> ErrorKind {
        self.source.kind()
    }
}

impl From<ProvisionError> for AppError {
    fn from(err: ProvisionError) -> Self {
        let action = if err.kind().is_operator_error() {
            "Correct the input and re-run the whole deployment"
        } else {
            "Check the provisioning platform and re-run the whole deployment"
        };
        AppError::new(err.kind(), err.to_string())
            .with_action(action)
            .with_source(err)
    }
}
