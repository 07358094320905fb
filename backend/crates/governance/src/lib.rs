//! Streaming Governance Provisioning Module
//!
//! Clean Architecture structure:
//! - `domain/` - Entities, value objects, authorization registry, repository traits, service ports
//! - `application/` - Provisioning steps and the orchestrator
//! - `infra/` - In-memory descriptor store and simulated cloud adapter
//!
//! ## Features
//! - Central authority: governed domain, asset types, account registration
//! - Producer topology: role, cluster, topic with producer grant, schema registry
//! - Consumer topology: peered boundary, two-sided broker rules, subscription target
//! - Subscription grant and reverse-order teardown under a removal policy
//!
//! ## Authorization Model
//! - Accounts are registered with the central authority before anything references them
//! - Environments are authorized against the central account that governs the domain
//! - Cross-boundary traffic needs an ingress rule and the matching egress rule on one port
//! - A subscription stays pending until the producer's access policy admits the consumer

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;

// Re-exports for convenience
pub use application::config::GovernanceConfig;
pub use application::orchestrator::{DeploymentSummary, Orchestrator, TeardownReport};
pub use error::{GovernanceError, GovernanceResult, ProvisionError, ProvisionStep};
pub use infra::memory::InMemoryDescriptorStore;
pub use infra::simulated_cloud::SimulatedCloud;

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

pub mod models {
    pub use crate::domain::entity::*;
    pub use crate::domain::value_object::*;
}

#[cfg(test)]
mod tests;
