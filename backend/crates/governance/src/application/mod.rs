//! Application Layer - Use Cases
//!
//! This layer sequences domain logic and the external service ports.
//! Contains the three provisioning steps and the orchestrator driving them.

pub mod central;
pub mod config;
pub mod consumer;
pub mod ledger;
pub mod network;
pub mod orchestrator;
pub mod producer;
