//! Infrastructure Layer
//!
//! Adapters for the descriptor store and the service ports.

pub mod memory;
pub mod simulated_cloud;
