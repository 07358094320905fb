//! Shared Kernel - Cross-crate minimal core
//!
//! This crate contains the "smallest core" of the provisioning vocabulary:
//! - The unified error type, its classification and result aliases
//! - Typed descriptor IDs
//!
//! **Design Principle**: Only include things that are "hard to change"
//! and have consistent meaning across all crates.

pub mod error {
    pub mod app_error;
    pub mod conversions;
    pub mod kind;
}
pub mod id;
