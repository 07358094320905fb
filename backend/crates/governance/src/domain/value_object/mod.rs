//! Value Object Module

pub mod account_id;
pub mod account_role;
pub mod auth_mode;
pub mod governance_id;
pub mod port;
pub mod principal;
pub mod removal_policy;
pub mod resource_name;

pub use account_id::AccountId;
pub use account_role::AccountRole;
pub use auth_mode::AuthMode;
pub use governance_id::{AssetType, DomainId, EnvironmentId};
pub use port::Port;
pub use principal::Principal;
pub use removal_policy::RemovalPolicy;
pub use resource_name::ResourceName;
