//! Account Entity

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::value_object::{account_id::AccountId, account_role::AccountRole};

/// An account taking part in the topology
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Account {
    pub account_id: AccountId,
    pub role: AccountRole,
    /// When the central authority first saw the account
    pub registered_at: DateTime<Utc>,
}

impl Account {
    pub fn new(account_id: AccountId, role: AccountRole) -> Self {
        Self {
            account_id,
            role,
            registered_at: Utc::now(),
        }
    }
}
