use serde::{Deserialize, Serialize};
use std::fmt;

/// Role an account plays in the topology
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountRole {
    Producer,
    Consumer,
    Central,
}

impl AccountRole {
    #[inline]
    pub const fn code(&self) -> &'static str {
        use AccountRole::*;
        match self {
            Producer => "producer",
            Consumer => "consumer",
            Central => "central",
        }
    }

    #[inline]
    pub fn from_code(code: &str) -> Option<Self> {
        use AccountRole::*;
        match code {
            "producer" => Some(Producer),
            "consumer" => Some(Consumer),
            "central" => Some(Central),
            _ => None,
        }
    }

    /// Producer and consumer accounts must be registered with the domain;
    /// the central account owns it.
    #[inline]
    pub const fn requires_registration(&self) -> bool {
        !matches!(self, AccountRole::Central)
    }
}

impl fmt::Display for AccountRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
