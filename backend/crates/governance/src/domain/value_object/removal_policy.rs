use serde::{Deserialize, Serialize};
use std::fmt;

/// What teardown does with a provisioned resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemovalPolicy {
    #[default]
    Destroy,
    Retain,
}

impl RemovalPolicy {
    #[inline]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Destroy => "destroy",
            Self::Retain => "retain",
        }
    }

    #[inline]
    pub fn from_code(code: &str) -> Option<Self> {
        match code.to_ascii_lowercase().as_str() {
            "destroy" => Some(Self::Destroy),
            "retain" => Some(Self::Retain),
            _ => None,
        }
    }

    #[inline]
    pub const fn deletes(&self) -> bool {
        matches!(self, Self::Destroy)
    }
}

impl fmt::Display for RemovalPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
