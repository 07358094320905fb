use serde::{Deserialize, Serialize};
use std::fmt;

use super::port::Port;

/// Client authentication mode of a broker listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMode {
    #[default]
    Iam,
    Mtls,
}

impl AuthMode {
    #[inline]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Iam => "iam",
            Self::Mtls => "mtls",
        }
    }

    #[inline]
    pub fn from_code(code: &str) -> Option<Self> {
        match code.to_ascii_lowercase().as_str() {
            "iam" => Some(Self::Iam),
            "mtls" | "tls" => Some(Self::Mtls),
            _ => None,
        }
    }

    /// Broker port serving clients of this mode
    #[inline]
    pub const fn listener_port(&self) -> Port {
        match self {
            Self::Iam => Port::BROKER_IAM,
            Self::Mtls => Port::BROKER_TLS,
        }
    }
}

impl fmt::Display for AuthMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
