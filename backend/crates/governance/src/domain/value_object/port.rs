use serde::{Deserialize, Serialize};
use std::fmt;

/// TCP port of a broker listener
///
/// Raw values arrive as `u32` so that out-of-range input (0, 70000) can be
/// rejected instead of silently truncated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u16")]
pub struct Port(u16);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortOutOfRange(pub u32);

impl fmt::Display for PortOutOfRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "port {} is outside 1..=65535", self.0)
    }
}

impl std::error::Error for PortOutOfRange {}

impl Port {
    /// Listener for IAM-authenticated clients
    pub const BROKER_IAM: Port = Port(9098);
    /// Listener for mutual-TLS clients
    pub const BROKER_TLS: Port = Port(9094);

    pub fn new(value: u32) -> Result<Self, PortOutOfRange> {
        match u16::try_from(value) {
            Ok(port) if port != 0 => Ok(Self(port)),
            _ => Err(PortOutOfRange(value)),
        }
    }

    #[inline]
    pub const fn get(&self) -> u16 {
        self.0
    }
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u32> for Port {
    type Error = PortOutOfRange;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Port> for u16 {
    fn from(port: Port) -> Self {
        port.0
    }
}
