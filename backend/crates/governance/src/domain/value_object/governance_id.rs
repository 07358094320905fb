//! Governance identifiers
//!
//! Domain ids (`dzd_...`), environment ids and asset type names are opaque
//! tokens issued by the governance service. They are supplied as
//! configuration and only checked for shape here.

use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const IDENTIFIER_MAX_LENGTH: usize = 128;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentifierError {
    Empty { kind: &'static str },
    TooLong { kind: &'static str, length: usize },
    InvalidCharacter { kind: &'static str, char: char },
}

impl fmt::Display for IdentifierError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty { kind } => write!(f, "{kind} cannot be empty"),
            Self::TooLong { kind, length } => write!(
                f,
                "{kind} is too long ({length} chars, maximum {IDENTIFIER_MAX_LENGTH})"
            ),
            Self::InvalidCharacter { kind, char } => {
                write!(f, "{kind} contains invalid character '{char}'")
            }
        }
    }
}

impl std::error::Error for IdentifierError {}

fn validate(kind: &'static str, input: &str) -> Result<String, IdentifierError> {
    let value = input.trim();
    if value.is_empty() {
        return Err(IdentifierError::Empty { kind });
    }
    let length = value.chars().count();
    if length > IDENTIFIER_MAX_LENGTH {
        return Err(IdentifierError::TooLong { kind, length });
    }
    if let Some(ch) = value
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '_' || *c == '-'))
    {
        return Err(IdentifierError::InvalidCharacter { kind, char: ch });
    }
    Ok(value.to_string())
}

/// Governance domain identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Display, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DomainId(String);

impl DomainId {
    pub fn new(input: impl AsRef<str>) -> Result<Self, IdentifierError> {
        validate("domain id", input.as_ref()).map(Self)
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Environment (project workspace) identifier inside a domain
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Display, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EnvironmentId(String);

impl EnvironmentId {
    pub fn new(input: impl AsRef<str>) -> Result<Self, IdentifierError> {
        validate("environment id", input.as_ref()).map(Self)
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Category of governed resource, e.g. `MskTopicAssetType`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Display, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AssetType(String);

impl AssetType {
    pub const MSK_TOPIC: &'static str = "MskTopicAssetType";

    pub fn new(input: impl AsRef<str>) -> Result<Self, IdentifierError> {
        validate("asset type", input.as_ref()).map(Self)
    }

    pub fn msk_topic() -> Self {
        Self(Self::MSK_TOPIC.to_string())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

macro_rules! string_conversions {
    ($($ty:ty),*) => {$(
        impl TryFrom<String> for $ty {
            type Error = IdentifierError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$ty> for String {
            fn from(value: $ty) -> Self {
                value.0
            }
        }
    )*};
}

string_conversions!(DomainId, EnvironmentId, AssetType);
