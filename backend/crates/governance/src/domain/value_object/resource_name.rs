//! Resource Name Value Object
//!
//! Names of topics, clusters and schema registries. The rules are the
//! intersection of what the streaming cluster accepts for topic names and what
//! the schema registry accepts for registry names.
//!
//! ## Invariants
//! - 1..=249 characters
//! - Only `a-z A-Z 0-9 . _ -`
//! - Not `.` or `..`

use serde::{Deserialize, Serialize};
use std::fmt;

pub const RESOURCE_NAME_MAX_LENGTH: usize = 249;

const ALLOWED_SPECIAL_CHARS: &[char] = &['.', '_', '-'];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceNameError {
    Empty,
    TooLong { length: usize, max: usize },
    InvalidCharacter { char: char, position: usize },
    Reserved { name: String },
}

impl fmt::Display for ResourceNameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "resource name cannot be empty"),
            Self::TooLong { length, max } => {
                write!(f, "resource name is too long ({length} chars, maximum {max})")
            }
            Self::InvalidCharacter { char, position } => write!(
                f,
                "invalid character '{char}' at position {position}. Only a-z, A-Z, 0-9, ., _, - are allowed"
            ),
            Self::Reserved { name } => write!(f, "'{name}' is not a usable resource name"),
        }
    }
}

impl std::error::Error for ResourceNameError {}

#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ResourceName(String);

impl ResourceName {
    pub fn new(input: impl AsRef<str>) -> Result<Self, ResourceNameError> {
        let value = input.as_ref().trim();

        if value.is_empty() {
            return Err(ResourceNameError::Empty);
        }

        let length = value.chars().count();
        if length > RESOURCE_NAME_MAX_LENGTH {
            return Err(ResourceNameError::TooLong {
                length,
                max: RESOURCE_NAME_MAX_LENGTH,
            });
        }

        for (position, ch) in value.chars().enumerate() {
            if !(ch.is_ascii_alphanumeric() || ALLOWED_SPECIAL_CHARS.contains(&ch)) {
                return Err(ResourceNameError::InvalidCharacter { char: ch, position });
            }
        }

        if value == "." || value == ".." {
            return Err(ResourceNameError::Reserved {
                name: value.to_string(),
            });
        }

        Ok(Self(value.to_string()))
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ResourceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ResourceName({})", self.0)
    }
}

impl fmt::Display for ResourceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ResourceName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ResourceName {
    type Error = ResourceNameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for ResourceName {
    type Error = ResourceNameError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ResourceName> for String {
    fn from(name: ResourceName) -> Self {
        name.0
    }
}
