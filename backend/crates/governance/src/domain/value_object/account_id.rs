//! Account ID Value Object
//!
//! Cloud account identifiers are exactly twelve ASCII digits
//! (e.g. `111111111111`). Leading zeros are significant, so the value is kept
//! as a string and never parsed into an integer.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of digits in an account identifier
pub const ACCOUNT_ID_LENGTH: usize = 12;

/// Error returned when account id validation fails
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountIdError {
    /// Empty after trimming
    Empty,

    /// Not exactly ACCOUNT_ID_LENGTH characters
    InvalidLength { length: usize },

    /// Contains something other than an ASCII digit
    NonDigit { char: char, position: usize },
}

impl fmt::Display for AccountIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "account id cannot be empty"),
            Self::InvalidLength { length } => write!(
                f,
                "account id must be {ACCOUNT_ID_LENGTH} digits, got {length} characters"
            ),
            Self::NonDigit { char, position } => {
                write!(f, "account id contains '{char}' at position {position}")
            }
        }
    }
}

impl std::error::Error for AccountIdError {}

/// Validated account identifier
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccountId(String);

impl AccountId {
    /// Validate and wrap raw input (surrounding whitespace is ignored)
    pub fn new(input: impl AsRef<str>) -> Result<Self, AccountIdError> {
        let trimmed = input.as_ref().trim();
        Self::validate(trimmed)?;
        Ok(Self(trimmed.to_string()))
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[inline]
    pub fn into_inner(self) -> String {
        self.0
    }

    fn validate(value: &str) -> Result<(), AccountIdError> {
        if value.is_empty() {
            return Err(AccountIdError::Empty);
        }

        for (position, ch) in value.chars().enumerate() {
            if !ch.is_ascii_digit() {
                return Err(AccountIdError::NonDigit { char: ch, position });
            }
        }

        let length = value.chars().count();
        if length != ACCOUNT_ID_LENGTH {
            return Err(AccountIdError::InvalidLength { length });
        }

        Ok(())
    }
}

impl fmt::Debug for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccountId({})", self.0)
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for AccountId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for AccountId {
    type Err = AccountIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for AccountId {
    type Error = AccountIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for AccountId {
    type Error = AccountIdError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<AccountId> for String {
    fn from(id: AccountId) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_account_id() {
        let id = AccountId::new("111111111111").unwrap();
        assert_eq!(id.as_str(), "111111111111");
    }

    #[test]
    fn test_leading_zeros_preserved() {
        let id = AccountId::new("012345678901").unwrap();
        assert_eq!(id.to_string(), "012345678901");
    }

    #[test]
    fn test_trimmed() {
        let id = AccountId::new("  222222222222\n").unwrap();
        assert_eq!(id.as_str(), "222222222222");
    }

    #[test]
    fn test_empty_fails() {
        assert_eq!(AccountId::new(""), Err(AccountIdError::Empty));
        assert_eq!(AccountId::new("   "), Err(AccountIdError::Empty));
    }

    #[test]
    fn test_wrong_length_fails() {
        assert_eq!(
            AccountId::new("12345"),
            Err(AccountIdError::InvalidLength { length: 5 })
        );
        assert_eq!(
            AccountId::new("1234567890123"),
            Err(AccountIdError::InvalidLength { length: 13 })
        );
    }

    #[test]
    fn test_non_digit_fails() {
        assert_eq!(
            AccountId::new("11111111111x"),
            Err(AccountIdError::NonDigit {
                char: 'x',
                position: 11
            })
        );
    }

    #[test]
    fn test_serde() {
        let id = AccountId::new("333333333333").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"333333333333\"");
        assert!(serde_json::from_str::<AccountId>("\"abc\"").is_err());
    }
}
