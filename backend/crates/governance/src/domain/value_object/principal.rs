//! Principal Value Object
//!
//! An IAM role identity that can be granted produce/consume rights or be
//! authorized on a subscription target.
//!
//! ## Invariants
//! - The owning account is a valid [`AccountId`]
//! - Role name is 1..=64 characters from `[A-Za-z0-9+=,.@_-]`
//! - The canonical text form is the role ARN
//!   `arn:aws:iam::<account>:role/<name>` (paths are accepted on input and
//!   dropped)

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::account_id::{AccountId, AccountIdError};

pub const ROLE_NAME_MAX_LENGTH: usize = 64;

const ARN_PREFIX: &str = "arn:aws:iam::";
const ROLE_SEGMENT: &str = ":role/";
const ALLOWED_SPECIAL_CHARS: &[char] = &['+', '=', ',', '.', '@', '_', '-'];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrincipalError {
    /// Not of the form `arn:aws:iam::<account>:role/<name>`
    MalformedArn { arn: String },

    /// Role name empty, too long or with forbidden characters
    InvalidRoleName { name: String },

    /// Account part of the ARN is invalid
    Account(AccountIdError),
}

impl fmt::Display for PrincipalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedArn { arn } => write!(f, "'{arn}' is not an IAM role ARN"),
            Self::InvalidRoleName { name } => write!(
                f,
                "'{name}' is not a valid role name (1-{ROLE_NAME_MAX_LENGTH} chars of A-Z a-z 0-9 + = , . @ _ -)"
            ),
            Self::Account(e) => write!(f, "invalid principal account: {e}"),
        }
    }
}

impl std::error::Error for PrincipalError {}

impl From<AccountIdError> for PrincipalError {
    fn from(err: AccountIdError) -> Self {
        Self::Account(err)
    }
}

#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Principal {
    account: AccountId,
    role_name: String,
}

impl Principal {
    /// Principal for role `role_name` in `account`
    pub fn role(account: AccountId, role_name: impl Into<String>) -> Result<Self, PrincipalError> {
        let role_name = role_name.into();
        if !Self::is_valid_role_name(&role_name) {
            return Err(PrincipalError::InvalidRoleName { name: role_name });
        }
        Ok(Self { account, role_name })
    }

    /// Parse a role ARN, e.g. `arn:aws:iam::222222222222:role/ConsumerRole`
    pub fn parse_arn(arn: &str) -> Result<Self, PrincipalError> {
        let malformed = || PrincipalError::MalformedArn {
            arn: arn.to_string(),
        };

        let rest = arn.trim().strip_prefix(ARN_PREFIX).ok_or_else(malformed)?;
        let (account, path) = rest.split_once(ROLE_SEGMENT).ok_or_else(malformed)?;
        let role_name = path.rsplit('/').next().ok_or_else(malformed)?;

        Self::role(AccountId::new(account)?, role_name)
    }

    #[inline]
    pub fn account(&self) -> &AccountId {
        &self.account
    }

    #[inline]
    pub fn role_name(&self) -> &str {
        &self.role_name
    }

    pub fn arn(&self) -> String {
        format!("{ARN_PREFIX}{}{ROLE_SEGMENT}{}", self.account, self.role_name)
    }

    fn is_valid_role_name(name: &str) -> bool {
        let length = name.chars().count();
        (1..=ROLE_NAME_MAX_LENGTH).contains(&length)
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || ALLOWED_SPECIAL_CHARS.contains(&c))
    }
}

impl fmt::Debug for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Principal({})", self.arn())
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.arn())
    }
}

impl FromStr for Principal {
    type Err = PrincipalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_arn(s)
    }
}

impl TryFrom<String> for Principal {
    type Error = PrincipalError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse_arn(&value)
    }
}

impl From<Principal> for String {
    fn from(principal: Principal) -> Self {
        principal.arn()
    }
}
