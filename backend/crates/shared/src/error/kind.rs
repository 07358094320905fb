//! Error Kind - Classification of errors
//!
//! Defines the [`ErrorKind`] enum that maps provisioning failures to
//! process exit codes (BSD `sysexits.h` numbering).

use serde::Serialize;

/// Classification of a provisioning failure
///
/// Every kind tells the operator whether the run can be fixed by correcting
/// the inputs (operator errors) or whether the platform itself failed.
///
/// ## Notes
/// * `non_exhaustive` - new kinds may be added as new adapters appear
///
/// ## Examples
/// ```rust
/// use kernel::error::kind::ErrorKind;
///
/// let kind = ErrorKind::Unauthorized;
/// assert_eq!(kind.exit_code(), 77);
/// assert_eq!(kind.as_str(), "Unauthorized");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[non_exhaustive]
pub enum ErrorKind {
    /// Malformed identifier, name, port or capacity value
    InvalidInput,
    /// Missing or unparsable configuration key
    Configuration,
    /// Account, principal or domain is not authorized
    Unauthorized,
    /// A descriptor or governed type does not exist
    NotFound,
    /// A resource with the same identity already exists
    Conflict,
    /// A step ran before the step it depends on
    FailedPrecondition,
    /// An external service failed or is unreachable
    ServiceUnavailable,
    /// Bug or broken invariant inside the core
    Internal,
}

impl ErrorKind {
    /// Process exit code for this kind
    ///
    /// ## Examples
    /// ```rust
    /// use kernel::error::kind::ErrorKind;
    /// assert_eq!(ErrorKind::InvalidInput.exit_code(), 65);
    /// assert_eq!(ErrorKind::Configuration.exit_code(), 78);
    /// ```
    #[inline]
    pub const fn exit_code(&self) -> u8 {
        match self {
            ErrorKind::InvalidInput => 65,
            ErrorKind::NotFound => 66,
            ErrorKind::ServiceUnavailable => 69,
            ErrorKind::Internal => 70,
            ErrorKind::Conflict => 73,
            ErrorKind::FailedPrecondition => 76,
            ErrorKind::Unauthorized => 77,
            ErrorKind::Configuration => 78,
        }
    }

    /// Human readable label
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidInput => "Invalid Input",
            ErrorKind::Configuration => "Configuration",
            ErrorKind::Unauthorized => "Unauthorized",
            ErrorKind::NotFound => "Not Found",
            ErrorKind::Conflict => "Conflict",
            ErrorKind::FailedPrecondition => "Failed Precondition",
            ErrorKind::ServiceUnavailable => "Service Unavailable",
            ErrorKind::Internal => "Internal",
        }
    }

    /// Whether correcting the inputs and re-running can fix the failure
    #[inline]
    pub const fn is_operator_error(&self) -> bool {
        !self.is_platform_error()
    }

    /// Whether the failure came from the platform or the core itself
    ///
    /// These are logged at error level.
    #[inline]
    pub const fn is_platform_error(&self) -> bool {
        matches!(self, ErrorKind::ServiceUnavailable | ErrorKind::Internal)
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
