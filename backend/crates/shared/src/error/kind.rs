//! Error classification
//!
//! [`ErrorKind`] is the failure class of an account request and decides the
//! HTTP status. [`ErrorCode`] is the stable number clients switch on; several
//! codes share one kind.
//!
//! | Kind | Status | Codes |
//! |---|---|---|
//! | `Rejected` | 400 | 5, 7, 9, 11, 14 |
//! | `Unauthenticated` | 401 | 1, 2, 10, 13 |
//! | `Forbidden` | 403 | 8 |
//! | `NotFound` | 404 | 12 |
//! | `Conflict` | 409 | 0, 3, 4 |
//! | `Expired` | 410 | 6 |
//! | `Internal` | 500 | none |

use std::fmt;

use serde::Serialize;

/// Failure class of a request
///
/// ```rust
/// use kernel::error::kind::ErrorKind;
///
/// assert_eq!(ErrorKind::Expired.status_code(), 410);
/// assert!(ErrorKind::Internal.is_server_error());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The request cannot be applied: bad token, wrong 2FA state, malformed input
    Rejected,
    /// No usable session, or credentials did not match
    Unauthenticated,
    /// Authenticated but lacking the admin flag
    Forbidden,
    NotFound,
    /// Clashes with stored state (taken email, password rules)
    Conflict,
    /// A token was right but too old
    Expired,
    /// Anything the client cannot act on; details stay in the logs
    Internal,
}

impl ErrorKind {
    pub const fn status_code(&self) -> u16 {
        match self {
            ErrorKind::Rejected => 400,
            ErrorKind::Unauthenticated => 401,
            ErrorKind::Forbidden => 403,
            ErrorKind::NotFound => 404,
            ErrorKind::Conflict => 409,
            ErrorKind::Expired => 410,
            ErrorKind::Internal => 500,
        }
    }

    /// Label used in logs and `Display`
    pub const fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Rejected => "rejected",
            ErrorKind::Unauthenticated => "unauthenticated",
            ErrorKind::Forbidden => "forbidden",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Conflict => "conflict",
            ErrorKind::Expired => "expired",
            ErrorKind::Internal => "internal",
        }
    }

    /// Server errors carry no code and a generic message on the wire
    pub const fn is_server_error(&self) -> bool {
        matches!(self, ErrorKind::Internal)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Numeric error code rendered as the `error` field of a response body
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct ErrorCode(u16);

impl ErrorCode {
    pub const fn new(code: u16) -> Self {
        Self(code)
    }

    pub const fn get(self) -> u16 {
        self.0
    }
}

impl From<u16> for ErrorCode {
    fn from(code: u16) -> Self {
        Self(code)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
