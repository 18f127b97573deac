use std::fmt;

use thiserror::Error;

mod translate;

pub use translate::{Phase, translate};

/// Low-level code and message attached to every [`DbApiError`].
///
/// `code` is `None` for failures detected on the client side (bad parameters, API misuse)
/// that never reached the handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorDetail {
    pub code: Option<i32>,
    pub message: String,
}

impl ErrorDetail {
    #[must_use]
    pub fn client(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn from_handle(code: i32, message: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            message: message.into(),
        }
    }
}

impl fmt::Display for ErrorDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "{} (rc {code})", self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// Discriminant of [`DbApiError`], for callers that only care about the category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Interface,
    Operational,
    Integrity,
    Programming,
    Data,
    NotSupported,
    Internal,
}

/// Errors surfaced by connections and cursors.
#[derive(Debug, Clone, Error)]
pub enum DbApiError {
    /// Misuse of the API: stale cursor, fetch before execute, double close, unbindable value.
    #[error("Interface error: {0}")]
    Interface(ErrorDetail),

    /// Environment or transient failure: bad tier or database, begin/commit failures.
    #[error("Operational error: {0}")]
    Operational(ErrorDetail),

    /// Constraint violation, typically only detected at commit.
    #[error("Integrity error: {0}")]
    Integrity(ErrorDetail),

    /// Malformed SQL or transaction control issued through a cursor.
    #[error("Programming error: {0}")]
    Programming(ErrorDetail),

    /// Value out of range or undecodable text.
    #[error("Data error: {0}")]
    Data(ErrorDetail),

    /// A value or operation with no client-side representation.
    #[error("Not supported: {0}")]
    NotSupported(ErrorDetail),

    /// The engine reported an internal inconsistency.
    #[error("Internal error: {0}")]
    Internal(ErrorDetail),
}

impl DbApiError {
    pub(crate) fn interface(message: impl Into<String>) -> Self {
        Self::Interface(ErrorDetail::client(message))
    }

    pub(crate) fn data(message: impl Into<String>) -> Self {
        Self::Data(ErrorDetail::client(message))
    }

    pub(crate) fn programming(message: impl Into<String>) -> Self {
        Self::Programming(ErrorDetail::client(message))
    }

    pub(crate) fn operational(message: impl Into<String>) -> Self {
        Self::Operational(ErrorDetail::client(message))
    }

    pub(crate) fn not_supported(message: impl Into<String>) -> Self {
        Self::NotSupported(ErrorDetail::client(message))
    }

    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Interface(_) => ErrorKind::Interface,
            Self::Operational(_) => ErrorKind::Operational,
            Self::Integrity(_) => ErrorKind::Integrity,
            Self::Programming(_) => ErrorKind::Programming,
            Self::Data(_) => ErrorKind::Data,
            Self::NotSupported(_) => ErrorKind::NotSupported,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }

    #[must_use]
    pub fn detail(&self) -> &ErrorDetail {
        match self {
            Self::Interface(d)
            | Self::Operational(d)
            | Self::Integrity(d)
            | Self::Programming(d)
            | Self::Data(d)
            | Self::NotSupported(d)
            | Self::Internal(d) => d,
        }
    }

    /// The originating handle return code, if the failure came from the handle.
    #[must_use]
    pub fn code(&self) -> Option<i32> {
        self.detail().code
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.detail().message
    }

    /// Everything except `Interface` is a database error in the standard hierarchy.
    #[must_use]
    pub fn is_database_error(&self) -> bool {
        !matches!(self, Self::Interface(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_and_detail_follow_variant() {
        let err = DbApiError::Integrity(ErrorDetail::from_handle(-103, "dup key"));
        assert_eq!(err.kind(), ErrorKind::Integrity);
        assert_eq!(err.code(), Some(-103));
        assert_eq!(err.message(), "dup key");
        assert!(err.is_database_error());
        assert_eq!(err.to_string(), "Integrity error: dup key (rc -103)");
    }

    #[test]
    fn interface_errors_are_not_database_errors() {
        let err = DbApiError::interface("cursor is stale");
        assert!(!err.is_database_error());
        assert_eq!(err.code(), None);
        assert_eq!(err.to_string(), "Interface error: cursor is stale");
    }
}
