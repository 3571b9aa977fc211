use std::fmt;

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type RpcResult<T> = Result<T, RpcError>;

/// Numeric error code reported by the cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ErrorCode(pub i32);

impl ErrorCode {
    pub const OK: Self = Self(0);
    pub const GENERIC: Self = Self(1);
    pub const CANCELED: Self = Self(2);
    pub const TIMEOUT: Self = Self(3);
    pub const TRANSPORT_ERROR: Self = Self(100);
    pub const PROTOCOL_ERROR: Self = Self(101);
    pub const NO_SUCH_SERVICE: Self = Self(102);
    pub const NO_SUCH_METHOD: Self = Self(103);
    pub const UNAVAILABLE: Self = Self(105);
    pub const RESOLVE_ERROR: Self = Self(500);
    /// The transaction has expired or was already finished on the server.
    pub const NO_SUCH_TRANSACTION: Self = Self(11000);
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Error returned by a remote call.
///
/// Errors form a tree: a proxy may wrap the error of the node it forwarded
/// the request to, so code checks go through [`RpcError::matches`].
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic, Serialize, Deserialize)]
#[error("{message} (code {code})")]
pub struct RpcError {
    code: ErrorCode,
    message: String,
    #[serde(default)]
    inner_errors: Vec<RpcError>,
}

impl RpcError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            inner_errors: Vec::new(),
        }
    }

    pub fn generic(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::GENERIC, message)
    }

    pub fn canceled(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::CANCELED, message)
    }

    pub fn no_such_transaction(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NO_SUCH_TRANSACTION, message)
    }

    pub fn with_inner(mut self, inner: RpcError) -> Self {
        self.inner_errors.push(inner);
        self
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn inner_errors(&self) -> &[RpcError] {
        &self.inner_errors
    }

    /// Returns true if this error or any nested error carries `code`.
    pub fn matches(&self, code: ErrorCode) -> bool {
        self.code == code || self.inner_errors.iter().any(|inner| inner.matches(code))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_nested() {
        let error = RpcError::generic("request failed").with_inner(
            RpcError::new(ErrorCode::UNAVAILABLE, "proxy is banned")
                .with_inner(RpcError::no_such_transaction("no such transaction 1-2-3-4")),
        );
        assert!(error.matches(ErrorCode::GENERIC));
        assert!(error.matches(ErrorCode::UNAVAILABLE));
        assert!(error.matches(ErrorCode::NO_SUCH_TRANSACTION));
        assert!(!error.matches(ErrorCode::TIMEOUT));
    }

    #[test]
    fn test_display() {
        let error = RpcError::new(ErrorCode::TIMEOUT, "request timed out");
        assert_eq!(error.to_string(), "request timed out (code 3)");
    }

    #[test]
    fn test_deserialize_without_inner_errors() {
        let error: RpcError =
            serde_json::from_str(r#"{"code": 11000, "message": "gone"}"#).unwrap();
        assert_eq!(error.code(), ErrorCode::NO_SUCH_TRANSACTION);
        assert!(error.inner_errors().is_empty());
    }
}
