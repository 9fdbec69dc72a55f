//! Extended operation error types
//!
//! Error definitions with transient/permanent classification, mirroring the
//! connector framework so callers can share retry policy.

use thiserror::Error;

use crate::response::PasswordModifyResult;
use crate::result::ResultCode;

/// Error that can occur while running an LDAP extended operation.
#[derive(Debug, Error)]
pub enum ExopError {
    // Transport errors (transient)
    /// The response slot closed or the message could not be retrieved.
    #[error("network error: {message}")]
    Network {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    // Protocol-shape errors (permanent)
    /// The server answered with a protocol operation other than an extended response.
    #[error("unexpected response: tag {tag}")]
    UnexpectedResponse { tag: u64 },

    /// The response could not be interpreted.
    #[error("malformed response: {message}")]
    MalformedResponse { message: String },

    /// The request could not be serialized.
    #[error("encoding failed: {message}")]
    Encoding { message: String },

    // Directory result errors
    /// The server returned a non-success result code.
    #[error(transparent)]
    Directory(#[from] DirectoryError),

    // Configuration errors (permanent)
    /// Session configuration is invalid.
    #[error("invalid configuration: {message}")]
    InvalidConfiguration { message: String },
}

/// A non-success LDAP result, as returned by the server.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("LDAP result code {} ({}): {message}", .code.as_u32(), .code.name())]
pub struct DirectoryError {
    /// Result code reported by the server.
    pub code: ResultCode,

    /// Matched DN component of the result.
    pub matched_dn: String,

    /// Diagnostic message component of the result.
    pub message: String,

    /// Referral URI, set only when `code` is [`ResultCode::Referral`].
    pub referral: Option<String>,
}

impl DirectoryError {
    /// Check whether this is a referral-class failure.
    #[must_use]
    pub fn is_referral(&self) -> bool {
        self.code == ResultCode::Referral
    }
}

impl ExopError {
    /// Check if this error is transient and the operation could be retried.
    pub fn is_transient(&self) -> bool {
        match self {
            ExopError::Network { .. } => true,
            ExopError::Directory(err) => err.code.is_transient(),
            _ => false,
        }
    }

    /// Check if this error is permanent and retry won't help.
    pub fn is_permanent(&self) -> bool {
        !self.is_transient()
    }

    /// Get an error code for classification.
    pub fn error_code(&self) -> &'static str {
        match self {
            ExopError::Network { .. } => "NETWORK_ERROR",
            ExopError::UnexpectedResponse { .. } => "UNEXPECTED_RESPONSE",
            ExopError::MalformedResponse { .. } => "MALFORMED_RESPONSE",
            ExopError::Encoding { .. } => "ENCODING_FAILED",
            ExopError::Directory(err) if err.is_referral() => "REFERRAL",
            ExopError::Directory(_) => "DIRECTORY_ERROR",
            ExopError::InvalidConfiguration { .. } => "INVALID_CONFIG",
        }
    }

    /// Result code of a directory failure, if this is one.
    pub fn result_code(&self) -> Option<ResultCode> {
        match self {
            ExopError::Directory(err) => Some(err.code),
            _ => None,
        }
    }

    /// Referral URI carried by a referral-class failure.
    pub fn referral(&self) -> Option<&str> {
        match self {
            ExopError::Directory(err) => err.referral.as_deref(),
            _ => None,
        }
    }

    /// Partial result accompanying a referral-class failure.
    ///
    /// Only referral failures carry one; the referral field is set when the
    /// server supplied a URI.
    pub fn partial_result(&self) -> Option<PasswordModifyResult> {
        match self {
            ExopError::Directory(err) if err.is_referral() => Some(PasswordModifyResult {
                generated_password: None,
                referral: err.referral.clone(),
            }),
            _ => None,
        }
    }

    // Convenience constructors

    /// Create a network error.
    pub fn network(message: impl Into<String>) -> Self {
        ExopError::Network {
            message: message.into(),
            source: None,
        }
    }

    /// Create a network error with source.
    pub fn network_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        ExopError::Network {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a malformed response error.
    pub fn malformed(message: impl Into<String>) -> Self {
        ExopError::MalformedResponse {
            message: message.into(),
        }
    }

    /// Create an invalid configuration error.
    pub fn invalid_configuration(message: impl Into<String>) -> Self {
        ExopError::InvalidConfiguration {
            message: message.into(),
        }
    }
}

/// Result type for extended operations.
pub type ExopResult<T> = Result<T, ExopError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn directory(code: ResultCode, referral: Option<&str>) -> ExopError {
        ExopError::Directory(DirectoryError {
            code,
            matched_dn: String::new(),
            message: "failed".to_string(),
            referral: referral.map(str::to_string),
        })
    }

    #[test]
    fn test_transient_errors() {
        let transient_errors = vec![
            ExopError::network("response channel closed"),
            directory(ResultCode::Busy, None),
            directory(ResultCode::Unavailable, None),
        ];

        for err in transient_errors {
            assert!(
                err.is_transient(),
                "Expected {} to be transient",
                err.error_code()
            );
        }
    }

    #[test]
    fn test_permanent_errors() {
        let permanent_errors = vec![
            ExopError::UnexpectedResponse { tag: 7 },
            ExopError::malformed("short"),
            directory(ResultCode::InsufficientAccessRights, None),
            directory(ResultCode::Referral, Some("ldap://other.example.com")),
            ExopError::invalid_configuration("empty host"),
        ];

        for err in permanent_errors {
            assert!(
                err.is_permanent(),
                "Expected {} to be permanent",
                err.error_code()
            );
        }
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(ExopError::network("x").error_code(), "NETWORK_ERROR");
        assert_eq!(
            ExopError::UnexpectedResponse { tag: 1 }.error_code(),
            "UNEXPECTED_RESPONSE"
        );
        assert_eq!(directory(ResultCode::Referral, None).error_code(), "REFERRAL");
        assert_eq!(
            directory(ResultCode::ConstraintViolation, None).error_code(),
            "DIRECTORY_ERROR"
        );
    }

    #[test]
    fn test_error_display() {
        let err = ExopError::UnexpectedResponse { tag: 7 };
        assert_eq!(err.to_string(), "unexpected response: tag 7");

        let err = directory(ResultCode::InvalidCredentials, None);
        assert_eq!(
            err.to_string(),
            "LDAP result code 49 (invalidCredentials): failed"
        );
    }

    #[test]
    fn test_partial_result_only_for_referral() {
        let err = directory(ResultCode::Referral, Some("ldap://replica.example.com"));
        let partial = err.partial_result().unwrap();
        assert_eq!(
            partial.referral.as_deref(),
            Some("ldap://replica.example.com")
        );
        assert!(partial.generated_password.is_none());
        assert_eq!(err.referral(), Some("ldap://replica.example.com"));

        let err = directory(ResultCode::UnwillingToPerform, None);
        assert!(err.partial_result().is_none());
        assert_eq!(err.result_code(), Some(ResultCode::UnwillingToPerform));
    }

    #[test]
    fn test_error_with_source() {
        let source_err = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "connection reset");
        let err = ExopError::network_with_source("send failed", source_err);

        assert!(err.is_transient());
        if let ExopError::Network { source, .. } = &err {
            assert!(source.is_some());
        } else {
            panic!("Expected Network variant");
        }
    }
}
