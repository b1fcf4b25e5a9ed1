//! Error types for a single authentication request
//!
//! Every error ends the request. `AccessDenied` is the only variant that means
//! the user is not entitled; the `Authority` variants mean gitolite itself could
//! not answer.

use crate::auth::{AccessError, TokenError};
use crate::config::ConfigError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("invalid repo name {0:?}")]
    InvalidRepo(String),

    #[error("invalid operation {0:?}. Expected \"upload\" or \"download\".")]
    InvalidOperation(String),

    #[error("invalid OID {0:?}")]
    InvalidOid(String),
}

#[derive(Debug, Error)]
pub enum AuthenticateError {
    #[error("{0}")]
    Usage(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("missing GL_USER environment variable")]
    MissingIdentity,

    #[error("access check failed: {0}")]
    Authority(#[from] AccessError),

    #[error("Access denied!")]
    AccessDenied,

    #[error(transparent)]
    Signing(#[from] TokenError),

    #[error("failed to encode response: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, AuthenticateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_display() {
        let err = AuthenticateError::from(ValidationError::InvalidOperation("push".to_string()));
        assert_eq!(
            err.to_string(),
            "invalid operation \"push\". Expected \"upload\" or \"download\"."
        );

        let err = AuthenticateError::from(ValidationError::InvalidOid("zz".to_string()));
        assert_eq!(err.to_string(), "invalid OID \"zz\"");
    }

    #[test]
    fn test_denied_wording_differs_from_unavailable() {
        let denied = AuthenticateError::AccessDenied;
        let unavailable = AuthenticateError::from(AccessError::Unavailable);

        assert_eq!(denied.to_string(), "Access denied!");
        assert_eq!(
            unavailable.to_string(),
            "access check failed: failed to check ACL (no gitolite command or GL_BINDIR)"
        );
        assert!(matches!(unavailable, AuthenticateError::Authority(_)));
    }

    #[test]
    fn test_signing_display() {
        let err = AuthenticateError::from(TokenError::EmptySecret);
        assert_eq!(err.to_string(), "signing secret is empty");
    }

    #[test]
    fn test_serialization_from_serde_json() {
        let json_err = serde_json::from_str::<String>("not valid json").unwrap_err();
        let err: AuthenticateError = json_err.into();
        assert!(matches!(err, AuthenticateError::Serialization(_)));
        assert!(err.to_string().starts_with("failed to encode response:"));
    }
}
