//! git-lfs-authenticate - short-lived Git LFS credentials for gitolite repositories
//!
//! Invoked over SSH as `git-lfs-authenticate <repo> <operation> [oid]`. Asks
//! gitolite whether `$GL_USER` may read or write the repository and, if so,
//! prints a JSON response carrying a five-minute HS256 bearer token and the
//! LFS endpoint to use it against.

pub mod auth;
pub mod config;
pub mod error;
pub mod request;
pub mod response;

pub use auth::{
    AccessChecker, AccessError, AuthorityProbe, AuthorizationSource, Operation, Permission,
    SigningSecret, TokenClaims, TokenIssuer,
};
pub use config::Config;
pub use error::{AuthenticateError, ValidationError};
pub use request::{AuthorizationRequest, Invocation, ObjectId, RequestHandler};
pub use response::ResponseEnvelope;
