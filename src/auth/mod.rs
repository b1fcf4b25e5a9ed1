//! Authorization and credential issuance
//!
//! - `access`: asks gitolite whether a user holds a permission on a repository
//! - `permission`: LFS operations and the `R`/`W` permissions they map to
//! - `tokens`: short-lived HS256 credentials for the LFS server

mod access;
mod permission;
mod tokens;

pub use access::{
    normalize_repo, AccessChecker, AccessError, AuthorityProbe, AuthorizationSource,
    GitoliteSource, LegacyGitoliteSource, DENIED_EXIT_CODE, GITOLITE_BINARY, PERL_BINARY,
};
pub use permission::{Operation, Permission};
pub use tokens::{
    verify_credential, IssuedCredential, SigningSecret, TokenClaims, TokenError, TokenIssuer,
    TOKEN_ALGORITHM, TOKEN_LIFETIME_SECS,
};
