//! LFS credential issuance
//!
//! Credentials are HS256 JWTs carrying exactly four claims:
//! - `user`: gitolite user the credential was issued to
//! - `repo`: repository name as requested
//! - `op`: `upload` or `download`
//! - `exp`: expiry, seconds since the epoch (UTC)
//!
//! Every credential expires a fixed five minutes after issuance. There is no
//! renewal or revocation; the LFS server trusts signature and expiry alone.

use crate::auth::permission::Operation;
use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Lifetime of every issued credential, in seconds
pub const TOKEN_LIFETIME_SECS: i64 = 300;

/// Signing algorithm shared with the LFS server
pub const TOKEN_ALGORITHM: Algorithm = Algorithm::HS256;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("signing secret is empty")]
    EmptySecret,

    #[error("failed to sign token: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),

    #[error("token expired")]
    Expired,

    #[error("invalid token: {0}")]
    Invalid(#[source] jsonwebtoken::errors::Error),
}

/// Shared secret used to sign credentials
#[derive(Clone)]
pub struct SigningSecret {
    bytes: Vec<u8>,
}

impl SigningSecret {
    /// Wrap raw secret bytes. An empty secret is rejected.
    pub fn new(bytes: Vec<u8>) -> Result<Self, TokenError> {
        if bytes.is_empty() {
            return Err(TokenError::EmptySecret);
        }
        Ok(Self { bytes })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl fmt::Debug for SigningSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SigningSecret([REDACTED])")
    }
}

/// Claims carried by an issued credential
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    pub user: String,
    pub repo: String,
    pub op: Operation,
    /// Expiry as seconds since the epoch
    pub exp: i64,
}

impl TokenClaims {
    /// Build claims for a credential issued at `issued_at`
    pub fn new(user: &str, repo: &str, op: Operation, issued_at: DateTime<Utc>) -> Self {
        Self {
            user: user.to_string(),
            repo: repo.to_string(),
            op,
            exp: issued_at.timestamp() + TOKEN_LIFETIME_SECS,
        }
    }
}

/// A signed credential together with the claims it encodes
#[derive(Debug, Clone)]
pub struct IssuedCredential {
    token: String,
    claims: TokenClaims,
}

impl IssuedCredential {
    pub fn as_str(&self) -> &str {
        &self.token
    }

    pub fn claims(&self) -> &TokenClaims {
        &self.claims
    }
}

impl fmt::Display for IssuedCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.token)
    }
}

/// Signs credentials with the configured secret
#[derive(Debug, Clone)]
pub struct TokenIssuer {
    secret: SigningSecret,
}

impl TokenIssuer {
    pub fn new(secret: SigningSecret) -> Self {
        Self { secret }
    }

    /// Issue a credential valid for [`TOKEN_LIFETIME_SECS`] from now
    pub fn issue(
        &self,
        user: &str,
        repo: &str,
        op: Operation,
    ) -> Result<IssuedCredential, TokenError> {
        self.issue_at(Utc::now(), user, repo, op)
    }

    /// Issue a credential as if it were issued at `issued_at`
    pub fn issue_at(
        &self,
        issued_at: DateTime<Utc>,
        user: &str,
        repo: &str,
        op: Operation,
    ) -> Result<IssuedCredential, TokenError> {
        let claims = TokenClaims::new(user, repo, op, issued_at);
        let key = EncodingKey::from_secret(self.secret.as_bytes());
        let token = jsonwebtoken::encode(&Header::new(TOKEN_ALGORITHM), &claims, &key)
            .map_err(TokenError::Signing)?;

        Ok(IssuedCredential { token, claims })
    }
}

/// Verify a credential's signature and expiry, returning its claims
pub fn verify_credential(token: &str, secret: &SigningSecret) -> Result<TokenClaims, TokenError> {
    let mut validation = Validation::new(TOKEN_ALGORITHM);
    validation.leeway = 0;
    validation.set_required_spec_claims(&["exp"]);

    let key = DecodingKey::from_secret(secret.as_bytes());
    jsonwebtoken::decode::<TokenClaims>(token, &key, &validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Invalid(e),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
    use chrono::TimeDelta;

    const TEST_SECRET: &[u8] = b"test-secret-key-for-signing";

    fn issuer() -> TokenIssuer {
        TokenIssuer::new(SigningSecret::new(TEST_SECRET.to_vec()).unwrap())
    }

    fn secret() -> SigningSecret {
        SigningSecret::new(TEST_SECRET.to_vec()).unwrap()
    }

    #[test]
    fn test_empty_secret_rejected() {
        assert!(matches!(SigningSecret::new(Vec::new()), Err(TokenError::EmptySecret)));
    }

    #[test]
    fn test_secret_debug_redacted() {
        let debug = format!("{:?}", secret());
        assert_eq!(debug, "SigningSecret([REDACTED])");
        assert!(!debug.contains("test-secret"));
    }

    #[test]
    fn test_issue_expiry_is_five_minutes() {
        let now = Utc::now();
        let cred = issuer().issue_at(now, "alice", "team/app.git", Operation::Download).unwrap();

        assert_eq!(cred.claims().exp, now.timestamp() + 300);

        let claims = verify_credential(cred.as_str(), &secret()).unwrap();
        assert_eq!(claims.user, "alice");
        assert_eq!(claims.repo, "team/app.git");
        assert_eq!(claims.op, Operation::Download);
        assert_eq!(claims.exp, now.timestamp() + 300);
    }

    #[test]
    fn test_payload_has_exact_claim_set() {
        let cred = issuer().issue("bob", "team/app", Operation::Upload).unwrap();

        let parts: Vec<&str> = cred.as_str().split('.').collect();
        assert_eq!(parts.len(), 3);

        let payload = URL_SAFE_NO_PAD.decode(parts[1]).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&payload).unwrap();
        let obj = value.as_object().unwrap();

        let mut keys: Vec<&str> = obj.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(keys, vec!["exp", "op", "repo", "user"]);
        assert_eq!(obj["op"], "upload");
        assert!(obj["exp"].is_i64());
    }

    #[test]
    fn test_header_is_hs256() {
        let cred = issuer().issue("bob", "team/app", Operation::Upload).unwrap();
        let header = jsonwebtoken::decode_header(cred.as_str()).unwrap();
        assert_eq!(header.alg, Algorithm::HS256);
    }

    #[test]
    fn test_different_instants_yield_different_tokens() {
        let now = Utc::now();
        let later = now + TimeDelta::seconds(30);

        let first = issuer().issue_at(now, "alice", "repo", Operation::Download).unwrap();
        let second = issuer().issue_at(later, "alice", "repo", Operation::Download).unwrap();

        assert_ne!(first.as_str(), second.as_str());
        assert_eq!(verify_credential(first.as_str(), &secret()).unwrap().exp, now.timestamp() + 300);
        assert_eq!(
            verify_credential(second.as_str(), &secret()).unwrap().exp,
            later.timestamp() + 300
        );
    }

    #[test]
    fn test_verify_wrong_secret() {
        let cred = issuer().issue("alice", "repo", Operation::Download).unwrap();
        let other = SigningSecret::new(b"wrong-secret".to_vec()).unwrap();

        let result = verify_credential(cred.as_str(), &other);
        assert!(matches!(result, Err(TokenError::Invalid(_))));
    }

    #[test]
    fn test_verify_expired() {
        let issued = Utc::now() - TimeDelta::minutes(10);
        let cred = issuer().issue_at(issued, "alice", "repo", Operation::Download).unwrap();

        let result = verify_credential(cred.as_str(), &secret());
        assert!(matches!(result, Err(TokenError::Expired)));
    }

    #[test]
    fn test_verify_garbage() {
        let result = verify_credential("not-a-token", &secret());
        assert!(matches!(result, Err(TokenError::Invalid(_))));
    }
}
