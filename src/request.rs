//! Request validation and the authenticate pipeline
//!
//! A request runs strictly in order: load config, decode the secret, validate
//! repo / operation / OID, resolve the user, ask gitolite, sign, respond. The
//! first failure ends the request.

use crate::auth::{
    AccessChecker, AuthorityProbe, AuthorizationSource, Operation, Permission, SigningSecret,
    TokenIssuer,
};
use crate::config::Config;
use crate::error::{AuthenticateError, Result, ValidationError};
use crate::response::ResponseEnvelope;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Length in bytes of an LFS object id (SHA-256)
pub const OID_LEN: usize = 32;

/// LFS object id; format-checked only, never looked up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectId([u8; OID_LEN]);

impl ObjectId {
    pub fn parse(s: &str) -> Option<Self> {
        let bytes = hex::decode(s).ok()?;
        let bytes: [u8; OID_LEN] = bytes.try_into().ok()?;
        Some(Self(bytes))
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

/// Raw invocation inputs, as received from the command line and environment
#[derive(Debug, Clone, Default)]
pub struct Invocation {
    pub repo: String,
    pub operation: String,
    pub oid: Option<String>,
    pub user: Option<String>,
}

/// A validated request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationRequest {
    pub repo: String,
    pub user: String,
    pub operation: Operation,
    pub oid: Option<ObjectId>,
}

impl AuthorizationRequest {
    /// Validate repo, operation, OID and user, in that order
    pub fn from_invocation(inv: &Invocation) -> Result<Self> {
        let repo = inv.repo.trim();
        if repo.is_empty() {
            return Err(ValidationError::InvalidRepo(repo.to_string()).into());
        }

        let operation = Operation::parse(inv.operation.trim())
            .ok_or_else(|| ValidationError::InvalidOperation(inv.operation.clone()))?;

        let oid = match inv.oid.as_deref() {
            Some(oid) => Some(
                ObjectId::parse(oid).ok_or_else(|| ValidationError::InvalidOid(oid.to_string()))?,
            ),
            None => None,
        };

        let user = inv
            .user
            .as_deref()
            .map(str::trim)
            .filter(|user| !user.is_empty())
            .ok_or(AuthenticateError::MissingIdentity)?;

        Ok(Self {
            repo: repo.to_string(),
            user: user.to_string(),
            operation,
            oid,
        })
    }

    pub fn permission(&self) -> Permission {
        self.operation.permission()
    }
}

enum Authority {
    Probe(AuthorityProbe),
    Source(Arc<dyn AuthorizationSource>),
}

/// Runs one authenticate request end to end
pub struct RequestHandler {
    config_path: PathBuf,
    authority: Authority,
}

impl RequestHandler {
    /// Handler that discovers gitolite through `probe` at check time
    pub fn new(config_path: impl Into<PathBuf>, probe: AuthorityProbe) -> Self {
        Self {
            config_path: config_path.into(),
            authority: Authority::Probe(probe),
        }
    }

    /// Use a fixed authorization source instead of probing
    pub fn with_source(mut self, source: Arc<dyn AuthorizationSource>) -> Self {
        self.authority = Authority::Source(source);
        self
    }

    pub async fn handle(&self, inv: &Invocation) -> Result<ResponseEnvelope> {
        let config = Config::load(&self.config_path)?;
        let secret = config.signing_secret()?;

        let request = AuthorizationRequest::from_invocation(inv)?;
        debug!(
            user = %request.user,
            repo = %request.repo,
            op = %request.operation,
            oid = ?request.oid.map(|oid| oid.to_string()),
            "validated request"
        );

        self.authorize(&request).await?;

        self.respond(&request, secret, config.href)
    }

    async fn authorize(&self, request: &AuthorizationRequest) -> Result<()> {
        let checker = match &self.authority {
            Authority::Probe(probe) => AccessChecker::detect(probe)?,
            Authority::Source(source) => AccessChecker::new(source.clone()),
        };

        let allowed = checker
            .check(&request.repo, &request.user, request.permission())
            .await?;

        if !allowed {
            warn!(
                user = %request.user,
                repo = %request.repo,
                perm = %request.permission(),
                "access denied"
            );
            return Err(AuthenticateError::AccessDenied);
        }

        Ok(())
    }

    fn respond(
        &self,
        request: &AuthorizationRequest,
        secret: SigningSecret,
        href: String,
    ) -> Result<ResponseEnvelope> {
        let credential =
            TokenIssuer::new(secret).issue(&request.user, &request.repo, request.operation)?;

        info!(
            user = %request.user,
            repo = %request.repo,
            op = %request.operation,
            exp = credential.claims().exp,
            "issued LFS credential"
        );

        Ok(ResponseEnvelope::bearer(credential.as_str(), href))
    }
}

impl fmt::Debug for RequestHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let authority = match &self.authority {
            Authority::Probe(probe) => format!("{:?}", probe),
            Authority::Source(source) => source.name().to_string(),
        };
        f.debug_struct("RequestHandler")
            .field("config_path", &self.config_path)
            .field("authority", &authority)
            .finish()
    }
}
