//! Repository access checks against gitolite
//!
//! Two authorization sources are supported:
//! - `gitolite access -q <repo> <user> <perm>` (gitolite v3), selected whenever
//!   a `gitolite` binary is on the search path
//! - `perl -I$GL_BINDIR -Mgitolite -e "cli_repo_rights(...)"` (gitolite v2),
//!   used only when `gitolite` is missing and `GL_BINDIR` is set
//!
//! The source is chosen once, when the checker is built. Every check spawns a
//! fresh subprocess; results are never cached and failures are never retried.

use crate::auth::permission::Permission;
use async_trait::async_trait;
use std::ffi::OsString;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, warn};

/// gitolite v3 command
pub const GITOLITE_BINARY: &str = "gitolite";

/// Interpreter used for the gitolite v2 fallback
pub const PERL_BINARY: &str = "perl";

/// Exit status with which `gitolite access -q` reports a denial
pub const DENIED_EXIT_CODE: i32 = 1;

/// Suffix stripped from repository names before asking gitolite
const REPO_SUFFIX: &str = ".git";

#[derive(Debug, Error)]
pub enum AccessError {
    #[error("failed to check ACL (no gitolite command or GL_BINDIR)")]
    Unavailable,

    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("{program} failed ({status})")]
    Failed { program: String, status: ExitStatus },

    #[error("invalid output from cli_repo_rights: {0:?}")]
    InvalidOutput(String),
}

/// Something that can decide whether a user holds a permission on a repository
#[async_trait]
pub trait AuthorizationSource: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &'static str;

    /// `Ok(false)` is an explicit denial; `Err` means no decision could be made.
    async fn check(&self, repo: &str, user: &str, perm: Permission) -> Result<bool, AccessError>;
}

/// gitolite v3: `gitolite access -q`
#[derive(Debug, Clone)]
pub struct GitoliteSource {
    binary: PathBuf,
}

impl GitoliteSource {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self { binary: binary.into() }
    }
}

#[async_trait]
impl AuthorizationSource for GitoliteSource {
    fn name(&self) -> &'static str {
        "gitolite"
    }

    async fn check(&self, repo: &str, user: &str, perm: Permission) -> Result<bool, AccessError> {
        let output = Command::new(&self.binary)
            .args(["access", "-q", repo, user])
            .arg(perm.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|source| AccessError::Spawn {
                program: self.binary.display().to_string(),
                source,
            })?;

        match output.status.code() {
            Some(0) => Ok(true),
            Some(DENIED_EXIT_CODE) => Ok(false),
            _ => {
                warn!(
                    status = %output.status,
                    stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                    "gitolite access check failed"
                );
                Err(AccessError::Failed {
                    program: self.binary.display().to_string(),
                    status: output.status,
                })
            }
        }
    }
}

/// gitolite v2: ask the perl library for the rights string
///
/// The library reads the user from `GL_USER`, so the child gets it set to the
/// user being checked.
#[derive(Debug, Clone)]
pub struct LegacyGitoliteSource {
    perl: PathBuf,
    bindir: String,
}

impl LegacyGitoliteSource {
    pub fn new(perl: impl Into<PathBuf>, bindir: impl Into<String>) -> Self {
        Self {
            perl: perl.into(),
            bindir: bindir.into(),
        }
    }
}

#[async_trait]
impl AuthorizationSource for LegacyGitoliteSource {
    fn name(&self) -> &'static str {
        "gitolite-v2"
    }

    async fn check(&self, repo: &str, user: &str, perm: Permission) -> Result<bool, AccessError> {
        let output = Command::new(&self.perl)
            .arg(format!("-I{}", self.bindir))
            .arg("-Mgitolite")
            .arg("-e")
            .arg(format!("cli_repo_rights({})", perl_quote(repo)))
            .env("GL_USER", user)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|source| AccessError::Spawn {
                program: self.perl.display().to_string(),
                source,
            })?;

        if !output.status.success() {
            warn!(
                status = %output.status,
                stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                "cli_repo_rights failed"
            );
            return Err(AccessError::Failed {
                program: self.perl.display().to_string(),
                status: output.status,
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_rights(&stdout).map(|rights| perm.granted_by(rights))
    }
}

/// First whitespace-delimited token of `cli_repo_rights` output
fn parse_rights(output: &str) -> Result<&str, AccessError> {
    output
        .split_once(char::is_whitespace)
        .map(|(rights, _)| rights)
        .ok_or_else(|| AccessError::InvalidOutput(output.to_string()))
}

/// Single-quoted perl string literal
fn perl_quote(s: &str) -> String {
    let mut quoted = String::with_capacity(s.len() + 2);
    quoted.push('\'');
    for c in s.chars() {
        if c == '\\' || c == '\'' {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('\'');
    quoted
}

/// Strip the `.git` suffix; gitolite names repositories without it
pub fn normalize_repo(repo: &str) -> &str {
    repo.strip_suffix(REPO_SUFFIX).unwrap_or(repo)
}

/// Where to look for an authorization source
#[derive(Debug, Clone, Default)]
pub struct AuthorityProbe {
    search_path: Option<OsString>,
    legacy_bindir: Option<String>,
}

impl AuthorityProbe {
    /// `search_path` is a `PATH`-style list; `legacy_bindir` is the gitolite v2 library directory.
    pub fn new(search_path: Option<OsString>, legacy_bindir: Option<String>) -> Self {
        let legacy_bindir = legacy_bindir
            .map(|dir| dir.trim().to_string())
            .filter(|dir| !dir.is_empty());

        Self {
            search_path,
            legacy_bindir,
        }
    }

    pub fn from_env() -> Self {
        Self::new(std::env::var_os("PATH"), std::env::var("GL_BINDIR").ok())
    }

    fn find(&self, binary: &str) -> Option<PathBuf> {
        let paths = self.search_path.as_ref()?;
        let cwd = std::env::current_dir().unwrap_or_else(|_| Path::new("/").to_path_buf());
        which::which_in(binary, Some(paths), cwd).ok()
    }

    /// Pick gitolite v3 if present, otherwise the v2 fallback if configured.
    pub fn select(&self) -> Result<Arc<dyn AuthorizationSource>, AccessError> {
        if let Some(gitolite) = self.find(GITOLITE_BINARY) {
            debug!(path = %gitolite.display(), "using gitolite access");
            return Ok(Arc::new(GitoliteSource::new(gitolite)));
        }

        if let Some(bindir) = &self.legacy_bindir {
            if let Some(perl) = self.find(PERL_BINARY) {
                debug!(path = %perl.display(), bindir = %bindir, "using gitolite v2 fallback");
                return Ok(Arc::new(LegacyGitoliteSource::new(perl, bindir.clone())));
            }
        }

        Err(AccessError::Unavailable)
    }
}

/// Checks repository permissions through a single authorization source
#[derive(Clone)]
pub struct AccessChecker {
    source: Arc<dyn AuthorizationSource>,
}

impl AccessChecker {
    pub fn new(source: Arc<dyn AuthorizationSource>) -> Self {
        Self { source }
    }

    /// Build a checker from whatever source the probe finds
    pub fn detect(probe: &AuthorityProbe) -> Result<Self, AccessError> {
        probe.select().map(Self::new)
    }

    pub fn source_name(&self) -> &'static str {
        self.source.name()
    }

    pub async fn check(&self, repo: &str, user: &str, perm: Permission) -> Result<bool, AccessError> {
        let repo = normalize_repo(repo);
        debug!(source = self.source.name(), repo, user, perm = %perm, "checking access");
        self.source.check(repo, user, perm).await
    }
}

impl fmt::Debug for AccessChecker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessChecker")
            .field("source", &self.source.name())
            .finish()
    }
}
