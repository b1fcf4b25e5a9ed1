//! CLI argument definitions

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "git-lfs-authenticate")]
#[command(about = "Issue a short-lived Git LFS token for a gitolite repository", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Repository name (a trailing .git is allowed)
    pub repo: String,

    /// LFS operation: upload or download
    pub operation: String,

    /// Object id (64 hex characters)
    pub oid: Option<String>,
}

/// Inputs taken from the environment only. They are never accepted as flags,
/// since the arguments come from the SSH client. `GL_BINDIR` and `PATH` are
/// read by `AuthorityProbe::from_env`.
#[derive(Debug, Default)]
pub struct Environment {
    /// Authenticated gitolite user (`GL_USER`)
    pub user: Option<String>,
    /// Config file override (`GIT_LFS_AUTHENTICATE_CONFIG`)
    pub config: Option<PathBuf>,
}

impl Environment {
    pub fn from_env() -> Self {
        Self {
            user: std::env::var("GL_USER").ok(),
            config: std::env::var_os("GIT_LFS_AUTHENTICATE_CONFIG")
                .filter(|path| !path.is_empty())
                .map(PathBuf::from),
        }
    }
}
