//! Signing configuration
//!
//! Read from `~/.git-lfs-authenticate`, a JSON object shared with the LFS server:
//!
//! ```json
//! { "secret": "<base64 HMAC key>", "href": "https://lfs.example.com/team/app" }
//! ```

use crate::auth::{SigningSecret, TokenError};
use base64::{engine::general_purpose::STANDARD, Engine};
use serde::Deserialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// File name of the configuration, relative to the home directory
pub const CONFIG_FILE_NAME: &str = ".git-lfs-authenticate";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not determine home directory")]
    NoHomeDir,

    #[error("failed to open config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to decode config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to decode secret key: {0}")]
    SecretEncoding(#[from] base64::DecodeError),

    #[error("failed to decode secret key: {0}")]
    Secret(#[from] TokenError),
}

/// Contents of the configuration file
#[derive(Clone, Deserialize)]
pub struct Config {
    /// Base64 (standard alphabet) encoded signing secret
    #[serde(alias = "Secret")]
    secret: String,

    /// LFS endpoint handed back to the client
    #[serde(default, alias = "HRef", alias = "Href")]
    pub href: String,
}

impl Config {
    /// `~/.git-lfs-authenticate`
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        directories::BaseDirs::new()
            .map(|dirs| dirs.home_dir().join(CONFIG_FILE_NAME))
            .ok_or(ConfigError::NoHomeDir)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config = Self::from_slice(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        debug!(path = %path.display(), href = %config.href, "loaded config");
        Ok(config)
    }

    pub fn from_slice(contents: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(contents)
    }

    /// Decode the signing secret from its base64 storage form
    pub fn signing_secret(&self) -> Result<SigningSecret, ConfigError> {
        let bytes = STANDARD.decode(self.secret.trim())?;
        Ok(SigningSecret::new(bytes)?)
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("secret", &"[REDACTED]")
            .field("href", &self.href)
            .finish()
    }
}
