//! Response written to stdout for the Git LFS client

use serde::Serialize;
use std::collections::BTreeMap;

/// `{"header": {"Authorization": "Bearer <token>"}, "href": "<endpoint>"}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResponseEnvelope {
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub header: BTreeMap<String, String>,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub href: String,
}

impl ResponseEnvelope {
    /// Envelope carrying `token` as a bearer credential for `href`
    pub fn bearer(token: &str, href: impl Into<String>) -> Self {
        let mut header = BTreeMap::new();
        header.insert("Authorization".to_string(), format!("Bearer {}", token));

        Self {
            header,
            href: href.into(),
        }
    }

    /// Serialize as a single JSON line, newline terminated
    pub fn to_json_line(&self) -> Result<String, serde_json::Error> {
        let mut line = serde_json::to_string(self)?;
        line.push('\n');
        Ok(line)
    }
}
