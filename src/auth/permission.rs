//! LFS operations and the gitolite permissions they require

use serde::{Deserialize, Serialize};
use std::fmt;

/// Operation requested by the Git LFS client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    /// Fetch objects from the LFS server
    Download,
    /// Push objects to the LFS server
    Upload,
}

impl Operation {
    /// Parse the operation argument. Only the exact lowercase names are accepted.
    pub fn parse(s: &str) -> Option<Operation> {
        match s {
            "download" => Some(Operation::Download),
            "upload" => Some(Operation::Upload),
            _ => None,
        }
    }

    /// Permission the operation needs on the repository
    pub fn permission(self) -> Permission {
        match self {
            Operation::Download => Permission::Read,
            Operation::Upload => Permission::Write,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Download => "download",
            Operation::Upload => "upload",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Repository permission as understood by gitolite
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    Read,
    Write,
}

impl Permission {
    /// Single-letter form used on gitolite command lines and in rights strings
    pub fn letter(self) -> char {
        match self {
            Permission::Read => 'R',
            Permission::Write => 'W',
        }
    }

    /// Check whether a gitolite rights string (e.g. `RW+`) contains this permission
    pub fn granted_by(self, rights: &str) -> bool {
        rights.contains(self.letter())
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_parse() {
        assert_eq!(Operation::parse("download"), Some(Operation::Download));
        assert_eq!(Operation::parse("upload"), Some(Operation::Upload));
        assert_eq!(Operation::parse("UPLOAD"), None);
        assert_eq!(Operation::parse("delete"), None);
        assert_eq!(Operation::parse(""), None);
    }

    #[test]
    fn test_operation_permission() {
        assert_eq!(Operation::Download.permission(), Permission::Read);
        assert_eq!(Operation::Upload.permission(), Permission::Write);
    }

    #[test]
    fn test_permission_letters() {
        assert_eq!(Permission::Read.to_string(), "R");
        assert_eq!(Permission::Write.to_string(), "W");
    }

    #[test]
    fn test_granted_by() {
        assert!(Permission::Read.granted_by("R"));
        assert!(Permission::Read.granted_by("RW+"));
        assert!(Permission::Write.granted_by("RW"));
        assert!(!Permission::Write.granted_by("R"));
        assert!(!Permission::Read.granted_by(""));
    }

    #[test]
    fn test_operation_serde_lowercase() {
        assert_eq!(serde_json::to_string(&Operation::Upload).unwrap(), "\"upload\"");
        let op: Operation = serde_json::from_str("\"download\"").unwrap();
        assert_eq!(op, Operation::Download);
    }
}
