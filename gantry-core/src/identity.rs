//! Executor identity
//!
//! `Kind` selects an executor implementation (e.g. `SCHEDULER`, `K8SFLINK`),
//! `Name` selects one configured instance of that kind, so the same backend
//! can be registered once per cluster. Both are validated on construction;
//! the registry refuses anything that slipped past (e.g. via deserialization).

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;
use thiserror::Error;

static IDENTITY_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z0-9]+$").expect("hard-coded pattern"));

/// Errors from constructing executor identity values
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdentityError {
    #[error("invalid executor kind {0:?}, must match ^[A-Z0-9]+$")]
    InvalidKind(String),

    #[error("invalid executor name {0:?}, must match ^[A-Z0-9]+$")]
    InvalidName(String),
}

/// Executor implementation identifier
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Kind(String);

impl Kind {
    pub fn new(value: impl Into<String>) -> Result<Self, IdentityError> {
        let value = value.into();
        if !IDENTITY_PATTERN.is_match(&value) {
            return Err(IdentityError::InvalidKind(value));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Kind {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Configured-instance identifier for an executor kind
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Name(String);

impl Name {
    pub fn new(value: impl Into<String>) -> Result<Self, IdentityError> {
        let value = value.into();
        if !IDENTITY_PATTERN.is_match(&value) {
            return Err(IdentityError::InvalidName(value));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Name {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_identities() {
        assert!(Kind::new("SCHEDULER").is_ok());
        assert!(Kind::new("K8SFLINK").is_ok());
        assert!(Kind::new("A1B2C3").is_ok());
        assert!(Name::new("TERMINUSDEV").is_ok());
    }

    #[test]
    fn test_invalid_identities_rejected() {
        assert_eq!(
            Kind::new("k8sflink"),
            Err(IdentityError::InvalidKind("k8sflink".to_string()))
        );
        assert!(Kind::new("").is_err());
        assert!(Kind::new("SCHED-ULER").is_err());
        assert!(Kind::new("SCHED ULER").is_err());
        assert!(Name::new("name_with_underscores").is_err());
    }

    #[test]
    fn test_serde_transparent() {
        let kind = Kind::new("WAIT").unwrap();
        assert_eq!(serde_json::to_string(&kind).unwrap(), "\"WAIT\"");

        let parsed: Kind = serde_json::from_str("\"MEMORY\"").unwrap();
        assert_eq!(parsed.as_str(), "MEMORY");
    }
}
