//! Authenticated user identity as handed over by the auth layer.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identity of the user owning a connection.
///
/// The hub never validates identities; whatever the upstream authentication
/// layer verified is taken as-is. An empty identity marks an anonymous
/// connection: it receives broadcasts but is never indexed for targeted
/// sends.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Creates a user identity, trimming surrounding whitespace.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        let trimmed = id.trim();
        if trimmed.len() == id.len() {
            Self(id)
        } else {
            Self(trimmed.to_string())
        }
    }

    /// The anonymous (empty) identity.
    #[must_use]
    pub const fn anonymous() -> Self {
        Self(String::new())
    }

    /// Returns `true` for the empty identity.
    #[must_use]
    pub fn is_anonymous(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the identity as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for UserId {
    fn from(id: String) -> Self {
        Self::new(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_identity_is_anonymous() {
        assert!(UserId::new("   ").is_anonymous());
        assert!(UserId::anonymous().is_anonymous());
        assert!(UserId::default().is_anonymous());
    }

    #[test]
    fn identity_is_trimmed() {
        let id = UserId::new("  u1 ");
        assert_eq!(id.as_str(), "u1");
        assert!(!id.is_anonymous());
    }

    #[test]
    fn serializes_as_plain_string() {
        let json = serde_json::to_string(&UserId::from("u1")).unwrap_or_default();
        assert_eq!(json, "\"u1\"");
    }
}
