use std::fmt;

use serde::{Deserialize, Serialize};

/// Login name of a user on the host platform.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(uid: impl Into<String>) -> Self {
        Self(uid.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for UserId {
    fn from(uid: &str) -> Self {
        Self(uid.to_string())
    }
}

impl From<String> for UserId {
    fn from(uid: String) -> Self {
        Self(uid)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Human-readable expansion of a [`UserId`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    pub uid: UserId,
    pub display_name: String,
}

impl UserInfo {
    /// Placeholder for a uid the directory does not know.
    pub fn unknown(uid: &UserId) -> Self {
        Self {
            uid: uid.clone(),
            display_name: uid.to_string(),
        }
    }
}

/// Input for registering a user in the directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUserInput {
    pub uid: UserId,
    pub display_name: Option<String>,
}
