//! Permission roles
//!
//! Four totally ordered levels. A gated operation names the lowest role
//! allowed to perform it; callers without a user count as `viewer`.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Viewer,
    Recognizer,
    Admin,
    Root,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Viewer => "viewer",
            Role::Recognizer => "recognizer",
            Role::Admin => "admin",
            Role::Root => "root",
        }
    }

    /// True when this role is at or above `required`
    pub fn permits(self, required: Role) -> bool {
        self >= required
    }
}

impl Default for Role {
    fn default() -> Self {
        Role::Viewer
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "viewer" => Ok(Role::Viewer),
            "recognizer" => Ok(Role::Recognizer),
            "admin" => Ok(Role::Admin),
            "root" => Ok(Role::Root),
            other => Err(Error::InvalidInput(format!("Unknown role: {}", other))),
        }
    }
}

/// Permission check against the current role, `None` meaning no user
pub fn has_permission(current: Option<Role>, required: Role) -> bool {
    current.unwrap_or_default().permits(required)
}
