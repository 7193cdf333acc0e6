/*!
 * Holder Types
 */

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Which kind of holder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HolderKind {
    User,
    Group,
}

/// Stable identity of a holder
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "id")]
pub enum HolderId {
    User(Uuid),
    /// Lowercased group name
    Group(String),
}

impl HolderId {
    pub fn group(name: &str) -> Self {
        HolderId::Group(name.trim().to_lowercase())
    }

    pub fn kind(&self) -> HolderKind {
        match self {
            HolderId::User(_) => HolderKind::User,
            HolderId::Group(_) => HolderKind::Group,
        }
    }

    pub fn group_name(&self) -> Option<&str> {
        match self {
            HolderId::Group(name) => Some(name),
            HolderId::User(_) => None,
        }
    }
}

impl fmt::Display for HolderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HolderId::User(uuid) => write!(f, "user:{}", uuid),
            HolderId::Group(name) => write!(f, "group:{}", name),
        }
    }
}
