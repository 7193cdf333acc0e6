/*!
 * Storage Traits
 * Persistent backend abstraction and the records it exchanges
 */

use crate::core::errors::StorageError;
use crate::core::types::Weight;
use crate::holder::HolderId;
use crate::node::Node;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use uuid::Uuid;

/// Boxed future returned by every storage call
pub type StorageFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StorageError>> + Send + 'a>>;

/// Stored group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct GroupRecord {
    pub name: String,
    pub weight: Weight,
    pub nodes: Vec<Node>,
}

/// Stored user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct UserRecord {
    pub uuid: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub nodes: Vec<Node>,
}

/// Snapshot handed to the persistence queue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum HolderRecord {
    User(UserRecord),
    Group(GroupRecord),
}

impl HolderRecord {
    pub fn id(&self) -> HolderId {
        match self {
            HolderRecord::User(user) => HolderId::User(user.uuid),
            HolderRecord::Group(group) => HolderId::group(&group.name),
        }
    }

    pub fn nodes(&self) -> &[Node] {
        match self {
            HolderRecord::User(user) => &user.nodes,
            HolderRecord::Group(group) => &group.nodes,
        }
    }
}

/// Persistent backend
///
/// Loads return `Ok(None)` for unknown holders. Implementations must accept
/// saves for the same holder in submission order.
pub trait Storage: Send + Sync {
    fn load_group(&self, name: &str) -> StorageFuture<'_, Option<GroupRecord>>;

    fn load_user(&self, uuid: Uuid) -> StorageFuture<'_, Option<UserRecord>>;

    fn save_holder(&self, record: HolderRecord) -> StorageFuture<'_, ()>;

    fn delete_group(&self, name: &str) -> StorageFuture<'_, ()>;
}
