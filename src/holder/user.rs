/*!
 * User
 */

use super::holder::PermissionHolder;
use super::types::HolderId;
use crate::node::Node;
use parking_lot::RwLock;
use uuid::Uuid;

/// Holder identified by a stable UUID
#[derive(Debug)]
pub struct User {
    holder: PermissionHolder,
    uuid: Uuid,
    name: RwLock<Option<String>>,
}

impl User {
    pub fn new(uuid: Uuid, name: Option<String>) -> Self {
        Self::with_nodes(uuid, name, Vec::new())
    }

    pub fn with_nodes(uuid: Uuid, name: Option<String>, nodes: Vec<Node>) -> Self {
        Self {
            holder: PermissionHolder::with_nodes(HolderId::User(uuid), nodes),
            uuid,
            name: RwLock::new(name),
        }
    }

    pub fn holder(&self) -> &PermissionHolder {
        &self.holder
    }

    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    /// Last known display name
    pub fn name(&self) -> Option<String> {
        self.name.read().clone()
    }

    pub fn set_name(&self, name: Option<String>) {
        *self.name.write() = name;
    }

    /// Display name, falling back to the uuid
    pub fn friendly_name(&self) -> String {
        self.name().unwrap_or_else(|| self.uuid.to_string())
    }
}
