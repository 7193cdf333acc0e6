/*!
 * Permission Holder
 * Node storage shared by users and groups
 */

use super::types::{HolderId, HolderKind};
use crate::node::Node;
use crate::permissions::cache::CachedData;
use parking_lot::{Mutex, MutexGuard};
use std::sync::Arc;
use std::time::SystemTime;

/// Ordered node collection plus its cached views
///
/// The node mutex is the single critical section for read-modify-write
/// sequences (merge engine, sweeper). Readers take an `Arc` snapshot and
/// release the lock immediately.
pub struct PermissionHolder {
    id: HolderId,
    nodes: Mutex<Arc<Vec<Node>>>,
    cache: Arc<CachedData>,
}

impl PermissionHolder {
    pub(crate) fn with_nodes(id: HolderId, nodes: Vec<Node>) -> Self {
        Self {
            cache: Arc::new(CachedData::new(id.clone())),
            id,
            nodes: Mutex::new(Arc::new(nodes)),
        }
    }

    pub fn id(&self) -> &HolderId {
        &self.id
    }

    pub fn kind(&self) -> HolderKind {
        self.id.kind()
    }

    /// Consistent snapshot of the node list, insertion order preserved
    pub fn nodes(&self) -> Arc<Vec<Node>> {
        Arc::clone(&*self.nodes.lock())
    }

    /// Nodes still alive at `now`
    pub fn active_nodes(&self, now: SystemTime) -> Vec<Node> {
        self.nodes()
            .iter()
            .filter(|node| !node.is_expired_at(now))
            .cloned()
            .collect()
    }

    /// Exact-match lookup: equivalent node with the same value
    pub fn has_node(&self, node: &Node) -> bool {
        self.nodes().iter().any(|n| {
            n.equivalent_to(node)
                && n.value() == node.value()
                && n.is_temporary() == node.is_temporary()
        })
    }

    pub fn cache(&self) -> &Arc<CachedData> {
        &self.cache
    }

    pub(crate) fn lock_nodes(&self) -> MutexGuard<'_, Arc<Vec<Node>>> {
        self.nodes.lock()
    }

    /// Swap the whole node list (used when a record is reloaded)
    pub(crate) fn replace_nodes(&self, nodes: Vec<Node>) {
        *self.nodes.lock() = Arc::new(nodes);
    }
}

impl std::fmt::Debug for PermissionHolder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PermissionHolder")
            .field("id", &self.id)
            .field("nodes", &self.nodes().len())
            .finish()
    }
}
