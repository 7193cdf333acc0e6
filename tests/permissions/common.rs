/*!
 * Shared fixtures for permission tests
 */

use perms_kernel::{Config, HolderHandle, ImmutableContextSet, Node, PermissionManager};
use std::time::Duration;
use uuid::Uuid;

/// Config without implicit default groups
pub fn config() -> Config {
    Config {
        default_user_groups: Vec::new(),
        ..Config::default()
    }
}

pub fn manager() -> PermissionManager {
    PermissionManager::in_memory(config())
}

pub fn global() -> ImmutableContextSet {
    ImmutableContextSet::empty()
}

pub fn user(manager: &PermissionManager) -> HolderHandle {
    manager.get_or_create_user(Uuid::new_v4(), None).into()
}

pub fn group(manager: &PermissionManager, name: &str, weight: i32) -> HolderHandle {
    manager
        .create_group(name, weight)
        .expect("group should be created")
        .into()
}

pub fn permanent(key: &str) -> Node {
    Node::builder(key).build().expect("valid node")
}

pub fn temporary(key: &str, secs: u64) -> Node {
    Node::builder(key)
        .duration(Duration::from_secs(secs))
        .build()
        .expect("valid node")
}
