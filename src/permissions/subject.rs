/*!
 * Subject
 * Platform-facing capability handle over one holder
 */

use super::manager::PermissionManager;
use super::types::PermissionSource;
use crate::context::ImmutableContextSet;
use crate::core::types::Tristate;
use crate::holder::{GroupRef, HolderHandle};

/// A holder bound to the manager that answers for it
#[derive(Debug, Clone)]
pub struct Subject {
    manager: PermissionManager,
    holder: HolderHandle,
}

impl Subject {
    pub fn new(manager: PermissionManager, holder: HolderHandle) -> Self {
        Self { manager, holder }
    }

    pub fn holder(&self) -> &HolderHandle {
        &self.holder
    }

    pub fn manager(&self) -> &PermissionManager {
        &self.manager
    }
}

impl PermissionSource for Subject {
    fn permission_value(&self, context: &ImmutableContextSet, permission: &str) -> Tristate {
        self.manager
            .get_permission_value(&self.holder, context, permission)
    }

    fn parents(&self, context: &ImmutableContextSet) -> Vec<GroupRef> {
        self.manager.parents(&self.holder, context)
    }

    fn option(&self, context: &ImmutableContextSet, key: &str) -> Option<String> {
        self.manager.get_option(&self.holder, context, key)
    }

    fn is_child_of(&self, context: &ImmutableContextSet, group: &str) -> bool {
        self.manager.is_child_of(&self.holder, context, group)
    }

    fn invalidate_caches(&self) {
        self.manager.invalidate_caches(&self.holder);
    }
}
