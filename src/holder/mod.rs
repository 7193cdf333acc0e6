/*!
 * Holder Module
 * Users, groups, and the node collections they own
 */

mod group;
mod holder;
mod manager;
mod types;
mod user;

pub use group::{validate_name, Group, GroupRef};
pub use holder::PermissionHolder;
pub use manager::{GroupManager, UserManager};
pub use types::{HolderId, HolderKind};
pub use user::User;

use std::sync::Arc;

/// Handle to any loaded holder
#[derive(Debug, Clone)]
pub enum HolderHandle {
    User(Arc<User>),
    Group(Arc<Group>),
}

impl HolderHandle {
    pub fn holder(&self) -> &PermissionHolder {
        match self {
            HolderHandle::User(user) => user.holder(),
            HolderHandle::Group(group) => group.holder(),
        }
    }

    pub fn id(&self) -> &HolderId {
        self.holder().id()
    }

    pub fn kind(&self) -> HolderKind {
        self.id().kind()
    }

    pub fn friendly_name(&self) -> String {
        match self {
            HolderHandle::User(user) => user.friendly_name(),
            HolderHandle::Group(group) => group.name().to_string(),
        }
    }

    pub fn as_group(&self) -> Option<&Arc<Group>> {
        match self {
            HolderHandle::Group(group) => Some(group),
            HolderHandle::User(_) => None,
        }
    }
}

impl From<Arc<User>> for HolderHandle {
    fn from(user: Arc<User>) -> Self {
        HolderHandle::User(user)
    }
}

impl From<Arc<Group>> for HolderHandle {
    fn from(group: Arc<Group>) -> Self {
        HolderHandle::Group(group)
    }
}
