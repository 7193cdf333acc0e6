/*!
 * Holder Managers
 * Registries of loaded users and groups
 */

use super::group::{validate_name, Group};
use super::user::User;
use crate::core::errors::HolderError;
use crate::core::types::Weight;
use crate::node::Node;
use ahash::RandomState;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use log::{debug, info};
use std::sync::Arc;
use uuid::Uuid;

/// Loaded groups keyed by lowercased name
#[derive(Clone, Default)]
pub struct GroupManager {
    groups: Arc<DashMap<String, Arc<Group>, RandomState>>,
}

impl GroupManager {
    pub fn new() -> Self {
        Self {
            groups: Arc::new(DashMap::with_hasher(RandomState::new())),
        }
    }

    /// Create a new group; fails if the name is taken
    pub fn create(&self, name: &str, weight: Weight) -> Result<Arc<Group>, HolderError> {
        let key = validate_name(name)?;
        match self.groups.entry(key.clone()) {
            Entry::Occupied(_) => Err(HolderError::GroupExists(key)),
            Entry::Vacant(slot) => {
                let group = Arc::new(Group::with_nodes(&key, weight, Vec::new())?);
                slot.insert(Arc::clone(&group));
                info!("Created group {} (weight {})", key, weight);
                Ok(group)
            }
        }
    }

    /// Insert or refresh a group from a stored record
    ///
    /// An already loaded group keeps its identity (and dependents) and has its
    /// nodes and weight replaced in place. Returns the group and whether it
    /// existed before.
    pub(crate) fn install(
        &self,
        name: &str,
        weight: Weight,
        nodes: Vec<Node>,
    ) -> Result<(Arc<Group>, bool), HolderError> {
        let key = validate_name(name)?;
        match self.groups.entry(key.clone()) {
            Entry::Occupied(slot) => {
                let group = Arc::clone(slot.get());
                group.store_weight(weight);
                group.holder().replace_nodes(nodes);
                debug!("Reloaded group {}", key);
                Ok((group, true))
            }
            Entry::Vacant(slot) => {
                let group = Arc::new(Group::with_nodes(&key, weight, nodes)?);
                slot.insert(Arc::clone(&group));
                debug!("Loaded group {}", key);
                Ok((group, false))
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<Group>> {
        self.groups
            .get(&name.trim().to_lowercase())
            .map(|entry| Arc::clone(entry.value()))
    }

    pub fn is_loaded(&self, name: &str) -> bool {
        self.groups.contains_key(&name.trim().to_lowercase())
    }

    pub(crate) fn remove(&self, name: &str) -> Option<Arc<Group>> {
        self.groups
            .remove(&name.trim().to_lowercase())
            .map(|(_, group)| group)
    }

    pub fn all(&self) -> Vec<Arc<Group>> {
        self.groups
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Loaded users keyed by uuid
#[derive(Clone, Default)]
pub struct UserManager {
    users: Arc<DashMap<Uuid, Arc<User>, RandomState>>,
}

impl UserManager {
    pub fn new() -> Self {
        Self {
            users: Arc::new(DashMap::with_hasher(RandomState::new())),
        }
    }

    /// Fetch a loaded user or create an empty one; refreshes the display name
    pub fn get_or_create(&self, uuid: Uuid, name: Option<String>) -> Arc<User> {
        let user = self
            .users
            .entry(uuid)
            .or_insert_with(|| {
                debug!("Created user {}", uuid);
                Arc::new(User::new(uuid, None))
            })
            .value()
            .clone();
        if name.is_some() {
            user.set_name(name);
        }
        user
    }

    /// Insert or refresh a user from a stored record
    pub(crate) fn install(
        &self,
        uuid: Uuid,
        name: Option<String>,
        nodes: Vec<Node>,
    ) -> (Arc<User>, bool) {
        match self.users.entry(uuid) {
            Entry::Occupied(slot) => {
                let user = Arc::clone(slot.get());
                if name.is_some() {
                    user.set_name(name);
                }
                user.holder().replace_nodes(nodes);
                (user, true)
            }
            Entry::Vacant(slot) => {
                let user = Arc::new(User::with_nodes(uuid, name, nodes));
                slot.insert(Arc::clone(&user));
                (user, false)
            }
        }
    }

    pub fn get(&self, uuid: Uuid) -> Option<Arc<User>> {
        self.users.get(&uuid).map(|entry| Arc::clone(entry.value()))
    }

    pub fn is_loaded(&self, uuid: Uuid) -> bool {
        self.users.contains_key(&uuid)
    }

    pub(crate) fn remove(&self, uuid: Uuid) -> Option<Arc<User>> {
        self.users.remove(&uuid).map(|(_, user)| user)
    }

    pub fn all(&self) -> Vec<Arc<User>> {
        self.users
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}
