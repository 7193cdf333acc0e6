/*!
 * Holder Lifecycle
 * Group administration, loading from storage, unloading, and expiry sweeps
 */

use super::manager::PermissionManager;
use crate::core::errors::{HolderError, StorageError};
use crate::core::types::{KernelResult, Weight};
use crate::holder::{Group, HolderHandle, User};
use crate::permissions::audit::INTERNAL_ACTOR;
use crate::permissions::merge;
use crate::permissions::types::SweepReport;
use crate::storage::PendingSave;
use futures::future::try_join_all;
use std::sync::Arc;
use std::time::SystemTime;
use tracing::{debug, info};
use uuid::Uuid;

impl PermissionManager {
    /// Create an empty group and persist it
    pub fn create_group(&self, name: &str, weight: Weight) -> Result<Arc<Group>, HolderError> {
        let group = self.groups.create(name, weight)?;
        let handle = HolderHandle::from(Arc::clone(&group));
        {
            let nodes = group.holder().lock_nodes();
            self.enqueue_save(&handle, &nodes);
        }

        // Holders may already reference the name without having registered on it
        self.bump_topology();
        self.invalidate_all();
        self.record_audit(INTERNAL_ACTOR, &handle, "create", vec![weight.to_string()]);
        Ok(group)
    }

    /// Remove a group; references to it then resolve to nothing
    pub fn delete_group(&self, name: &str) -> Result<Option<PendingSave>, HolderError> {
        let group = self
            .groups
            .remove(name)
            .ok_or_else(|| HolderError::GroupNotFound(name.trim().to_lowercase()))?;
        let handle = HolderHandle::from(Arc::clone(&group));

        self.bump_topology();
        let invalidated = self.invalidate_caches(&handle);
        self.registry.forget_group(group.name());
        for parent in group.holder().cache().take_dependencies() {
            self.registry.unregister(&parent, handle.id());
        }

        // Queued under the node lock so it lands after any in-flight save
        let save = {
            let _nodes = group.holder().lock_nodes();
            self.persistence
                .as_ref()
                .map(|queue| queue.enqueue_delete(group.name()))
        };
        self.record_audit(INTERNAL_ACTOR, &handle, "delete", Vec::new());
        info!(group = group.name(), invalidated, "Deleted group");
        Ok(save)
    }

    /// Change a group's weight; dependents see the new parent order
    pub fn set_group_weight(
        &self,
        name: &str,
        weight: Weight,
    ) -> Result<Option<PendingSave>, HolderError> {
        let group = self
            .groups
            .get(name)
            .ok_or_else(|| HolderError::GroupNotFound(name.trim().to_lowercase()))?;
        let handle = HolderHandle::from(Arc::clone(&group));

        let save = {
            let nodes = group.holder().lock_nodes();
            if group.weight() == weight {
                return Ok(None);
            }
            group.store_weight(weight);
            self.enqueue_save(&handle, &nodes)
        };

        self.bump_topology();
        self.invalidate_caches(&handle);
        self.record_audit(INTERNAL_ACTOR, &handle, "setweight", vec![weight.to_string()]);
        Ok(save)
    }

    /// Fetch a group from storage and install it
    ///
    /// Returns None when storage has no record. A group that was already
    /// loaded keeps its identity and has its nodes replaced.
    pub async fn load_group(&self, name: &str) -> KernelResult<Option<Arc<Group>>> {
        let storage = self.require_storage()?;
        let Some(record) = storage.load_group(name).await? else {
            debug!(group = name, "No stored group");
            return Ok(None);
        };

        let (group, existed) = self
            .groups
            .install(&record.name, record.weight, record.nodes)?;
        self.bump_topology();
        if existed {
            self.invalidate_caches(&HolderHandle::from(Arc::clone(&group)));
        } else {
            self.invalidate_all();
        }
        debug!(group = group.name(), existed, "Loaded group");
        Ok(Some(group))
    }

    /// Load several groups concurrently, skipping names storage does not know
    pub async fn load_groups<S: AsRef<str>>(&self, names: &[S]) -> KernelResult<Vec<Arc<Group>>> {
        let loads = names.iter().map(|name| self.load_group(name.as_ref()));
        let loaded = try_join_all(loads).await?;
        Ok(loaded.into_iter().flatten().collect())
    }

    /// Fetch a user from storage, creating an empty one when unknown
    pub async fn load_user(&self, uuid: Uuid, name: Option<String>) -> KernelResult<Arc<User>> {
        let storage = self.require_storage()?;
        let user = match storage.load_user(uuid).await? {
            Some(record) => {
                let name = name.or(record.name);
                let (user, _) = self.users.install(uuid, name, record.nodes);
                user
            }
            None => self.users.get_or_create(uuid, name),
        };

        user.holder().cache().invalidate();
        debug!(%uuid, "Loaded user");
        Ok(user)
    }

    /// Loaded user or a fresh empty one
    pub fn get_or_create_user(&self, uuid: Uuid, name: Option<String>) -> Arc<User> {
        self.users.get_or_create(uuid, name)
    }

    /// Drop a user from memory along with its registrations
    pub fn unload_user(&self, uuid: Uuid) -> bool {
        let Some(user) = self.users.remove(uuid) else {
            return false;
        };
        let id = user.holder().id().clone();
        for group in user.holder().cache().take_dependencies() {
            self.registry.unregister(&group, &id);
        }
        user.holder().cache().invalidate();
        debug!(%uuid, "Unloaded user");
        true
    }

    /// Remove nodes whose expiry has passed at `now` from every loaded holder
    pub fn sweep_expired(&self, now: SystemTime) -> SweepReport {
        let holders = self
            .users
            .all()
            .into_iter()
            .map(HolderHandle::from)
            .chain(self.groups.all().into_iter().map(HolderHandle::from));

        let mut report = SweepReport::default();
        for holder in holders {
            report.merge(self.sweep_holder(&holder, now));
        }

        if report.nodes_removed > 0 {
            info!(
                holders = report.holders_changed,
                nodes = report.nodes_removed,
                "Swept expired nodes"
            );
        }
        report
    }

    fn sweep_holder(&self, holder: &HolderHandle, now: SystemTime) -> SweepReport {
        let removed = {
            let mut nodes = holder.holder().lock_nodes();
            match merge::remove_expired(&nodes, now) {
                Some((remaining, removed)) => {
                    *nodes = Arc::new(remaining);
                    self.enqueue_save(holder, &nodes);
                    removed
                }
                None => 0,
            }
        };

        if removed > 0 {
            self.invalidate_caches(holder);
            debug!(holder = %holder.id(), removed, "Expired nodes removed");
        }

        SweepReport {
            holders_scanned: 1,
            holders_changed: usize::from(removed > 0),
            nodes_removed: removed,
        }
    }

    fn require_storage(&self) -> Result<&Arc<dyn crate::storage::Storage>, StorageError> {
        self.storage
            .as_ref()
            .ok_or_else(|| StorageError::Unavailable("no storage configured".to_string()))
    }
}
