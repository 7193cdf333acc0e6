/*!
 * Permission Manager
 * Single entry point tying holders, merge engine, cached views, and persistence together
 */

use crate::context::ImmutableContextSet;
use crate::core::types::Tristate;
use crate::core::Config;
use crate::holder::{Group, GroupManager, GroupRef, HolderHandle, UserManager};
use crate::node::Node;
use crate::permissions::audit::{AuditEntry, AuditSink};
use crate::permissions::cache::{CacheStats, CachedView, ViewBuilder};
use crate::permissions::inheritance::InheritanceResolver;
use crate::permissions::registry::InvalidationRegistry;
use crate::permissions::subject::Subject;
use crate::permissions::types::{DefaultsProvider, TemporaryModifier};
use crate::storage::{
    GroupRecord, HolderRecord, PendingSave, PersistenceQueue, Storage, UserRecord,
};
use arc_swap::ArcSwap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::SystemTime;
use tracing::trace;

/// Live configuration plus the defaults derived from it
pub(super) struct Settings {
    pub(super) config: Arc<Config>,
    pub(super) defaults: Arc<dyn DefaultsProvider>,
}

/// Central permission manager
///
/// Cheap to clone; every clone shares the same holders, caches, and queue.
#[derive(Clone)]
pub struct PermissionManager {
    pub(super) settings: Arc<ArcSwap<Settings>>,
    /// Provider supplied by the embedder; survives config updates
    pub(super) custom_defaults: Option<Arc<dyn DefaultsProvider>>,
    pub(super) users: UserManager,
    pub(super) groups: GroupManager,
    pub(super) registry: Arc<InvalidationRegistry>,
    /// Bumped whenever the set of groups or their weights changes
    pub(super) topology: Arc<AtomicU64>,
    pub(super) storage: Option<Arc<dyn Storage>>,
    pub(super) persistence: Option<PersistenceQueue>,
    pub(super) audit: Arc<dyn AuditSink>,
}

impl PermissionManager {
    /// Current configuration
    pub fn config(&self) -> Arc<Config> {
        Arc::clone(&self.settings.load().config)
    }

    /// Collision policy from the live config
    pub fn temporary_modifier(&self) -> TemporaryModifier {
        self.settings.load().config.temporary_modifier
    }

    /// Swap the configuration and drop every cached view
    pub fn update_config(&self, config: Config) {
        let settings = Settings::new(config, self.custom_defaults.clone());
        self.settings.store(Arc::new(settings));
        self.invalidate_all();
    }

    pub fn users(&self) -> &UserManager {
        &self.users
    }

    pub fn groups(&self) -> &GroupManager {
        &self.groups
    }

    pub fn registry(&self) -> &Arc<InvalidationRegistry> {
        &self.registry
    }

    /// Capability handle for a platform adapter
    pub fn subject(&self, holder: impl Into<HolderHandle>) -> Subject {
        Subject::new(self.clone(), holder.into())
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Cached view of `holder` in `context`, built on demand
    pub fn view(&self, holder: &HolderHandle, context: &ImmutableContextSet) -> Arc<CachedView> {
        self.view_at(holder, context, SystemTime::now())
    }

    /// [`PermissionManager::view`] evaluated at an explicit instant
    pub fn view_at(
        &self,
        holder: &HolderHandle,
        context: &ImmutableContextSet,
        now: SystemTime,
    ) -> Arc<CachedView> {
        let cache = holder.holder().cache();
        if let Some(view) = cache.get(context, now) {
            return view;
        }

        // Generation first, snapshot second: an invalidation in between
        // makes the insert below a no-op
        let generation = cache.generation();
        let topology = self.topology.load(Ordering::SeqCst);
        let root_nodes = holder.holder().nodes();

        let settings = self.settings.load();
        let resolver = InheritanceResolver::new(&self.groups, settings.defaults.as_ref());
        let walk = resolver.walk(
            holder.id(),
            root_nodes,
            context,
            now,
            settings.config.max_inheritance_depth,
            |group| {
                // Registered before the group's nodes are read
                self.registry.register(group.name(), cache);
            },
        );

        let mut builder = ViewBuilder::new(context.clone(), now);
        for level in &walk.levels {
            builder.accumulate(&level.nodes);
            if let Some(group) = &level.group {
                builder.inherit(group.name());
            }
        }
        let view = Arc::new(builder.build(walk.parents));

        if !cache.insert_if_current(context.clone(), Arc::clone(&view), generation) {
            trace!(holder = %holder.id(), "Discarded view built across an invalidation");
        } else if self.topology.load(Ordering::SeqCst) != topology {
            // A group changed before this build registered on it
            cache.discard(context, &view);
            trace!(holder = %holder.id(), "Discarded view built across a group change");
        }
        view
    }

    pub fn get_permission_value(
        &self,
        holder: &HolderHandle,
        context: &ImmutableContextSet,
        permission: &str,
    ) -> Tristate {
        self.view(holder, context).permission_value(permission)
    }

    /// Direct parents, highest weight first
    pub fn resolve_parents(
        &self,
        holder: &HolderHandle,
        context: &ImmutableContextSet,
    ) -> Vec<Arc<Group>> {
        let settings = self.settings.load();
        InheritanceResolver::new(&self.groups, settings.defaults.as_ref()).resolve_parents(
            holder.holder(),
            context,
            SystemTime::now(),
        )
    }

    /// Direct parents as lightweight references, from the cached view
    pub fn parents(&self, holder: &HolderHandle, context: &ImmutableContextSet) -> Vec<GroupRef> {
        self.view(holder, context).parents().to_vec()
    }

    /// Option value from the inheritance tree, then the configured defaults
    pub fn get_option(
        &self,
        holder: &HolderHandle,
        context: &ImmutableContextSet,
        key: &str,
    ) -> Option<String> {
        if let Some(value) = self.view(holder, context).option(key) {
            return Some(value.to_string());
        }
        self.settings
            .load()
            .defaults
            .default_option(holder.kind(), context, key)
    }

    /// Whether `holder` inherits `group`, directly or transitively
    pub fn is_child_of(
        &self,
        holder: &HolderHandle,
        context: &ImmutableContextSet,
        group: &str,
    ) -> bool {
        let name = group.trim().to_lowercase();
        self.view(holder, context)
            .inherited()
            .iter()
            .any(|inherited| *inherited == name)
    }

    // =========================================================================
    // Invalidation
    // =========================================================================

    /// Drop the views of `holder` and, for a group, of every dependent
    ///
    /// Returns how many caches were invalidated.
    pub fn invalidate_caches(&self, holder: &HolderHandle) -> usize {
        holder.holder().cache().invalidate();
        match holder.as_group() {
            Some(group) => 1 + self.registry.invalidate(group.name()),
            None => 1,
        }
    }

    /// Record a group creation, deletion, or reweight
    ///
    /// Must run after the change is visible and before the matching
    /// invalidation, so builds that have not registered yet notice it.
    pub(super) fn bump_topology(&self) {
        self.topology.fetch_add(1, Ordering::SeqCst);
    }

    /// Drop every cached view of every loaded holder
    pub fn invalidate_all(&self) {
        for user in self.users.all() {
            user.holder().cache().invalidate();
        }
        for group in self.groups.all() {
            group.holder().cache().invalidate();
        }
    }

    /// Aggregated statistics over every loaded holder
    pub fn cache_stats(&self) -> CacheStats {
        let mut stats = CacheStats::default();
        for user in self.users.all() {
            stats.merge(user.holder().cache().stats());
        }
        for group in self.groups.all() {
            stats.merge(group.holder().cache().stats());
        }
        stats
    }

    // =========================================================================
    // Helpers shared by mutations and lifecycle
    // =========================================================================

    /// Queue a snapshot of `holder` with `nodes`; call while holding its node lock
    pub(super) fn enqueue_save(&self, holder: &HolderHandle, nodes: &[Node]) -> Option<PendingSave> {
        let queue = self.persistence.as_ref()?;
        let record = match holder {
            HolderHandle::User(user) => HolderRecord::User(UserRecord {
                uuid: user.uuid(),
                name: user.name(),
                nodes: nodes.to_vec(),
            }),
            HolderHandle::Group(group) => HolderRecord::Group(GroupRecord {
                name: group.name().to_string(),
                weight: group.weight(),
                nodes: nodes.to_vec(),
            }),
        };
        Some(queue.enqueue(record))
    }

    pub(super) fn record_audit(
        &self,
        actor: &str,
        holder: &HolderHandle,
        action: &str,
        parameters: Vec<String>,
    ) {
        let entry = AuditEntry::new(actor, holder.id().clone(), holder.friendly_name(), action)
            .with_parameters(parameters);
        self.audit.record(entry);
    }
}

impl Settings {
    pub(super) fn new(config: Config, custom: Option<Arc<dyn DefaultsProvider>>) -> Self {
        let defaults = custom.unwrap_or_else(|| {
            Arc::new(crate::permissions::defaults::ConfiguredDefaults::from_config(&config))
        });
        Self {
            config: Arc::new(config),
            defaults,
        }
    }
}

impl std::fmt::Debug for PermissionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PermissionManager")
            .field("users", &self.users.len())
            .field("groups", &self.groups.len())
            .field("persistence", &self.persistence)
            .finish()
    }
}
