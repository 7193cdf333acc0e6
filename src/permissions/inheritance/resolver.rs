/*!
 * Parent Resolution
 */

use crate::context::ImmutableContextSet;
use crate::holder::{Group, GroupManager, HolderId, PermissionHolder};
use crate::node::Node;
use crate::permissions::types::DefaultsProvider;
use ahash::AHashSet;
use std::sync::Arc;
use std::time::SystemTime;
use tracing::trace;

/// Resolves direct parents against the loaded groups
#[derive(Clone, Copy)]
pub struct InheritanceResolver<'a> {
    groups: &'a GroupManager,
    defaults: &'a dyn DefaultsProvider,
}

impl<'a> InheritanceResolver<'a> {
    pub fn new(groups: &'a GroupManager, defaults: &'a dyn DefaultsProvider) -> Self {
        Self { groups, defaults }
    }

    pub fn groups(&self) -> &'a GroupManager {
        self.groups
    }

    pub fn defaults(&self) -> &'a dyn DefaultsProvider {
        self.defaults
    }

    /// Direct parents of `holder` in `context`, highest weight first
    pub fn resolve_parents(
        &self,
        holder: &PermissionHolder,
        context: &ImmutableContextSet,
        now: SystemTime,
    ) -> Vec<Arc<Group>> {
        self.resolve_from_nodes(holder.id(), &holder.nodes(), context, now)
    }

    /// Same as [`InheritanceResolver::resolve_parents`] over a node snapshot
    ///
    /// Only `group.<name>` nodes with value true that are alive at `now` and
    /// satisfied by `context` count. Configured defaults follow the explicit
    /// edges. Unloaded names are skipped, a group never parents itself, and
    /// the first occurrence of a name wins before the weight sort.
    pub fn resolve_from_nodes(
        &self,
        id: &HolderId,
        nodes: &[Node],
        context: &ImmutableContextSet,
        now: SystemTime,
    ) -> Vec<Arc<Group>> {
        let own_name = id.group_name();

        let explicit = nodes
            .iter()
            .filter(|node| node.value() && node.applies_at(context, now))
            .filter_map(Node::group_name);
        let defaults = self
            .defaults
            .default_parents(id.kind(), context)
            .into_iter()
            .map(|name| name.trim().to_lowercase());

        let mut seen: AHashSet<String> = AHashSet::new();
        let mut parents: Vec<(i32, Arc<Group>)> = Vec::new();

        for name in explicit.chain(defaults) {
            if own_name == Some(name.as_str()) || !seen.insert(name.clone()) {
                continue;
            }
            match self.groups.get(&name) {
                Some(group) => parents.push((group.weight(), group)),
                None => trace!(holder = %id, group = %name, "Skipping unloaded parent"),
            }
        }

        // Weights are snapshotted so a concurrent reweight cannot break the sort
        parents.sort_by(|(wa, a), (wb, b)| wb.cmp(wa).then_with(|| a.name().cmp(b.name())));
        parents.into_iter().map(|(_, group)| group).collect()
    }
}
