/*!
 * Transitive Walk
 */

use super::resolver::InheritanceResolver;
use crate::context::ImmutableContextSet;
use crate::holder::{Group, GroupRef, HolderId};
use crate::node::Node;
use ahash::AHashSet;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::SystemTime;
use tracing::debug;

/// Nodes contributed by one holder
#[derive(Debug, Clone)]
pub struct Level {
    /// None for the holder the walk started from
    pub group: Option<Arc<Group>>,
    pub nodes: Arc<Vec<Node>>,
}

/// Ordered result of a walk, nearest holder first
#[derive(Debug, Clone)]
pub struct InheritanceWalk {
    pub levels: Vec<Level>,
    /// Direct parents of the root
    pub parents: Vec<GroupRef>,
    /// The depth bound cut off at least one edge
    pub truncated: bool,
}

impl InheritanceWalk {
    pub fn groups(&self) -> impl Iterator<Item = &Arc<Group>> {
        self.levels.iter().filter_map(|level| level.group.as_ref())
    }
}

impl InheritanceResolver<'_> {
    /// Breadth-first walk from `root` over `root_nodes`
    ///
    /// A group is entered at most once per walk: repeated edges (cycles,
    /// diamonds) are dropped. Groups at `max_depth` are entered but not
    /// expanded. `on_enter` runs before a group's nodes are snapshotted.
    pub fn walk(
        &self,
        root: &HolderId,
        root_nodes: Arc<Vec<Node>>,
        context: &ImmutableContextSet,
        now: SystemTime,
        max_depth: usize,
        mut on_enter: impl FnMut(&Arc<Group>),
    ) -> InheritanceWalk {
        let mut visited: AHashSet<String> = AHashSet::new();
        if let Some(name) = root.group_name() {
            visited.insert(name.to_string());
        }

        let direct = self.resolve_from_nodes(root, &root_nodes, context, now);
        let parents = direct.iter().map(|group| group.to_ref()).collect();

        let mut levels = vec![Level {
            group: None,
            nodes: root_nodes,
        }];
        let mut truncated = false;
        let mut queue: VecDeque<(Arc<Group>, usize)> =
            direct.into_iter().map(|group| (group, 1)).collect();

        while let Some((group, depth)) = queue.pop_front() {
            if !visited.insert(group.name().to_string()) {
                continue;
            }

            on_enter(&group);
            let nodes = group.holder().nodes();

            let next = self.resolve_from_nodes(group.holder().id(), &nodes, context, now);
            levels.push(Level {
                group: Some(Arc::clone(&group)),
                nodes,
            });

            let unvisited = next
                .into_iter()
                .filter(|parent| !visited.contains(parent.name()));
            if depth >= max_depth {
                if unvisited.count() > 0 {
                    truncated = true;
                }
                continue;
            }
            queue.extend(unvisited.map(|parent| (parent, depth + 1)));
        }

        if truncated {
            debug!(holder = %root, max_depth, "Inheritance walk truncated at depth bound");
        }

        InheritanceWalk {
            levels,
            parents,
            truncated,
        }
    }
}
