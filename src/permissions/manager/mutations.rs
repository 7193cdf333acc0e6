/*!
 * Node Mutations
 *
 * Every mutation runs decide-and-splice under the holder's node lock and
 * enqueues the resulting snapshot before releasing it, so saves for one
 * holder reach the queue in commit order. Invalidation and audit follow
 * after the lock is dropped.
 */

use super::manager::PermissionManager;
use crate::context::ImmutableContextSet;
use crate::holder::HolderHandle;
use crate::node::{MetaEntry, Node};
use crate::permissions::audit::INTERNAL_ACTOR;
use crate::permissions::merge::{self, MergeDecision};
use crate::permissions::types::{MutateOutcome, MutationResult, TemporaryModifier};
use crate::storage::PendingSave;
use std::sync::Arc;
use std::time::SystemTime;
use tracing::{debug, field, info_span};

/// Nodes removed by [`PermissionManager::clear_nodes`]
#[derive(Debug)]
pub struct ClearResult {
    pub removed: usize,
    pub save: Option<PendingSave>,
}

impl PermissionManager {
    /// Grant `node` to `holder` with the given collision policy
    pub fn set_permission(
        &self,
        holder: &HolderHandle,
        node: Node,
        modifier: TemporaryModifier,
    ) -> MutationResult {
        self.set_permission_as(INTERNAL_ACTOR, holder, node, modifier)
    }

    /// [`PermissionManager::set_permission`] attributed to `actor`
    pub fn set_permission_as(
        &self,
        actor: &str,
        holder: &HolderHandle,
        node: Node,
        modifier: TemporaryModifier,
    ) -> MutationResult {
        if let (Some(group), Some(parent)) = (holder.as_group(), node.group_name()) {
            if group.name() == parent {
                debug!(group = group.name(), "Rejected self-inheritance");
                return MutationResult::new(MutateOutcome::Fail, node);
            }
        }

        let action = describe(&node, Verb::Set);
        let now = SystemTime::now();
        self.mutate(actor, holder, &action, node.clone(), |current| {
            merge::merge_node(current, node, modifier, now)
        })
    }

    /// Remove the node equivalent to `node` with the same temporariness
    pub fn unset_permission(&self, holder: &HolderHandle, node: Node) -> MutationResult {
        self.unset_permission_as(INTERNAL_ACTOR, holder, node)
    }

    pub fn unset_permission_as(
        &self,
        actor: &str,
        holder: &HolderHandle,
        node: Node,
    ) -> MutationResult {
        let action = describe(&node, Verb::Unset);
        self.mutate(actor, holder, &action, node.clone(), |current| {
            merge::remove_node(current, node)
        })
    }

    /// Remove every node, or only those set in exactly `context`
    pub fn clear_nodes(
        &self,
        holder: &HolderHandle,
        context: Option<&ImmutableContextSet>,
    ) -> ClearResult {
        self.clear_nodes_as(INTERNAL_ACTOR, holder, context)
    }

    pub fn clear_nodes_as(
        &self,
        actor: &str,
        holder: &HolderHandle,
        context: Option<&ImmutableContextSet>,
    ) -> ClearResult {
        let (removed, save) = {
            let mut nodes = holder.holder().lock_nodes();
            let (remaining, removed) = merge::clear_nodes(&nodes, context);
            if removed == 0 {
                return ClearResult {
                    removed: 0,
                    save: None,
                };
            }
            *nodes = Arc::new(remaining);
            (removed, self.enqueue_save(holder, &nodes))
        };

        self.invalidate_caches(holder);
        let parameters = context.map(|ctx| vec![ctx.to_string()]).unwrap_or_default();
        self.record_audit(actor, holder, "clear", parameters);
        debug!(holder = %holder.id(), removed, "Cleared nodes");

        ClearResult { removed, save }
    }

    fn mutate(
        &self,
        actor: &str,
        holder: &HolderHandle,
        action: &str,
        requested: Node,
        decide: impl FnOnce(&[Node]) -> MergeDecision,
    ) -> MutationResult {
        let span = info_span!(
            "mutation",
            holder = %holder.id(),
            key = requested.key(),
            outcome = field::Empty
        );
        let _enter = span.enter();

        let (decision, save) = {
            let mut nodes = holder.holder().lock_nodes();
            let mut decision = decide(nodes.as_slice());
            let save = match decision.nodes.take() {
                Some(updated) => {
                    *nodes = Arc::new(updated);
                    self.enqueue_save(holder, &nodes)
                }
                None => None,
            };
            (decision, save)
        };

        span.record("outcome", field::debug(decision.outcome));

        if decision.outcome.as_bool() {
            self.invalidate_caches(holder);
            self.record_audit(actor, holder, action, audit_parameters(&decision.node));
        }

        MutationResult {
            outcome: decision.outcome,
            node: decision.node,
            previous: decision.previous,
            save,
        }
    }
}

#[derive(Clone, Copy)]
enum Verb {
    Set,
    Unset,
}

/// Audit verb phrase, e.g. `parent addtemp` or `permission unset`
fn describe(node: &Node, verb: Verb) -> String {
    let (subject, set, unset) = if node.is_group_node() {
        ("parent", "add", "remove")
    } else if node.meta_entry().is_some() {
        ("meta", "set", "unset")
    } else {
        ("permission", "set", "unset")
    };
    let verb = match verb {
        Verb::Set => set,
        Verb::Unset => unset,
    };
    let temp = if node.is_temporary() { "temp" } else { "" };
    format!("{} {}{}", subject, verb, temp)
}

fn audit_parameters(node: &Node) -> Vec<String> {
    let mut parameters = match (node.group_name(), node.meta_entry()) {
        (Some(group), _) => vec![group],
        (None, Some(MetaEntry::Meta { key, value })) => vec![key, value],
        _ => vec![node.key().to_string(), node.value().to_string()],
    };
    if let Some(expiry) = node.expiry() {
        let secs = expiry
            .duration_since(SystemTime::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        parameters.push(secs.to_string());
    }
    if !node.context().is_empty() {
        parameters.push(node.context().to_string());
    }
    parameters
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_describe() {
        let parent = Node::group("admin")
            .duration(Duration::from_secs(60))
            .build()
            .unwrap();
        assert_eq!(describe(&parent, Verb::Set), "parent addtemp");
        assert_eq!(describe(&parent, Verb::Unset), "parent removetemp");

        let permission = Node::builder("build").build().unwrap();
        assert_eq!(describe(&permission, Verb::Set), "permission set");

        let meta = Node::builder("meta.home.spawn").build().unwrap();
        assert_eq!(describe(&meta, Verb::Unset), "meta unset");
    }

    #[test]
    fn test_audit_parameters() {
        let node = Node::builder("fly")
            .value(false)
            .with_context("world", "nether")
            .build()
            .unwrap();
        assert_eq!(
            audit_parameters(&node),
            vec!["fly".to_string(), "false".to_string(), "world=nether".to_string()]
        );
    }
}
