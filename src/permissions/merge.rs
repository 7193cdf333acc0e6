/*!
 * Temporary-Grant Merge Engine
 *
 * Pure decision functions over a holder's node list. The caller holds the
 * holder's node lock across decide and splice, so two racing grants against
 * the same equivalence class always observe each other.
 */

use super::types::{MutateOutcome, TemporaryModifier};
use crate::context::ImmutableContextSet;
use crate::node::Node;
use std::time::SystemTime;

/// What the engine decided for one mutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeDecision {
    pub outcome: MutateOutcome,
    /// Node to report back to the caller
    pub node: Node,
    /// Node displaced by the change
    pub previous: Option<Node>,
    /// Replacement node list, present only when state changes
    pub nodes: Option<Vec<Node>>,
}

impl MergeDecision {
    fn unchanged(outcome: MutateOutcome, node: Node) -> Self {
        Self {
            outcome,
            node,
            previous: None,
            nodes: None,
        }
    }
}

/// Decide how `node` lands on a holder currently owning `current`
///
/// Re-granting a permanent node with the same value is reported as
/// `NoChange` instead of a replacing `Success`, so no save is queued for it.
/// An ACCUMULATE whose summed expiry overflows is a `Fail`.
pub fn merge_node(
    current: &[Node],
    node: Node,
    modifier: TemporaryModifier,
    now: SystemTime,
) -> MergeDecision {
    if node.is_expired_at(now) {
        return MergeDecision::unchanged(MutateOutcome::Fail, node);
    }
    if node.is_temporary() {
        merge_temporary(current, node, modifier, now)
    } else {
        merge_permanent(current, node)
    }
}

fn merge_temporary(
    current: &[Node],
    node: Node,
    modifier: TemporaryModifier,
    now: SystemTime,
) -> MergeDecision {
    let live = current
        .iter()
        .find(|n| n.is_temporary() && n.equivalent_to(&node) && !n.is_expired_at(now))
        .cloned();

    let final_node = match (&live, modifier) {
        (None, _) => node,
        (Some(existing), TemporaryModifier::Deny) => {
            return MergeDecision::unchanged(MutateOutcome::AlreadyHas, existing.clone());
        }
        (Some(_), TemporaryModifier::Replace) => node,
        (Some(existing), TemporaryModifier::Accumulate) => {
            // Remaining time of the new grant is added on top of the old expiry
            match (existing.expiry(), node.remaining_at(now)) {
                (Some(expiry), Some(extra)) => match expiry.checked_add(extra) {
                    Some(extended) => node.with_expiry(extended),
                    None => return MergeDecision::unchanged(MutateOutcome::Fail, node),
                },
                _ => node,
            }
        }
    };

    // Drops the live equivalent along with any dead ones
    let mut nodes: Vec<Node> = current
        .iter()
        .filter(|n| !(n.is_temporary() && n.equivalent_to(&final_node)))
        .cloned()
        .collect();
    nodes.push(final_node.clone());

    MergeDecision {
        outcome: MutateOutcome::Success,
        node: final_node,
        previous: live,
        nodes: Some(nodes),
    }
}

fn merge_permanent(current: &[Node], node: Node) -> MergeDecision {
    let existing = current
        .iter()
        .position(|n| !n.is_temporary() && n.equivalent_to(&node));

    match existing {
        Some(index) if current[index].value() == node.value() => {
            MergeDecision::unchanged(MutateOutcome::NoChange, current[index].clone())
        }
        Some(index) => {
            let mut nodes = current.to_vec();
            let previous = nodes.remove(index);
            nodes.push(node.clone());
            MergeDecision {
                outcome: MutateOutcome::Success,
                node,
                previous: Some(previous),
                nodes: Some(nodes),
            }
        }
        None => {
            let mut nodes = current.to_vec();
            nodes.push(node.clone());
            MergeDecision {
                outcome: MutateOutcome::Success,
                node,
                previous: None,
                nodes: Some(nodes),
            }
        }
    }
}

/// Remove nodes equivalent to `node` with the same temporariness
///
/// On success the reported node is the one removed.
pub fn remove_node(current: &[Node], node: Node) -> MergeDecision {
    let matches =
        |n: &Node| n.equivalent_to(&node) && n.is_temporary() == node.is_temporary();

    let Some(previous) = current.iter().find(|n| matches(n)).cloned() else {
        return MergeDecision::unchanged(MutateOutcome::NoChange, node);
    };

    let nodes = current.iter().filter(|n| !matches(n)).cloned().collect();
    MergeDecision {
        outcome: MutateOutcome::Success,
        node: previous,
        previous: None,
        nodes: Some(nodes),
    }
}

/// Remove every node, or only those whose context equals `context`
///
/// Returns the remaining list and how many were removed.
pub fn clear_nodes(current: &[Node], context: Option<&ImmutableContextSet>) -> (Vec<Node>, usize) {
    let remaining: Vec<Node> = match context {
        Some(context) => current
            .iter()
            .filter(|n| n.context() != context)
            .cloned()
            .collect(),
        None => Vec::new(),
    };
    let removed = current.len() - remaining.len();
    (remaining, removed)
}

/// Split off nodes whose expiry has elapsed at `now`
pub fn remove_expired(current: &[Node], now: SystemTime) -> Option<(Vec<Node>, usize)> {
    let removed = current.iter().filter(|n| n.is_expired_at(now)).count();
    if removed == 0 {
        return None;
    }
    let remaining = current
        .iter()
        .filter(|n| !n.is_expired_at(now))
        .cloned()
        .collect();
    Some((remaining, removed))
}
