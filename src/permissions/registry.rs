/*!
 * Invalidation Registry
 *
 * Reverse edges from a group to every holder whose cached views were built
 * through it. Invalidating a group drops those views, then repeats for each
 * dependent that is itself a group.
 */

use super::cache::CachedData;
use crate::holder::HolderId;
use ahash::{AHashMap, AHashSet, RandomState};
use dashmap::DashMap;
use std::collections::VecDeque;
use std::sync::{Arc, Weak};
use tracing::trace;

/// Group name -> dependents, held weakly so unloaded holders fall away
#[derive(Default)]
pub struct InvalidationRegistry {
    dependents: DashMap<String, AHashMap<HolderId, Weak<CachedData>>, RandomState>,
}

impl InvalidationRegistry {
    pub fn new() -> Self {
        Self {
            dependents: DashMap::with_hasher(RandomState::new()),
        }
    }

    /// Register `dependent` on `group`; returns true when the edge is new
    pub fn register(&self, group: &str, dependent: &Arc<CachedData>) -> bool {
        let owner = dependent.owner().clone();
        if owner.group_name() == Some(group) {
            return false;
        }
        dependent.record_dependency(group);
        self.dependents
            .entry(group.to_string())
            .or_default()
            .insert(owner, Arc::downgrade(dependent))
            .is_none()
    }

    pub fn unregister(&self, group: &str, dependent: &HolderId) -> bool {
        let Some(mut entry) = self.dependents.get_mut(group) else {
            return false;
        };
        let removed = entry.remove(dependent);
        let now_empty = entry.is_empty();
        drop(entry);

        if now_empty {
            self.dependents.remove_if(group, |_, holders| holders.is_empty());
        }
        if let Some(cache) = removed.as_ref().and_then(Weak::upgrade) {
            cache.forget_dependency(group);
        }
        removed.is_some()
    }

    /// Drop every edge pointing at `group`
    pub(crate) fn forget_group(&self, group: &str) {
        self.dependents.remove(group);
    }

    /// Invalidate every transitive dependent of `group`
    ///
    /// Returns how many caches were invalidated. Each group is expanded at
    /// most once, so cyclic registrations terminate.
    pub fn invalidate(&self, group: &str) -> usize {
        let mut visited: AHashSet<String> = AHashSet::new();
        let mut queue: VecDeque<String> = VecDeque::new();
        let mut invalidated = 0;

        visited.insert(group.to_string());
        queue.push_back(group.to_string());

        while let Some(current) = queue.pop_front() {
            // Collect before invalidating: never call out while holding the shard
            let live = self.live_dependents(&current);

            for cache in live {
                cache.invalidate();
                invalidated += 1;
                if let HolderId::Group(name) = cache.owner() {
                    if visited.insert(name.clone()) {
                        queue.push_back(name.clone());
                    }
                }
            }
        }

        trace!(group, invalidated, "Invalidation cascade");
        invalidated
    }

    /// Dependents currently registered on `group`
    pub fn dependents_of(&self, group: &str) -> Vec<HolderId> {
        let mut holders: Vec<HolderId> = self
            .live_dependents(group)
            .iter()
            .map(|cache| cache.owner().clone())
            .collect();
        holders.sort();
        holders
    }

    /// Number of groups with at least one registration
    pub fn len(&self) -> usize {
        self.dependents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dependents.is_empty()
    }

    fn live_dependents(&self, group: &str) -> Vec<Arc<CachedData>> {
        let Some(mut entry) = self.dependents.get_mut(group) else {
            return Vec::new();
        };
        let mut live = Vec::with_capacity(entry.len());
        entry.retain(|_, weak| match weak.upgrade() {
            Some(cache) => {
                live.push(cache);
                true
            }
            None => false,
        });
        live
    }
}
