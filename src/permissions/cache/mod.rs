/*!
 * Permission Cache
 * Per-holder memo of cached views keyed by context set
 */

mod view;

pub use view::CachedView;
pub(crate) use view::ViewBuilder;

use crate::context::ImmutableContextSet;
use crate::holder::HolderId;
use ahash::{AHashSet, RandomState};
use dashmap::DashMap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::SystemTime;

/// Cached views of one holder
///
/// Invalidation bumps `generation` before clearing. A build records the
/// generation it started from and is discarded if it changed meanwhile, so a
/// view computed from pre-invalidation nodes never survives the invalidation.
///
/// # Performance
/// - Cache-line aligned to prevent false sharing of the hit/miss counters
#[repr(C, align(64))]
pub struct CachedData {
    owner: HolderId,
    views: DashMap<ImmutableContextSet, Arc<CachedView>, RandomState>,
    generation: AtomicU64,
    /// Groups this holder is registered on
    dependencies: Mutex<AHashSet<String>>,
    hits: AtomicU64,
    misses: AtomicU64,
    builds: AtomicU64,
    invalidations: AtomicU64,
}

impl CachedData {
    pub fn new(owner: HolderId) -> Self {
        Self {
            owner,
            views: DashMap::with_hasher(RandomState::new()),
            generation: AtomicU64::new(0),
            dependencies: Mutex::new(AHashSet::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            builds: AtomicU64::new(0),
            invalidations: AtomicU64::new(0),
        }
    }

    pub fn owner(&self) -> &HolderId {
        &self.owner
    }

    /// Fresh view for `context`, if one is cached
    pub fn get(&self, context: &ImmutableContextSet, now: SystemTime) -> Option<Arc<CachedView>> {
        if let Some(entry) = self.views.get(context) {
            if !entry.is_stale_at(now) {
                self.hits.fetch_add(1, Ordering::Relaxed);
                return Some(Arc::clone(entry.value()));
            }
            // A contributing temporary node expired, evict
            let stale = Arc::clone(entry.value());
            drop(entry);
            self.views
                .remove_if(context, |_, current| Arc::ptr_eq(current, &stale));
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    /// Generation to pass to [`CachedData::insert_if_current`]
    ///
    /// Must be read before the node snapshot the build works from.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Keep `view` only if no invalidation happened since `generation`
    pub fn insert_if_current(
        &self,
        context: ImmutableContextSet,
        view: Arc<CachedView>,
        generation: u64,
    ) -> bool {
        self.builds.fetch_add(1, Ordering::Relaxed);
        if self.generation() != generation {
            return false;
        }

        self.views.insert(context.clone(), Arc::clone(&view));

        // An invalidation may have slipped in between the check and the insert
        if self.generation() != generation {
            self.views
                .remove_if(&context, |_, current| Arc::ptr_eq(current, &view));
            return false;
        }
        true
    }

    /// Remove `view` if it is still the entry for `context`
    pub(crate) fn discard(&self, context: &ImmutableContextSet, view: &Arc<CachedView>) {
        self.views
            .remove_if(context, |_, current| Arc::ptr_eq(current, view));
    }

    /// Drop every cached view
    pub fn invalidate(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.views.clear();
        self.invalidations.fetch_add(1, Ordering::Relaxed);
    }

    /// Remember a registry registration; returns true when new
    pub(crate) fn record_dependency(&self, group: &str) -> bool {
        self.dependencies.lock().insert(group.to_string())
    }

    pub(crate) fn forget_dependency(&self, group: &str) {
        self.dependencies.lock().remove(group);
    }

    /// Drain recorded registrations, used when the holder is unloaded
    pub(crate) fn take_dependencies(&self) -> Vec<String> {
        self.dependencies.lock().drain().collect()
    }

    pub fn dependencies(&self) -> Vec<String> {
        let mut groups: Vec<String> = self.dependencies.lock().iter().cloned().collect();
        groups.sort();
        groups
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            size: self.views.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            builds: self.builds.load(Ordering::Relaxed),
            invalidations: self.invalidations.load(Ordering::Relaxed),
        }
    }
}

impl std::fmt::Debug for CachedData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedData")
            .field("owner", &self.owner)
            .field("views", &self.views.len())
            .field("generation", &self.generation())
            .finish()
    }
}

/// Cache statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheStats {
    pub size: usize,
    pub hits: u64,
    pub misses: u64,
    pub builds: u64,
    pub invalidations: u64,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total > 0 {
            (self.hits as f64 / total as f64) * 100.0
        } else {
            0.0
        }
    }

    pub fn merge(&mut self, other: CacheStats) {
        self.size += other.size;
        self.hits += other.hits;
        self.misses += other.misses;
        self.builds += other.builds;
        self.invalidations += other.invalidations;
    }
}
