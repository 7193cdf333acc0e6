/*!
 * Permission Manager Builder
 */

use super::manager::{PermissionManager, Settings};
use crate::core::types::KernelResult;
use crate::core::Config;
use crate::holder::{GroupManager, UserManager};
use crate::permissions::audit::{AuditLogger, AuditSink};
use crate::permissions::registry::InvalidationRegistry;
use crate::permissions::types::DefaultsProvider;
use crate::storage::{PersistenceQueue, Storage};
use arc_swap::ArcSwap;
use std::sync::atomic::AtomicU64;
use std::sync::Arc;
use tracing::info;

/// Assembles a [`PermissionManager`]
///
/// Without storage, mutations are memory-only and carry no pending save.
#[derive(Default)]
pub struct PermissionManagerBuilder {
    config: Config,
    storage: Option<Arc<dyn Storage>>,
    defaults: Option<Arc<dyn DefaultsProvider>>,
    audit: Option<Arc<dyn AuditSink>>,
    registry: Option<Arc<InvalidationRegistry>>,
}

impl PermissionManagerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    pub fn storage(mut self, storage: Arc<dyn Storage>) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Override the defaults derived from config
    pub fn defaults(mut self, defaults: Arc<dyn DefaultsProvider>) -> Self {
        self.defaults = Some(defaults);
        self
    }

    pub fn audit(mut self, audit: Arc<dyn AuditSink>) -> Self {
        self.audit = Some(audit);
        self
    }

    pub fn registry(mut self, registry: Arc<InvalidationRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Build the manager
    ///
    /// With storage configured this must run inside a tokio runtime, which
    /// hosts the persistence worker.
    pub fn build(self) -> KernelResult<PermissionManager> {
        let persistence = match &self.storage {
            Some(storage) => {
                let (queue, _worker) = PersistenceQueue::spawn(
                    Arc::clone(storage),
                    self.config.save_attempts,
                    self.config.save_retry_delay,
                )?;
                Some(queue)
            }
            None => None,
        };

        info!(
            modifier = %self.config.temporary_modifier,
            max_depth = self.config.max_inheritance_depth,
            persistent = persistence.is_some(),
            "Permission manager initialized"
        );

        Ok(PermissionManager {
            settings: Arc::new(ArcSwap::from_pointee(Settings::new(
                self.config,
                self.defaults.clone(),
            ))),
            custom_defaults: self.defaults,
            users: UserManager::new(),
            groups: GroupManager::new(),
            registry: self
                .registry
                .unwrap_or_else(|| Arc::new(InvalidationRegistry::new())),
            topology: Arc::new(AtomicU64::new(0)),
            storage: self.storage,
            persistence,
            audit: self
                .audit
                .unwrap_or_else(|| Arc::new(AuditLogger::new())),
        })
    }
}

impl PermissionManager {
    pub fn builder() -> PermissionManagerBuilder {
        PermissionManagerBuilder::new()
    }

    /// Memory-only manager with the given config
    pub fn in_memory(config: Config) -> Self {
        Self {
            settings: Arc::new(ArcSwap::from_pointee(Settings::new(config, None))),
            custom_defaults: None,
            users: UserManager::new(),
            groups: GroupManager::new(),
            registry: Arc::new(InvalidationRegistry::new()),
            topology: Arc::new(AtomicU64::new(0)),
            storage: None,
            persistence: None,
            audit: Arc::new(AuditLogger::new()),
        }
    }
}
