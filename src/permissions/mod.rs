/*!
 * Permissions Module
 * Merge engine, inheritance, cached views, and the manager that ties them together
 *
 * ## Usage
 * ```ignore
 * use perms_kernel::permissions::{PermissionManager, TemporaryModifier};
 *
 * let manager = PermissionManager::in_memory(Config::default());
 * let admin = manager.create_group("admin", 20)?;
 * let user = manager.get_or_create_user(uuid, Some("alice".into()));
 *
 * let grant = Node::group("admin").duration(Duration::from_secs(60)).build()?;
 * manager.set_permission(&user.clone().into(), grant, TemporaryModifier::Accumulate);
 *
 * if manager.is_child_of(&user.into(), &ImmutableContextSet::empty(), "admin") {
 *     // ...
 * }
 * ```
 */

pub mod audit;
pub mod cache;
pub mod defaults;
pub mod inheritance;
pub mod manager;
pub mod merge;
pub mod registry;
pub mod subject;
pub mod types;

// Re-export commonly used items
pub use audit::{AuditEntry, AuditLogger, AuditSink, AuditStats};
pub use cache::{CacheStats, CachedData, CachedView};
pub use defaults::{ConfiguredDefaults, NoDefaults};
pub use inheritance::{InheritanceResolver, InheritanceWalk};
pub use manager::{ClearResult, PermissionManager, PermissionManagerBuilder};
pub use merge::MergeDecision;
pub use registry::InvalidationRegistry;
pub use subject::Subject;
pub use types::{
    DefaultsProvider, MutateOutcome, MutationResult, PermissionSource, SweepReport,
    TemporaryModifier,
};
