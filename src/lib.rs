/*!
 * Permissions Kernel Library
 * Permission nodes, holders, inheritance, cached views, and persistence
 */

pub mod context;
pub mod core;
pub mod holder;
pub mod monitoring;
pub mod node;
pub mod permissions;
pub mod storage;
pub mod sweeper;

// Re-exports
pub use crate::core::{Config, KernelError, KernelResult, Tristate};
pub use context::{ImmutableContextSet, MutableContextSet};
pub use holder::{Group, GroupRef, HolderHandle, HolderId, User};
pub use monitoring::init_tracing;
pub use node::{Node, NodeBuilder};
pub use permissions::{
    PermissionManager, PermissionManagerBuilder, PermissionSource, Subject, TemporaryModifier,
};
pub use storage::{MemoryStorage, PendingSave, Storage};
pub use sweeper::ExpirySweeper;
