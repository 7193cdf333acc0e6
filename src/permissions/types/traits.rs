/*!
 * Permission Traits
 * Interfaces the core exposes to platforms and consumes from configuration
 */

use crate::context::ImmutableContextSet;
use crate::core::types::Tristate;
use crate::holder::{GroupRef, HolderKind};

/// Read-only capability interface implemented once per platform adapter
pub trait PermissionSource: Send + Sync {
    /// Effective value of a permission in the given context
    fn permission_value(&self, context: &ImmutableContextSet, permission: &str) -> Tristate;

    /// Direct parents in precedence order
    fn parents(&self, context: &ImmutableContextSet) -> Vec<GroupRef>;

    /// Option (prefix, suffix, or free-form meta) value
    fn option(&self, context: &ImmutableContextSet, key: &str) -> Option<String>;

    /// Whether the subject inherits `group` in the given context
    fn is_child_of(&self, context: &ImmutableContextSet, group: &str) -> bool;

    /// Drop memoized views after a native-side change
    fn invalidate_caches(&self);
}

/// Source of implicit parents and options
pub trait DefaultsProvider: Send + Sync {
    /// Group names every holder of `kind` inherits in `context`
    fn default_parents(&self, kind: HolderKind, context: &ImmutableContextSet) -> Vec<String>;

    /// Fallback option value when the inheritance tree sets none
    fn default_option(
        &self,
        kind: HolderKind,
        context: &ImmutableContextSet,
        key: &str,
    ) -> Option<String>;
}
