/*!
 * Permission Types Module
 * Core types and traits for the permission system
 */

mod core;
mod traits;

pub use self::core::{MutateOutcome, MutationResult, SweepReport, TemporaryModifier};
pub use traits::{DefaultsProvider, PermissionSource};
