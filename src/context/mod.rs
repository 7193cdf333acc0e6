/*!
 * Context Module
 * Situational scope for grants and permission queries
 */

mod set;

pub use set::{ImmutableContextSet, MutableContextSet};
