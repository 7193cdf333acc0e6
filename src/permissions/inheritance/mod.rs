/*!
 * Inheritance Module
 * Direct parent resolution and the bounded transitive walk
 */

mod resolver;
mod walker;

pub use resolver::InheritanceResolver;
pub use walker::{InheritanceWalk, Level};
