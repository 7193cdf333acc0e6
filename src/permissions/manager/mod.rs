/*!
 * Permission Manager Module
 */

mod builder;
mod lifecycle;
#[allow(clippy::module_inception)]
mod manager;
mod mutations;

pub use builder::PermissionManagerBuilder;
pub use manager::PermissionManager;
pub use mutations::ClearResult;
