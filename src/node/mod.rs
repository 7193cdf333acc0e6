/*!
 * Node Module
 * Grants, their builder, and the special key encodings they carry
 */

pub mod keys;
mod node;

pub use keys::MetaEntry;
pub use node::{Node, NodeBuilder};
