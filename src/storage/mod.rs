/*!
 * Storage Module
 * Backend interface, in-memory backend, and the async persistence queue
 */

mod memory;
mod queue;
mod traits;

pub use memory::MemoryStorage;
pub use queue::{PendingSave, PersistenceQueue};
pub use traits::{GroupRecord, HolderRecord, Storage, StorageFuture, UserRecord};
