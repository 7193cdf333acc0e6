/*!
 * Journal Storage Test
 * A custom backend sees saves and deletes in commit order
 */

use parking_lot::Mutex;
use perms_kernel::storage::{GroupRecord, HolderRecord, StorageFuture, UserRecord};
use perms_kernel::{HolderHandle, Node, PermissionManager, Storage, TemporaryModifier};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use uuid::Uuid;

/// Records every write as a short line
#[derive(Default)]
struct JournalStorage {
    journal: Mutex<Vec<String>>,
}

impl JournalStorage {
    fn entries(&self) -> Vec<String> {
        self.journal.lock().clone()
    }
}

impl Storage for JournalStorage {
    fn load_group(&self, _name: &str) -> StorageFuture<'_, Option<GroupRecord>> {
        Box::pin(async { Ok(None) })
    }

    fn load_user(&self, _uuid: Uuid) -> StorageFuture<'_, Option<UserRecord>> {
        Box::pin(async { Ok(None) })
    }

    fn save_holder(&self, record: HolderRecord) -> StorageFuture<'_, ()> {
        Box::pin(async move {
            let line = format!("save {} ({} nodes)", record.id(), record.nodes().len());
            self.journal.lock().push(line);
            Ok(())
        })
    }

    fn delete_group(&self, name: &str) -> StorageFuture<'_, ()> {
        let line = format!("delete {}", name);
        Box::pin(async move {
            self.journal.lock().push(line);
            Ok(())
        })
    }
}

#[tokio::test]
async fn test_writes_reach_backend_in_order() {
    let storage = Arc::new(JournalStorage::default());
    let manager = PermissionManager::builder()
        .storage(storage.clone())
        .build()
        .unwrap();

    let group: HolderHandle = manager.create_group("builders", 5).unwrap().into();
    for key in ["build", "break"] {
        manager.set_permission(&group, Node::builder(key).build().unwrap(), TemporaryModifier::Deny);
    }
    let pending = manager
        .delete_group("builders")
        .unwrap()
        .expect("storage configured");
    pending.wait().await.unwrap();

    let id = group.id().to_string();
    assert_eq!(
        storage.entries(),
        vec![
            format!("save {} (0 nodes)", id),
            format!("save {} (1 nodes)", id),
            format!("save {} (2 nodes)", id),
            "delete builders".to_string(),
        ]
    );
}
