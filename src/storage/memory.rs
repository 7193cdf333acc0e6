/*!
 * In-Memory Storage
 * Map-backed backend with failure injection
 */

use super::traits::{GroupRecord, HolderRecord, Storage, StorageFuture, UserRecord};
use crate::core::errors::StorageError;
use ahash::RandomState;
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use uuid::Uuid;

/// Records kept in process memory
#[derive(Default)]
pub struct MemoryStorage {
    groups: DashMap<String, GroupRecord, RandomState>,
    users: DashMap<Uuid, UserRecord, RandomState>,
    fail_saves: AtomicBool,
    save_attempts: AtomicU64,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a group record
    pub fn insert_group(&self, record: GroupRecord) {
        self.groups.insert(record.name.trim().to_lowercase(), record);
    }

    /// Seed a user record
    pub fn insert_user(&self, record: UserRecord) {
        self.users.insert(record.uuid, record);
    }

    pub fn group(&self, name: &str) -> Option<GroupRecord> {
        self.groups
            .get(&name.trim().to_lowercase())
            .map(|entry| entry.value().clone())
    }

    pub fn user(&self, uuid: Uuid) -> Option<UserRecord> {
        self.users.get(&uuid).map(|entry| entry.value().clone())
    }

    /// Make every subsequent save fail until reset
    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    /// Save calls received, failed ones included
    pub fn save_attempts(&self) -> u64 {
        self.save_attempts.load(Ordering::SeqCst)
    }
}

impl Storage for MemoryStorage {
    fn load_group(&self, name: &str) -> StorageFuture<'_, Option<GroupRecord>> {
        let record = self.group(name);
        Box::pin(async move { Ok(record) })
    }

    fn load_user(&self, uuid: Uuid) -> StorageFuture<'_, Option<UserRecord>> {
        let record = self.user(uuid);
        Box::pin(async move { Ok(record) })
    }

    fn save_holder(&self, record: HolderRecord) -> StorageFuture<'_, ()> {
        Box::pin(async move {
            self.save_attempts.fetch_add(1, Ordering::SeqCst);
            if self.fail_saves.load(Ordering::SeqCst) {
                return Err(StorageError::Unavailable("memory storage set to fail".to_string()));
            }
            match record {
                HolderRecord::User(user) => self.insert_user(user),
                HolderRecord::Group(group) => self.insert_group(group),
            }
            Ok(())
        })
    }

    fn delete_group(&self, name: &str) -> StorageFuture<'_, ()> {
        let key = name.trim().to_lowercase();
        Box::pin(async move {
            self.groups.remove(&key);
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Node;

    #[tokio::test]
    async fn test_save_and_load() {
        let storage = MemoryStorage::new();
        let record = GroupRecord {
            name: "admin".to_string(),
            weight: 20,
            nodes: vec![Node::builder("kick").build().unwrap()],
        };

        storage
            .save_holder(HolderRecord::Group(record.clone()))
            .await
            .unwrap();
        assert_eq!(storage.load_group("Admin").await.unwrap(), Some(record));
        assert_eq!(storage.load_user(Uuid::new_v4()).await.unwrap(), None);

        storage.delete_group("admin").await.unwrap();
        assert_eq!(storage.load_group("admin").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_failure_injection() {
        let storage = MemoryStorage::new();
        storage.set_fail_saves(true);

        let record = UserRecord {
            uuid: Uuid::new_v4(),
            name: None,
            nodes: Vec::new(),
        };
        let result = storage.save_holder(HolderRecord::User(record.clone())).await;
        assert!(matches!(result, Err(StorageError::Unavailable(_))));
        assert_eq!(storage.save_attempts(), 1);
        assert!(storage.user(record.uuid).is_none());
    }
}
