use std::collections::BTreeSet;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::repo::RecordStore;
use super::repo_types::Record;
use crate::store::{LocalStore, StoreResult};

/// Changes that only reached this host and still have to be replayed remotely.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct PendingSync {
    /// Ids whose local copy is newer than (or missing from) the remote store.
    pub upserts: BTreeSet<Uuid>,
    /// Ids deleted here while the remote still holds them.
    pub deletes: BTreeSet<Uuid>,
}

impl PendingSync {
    pub fn is_empty(&self) -> bool {
        self.upserts.is_empty() && self.deletes.is_empty()
    }
}

/// Ordered per-user record list kept as a JSON array on disk, plus the
/// per-user set of changes the remote store has not seen yet.
pub struct LocalRecordStore {
    files: LocalStore,
    // serialises read-modify-write cycles on the same files
    write_lock: Mutex<()>,
}

impl LocalRecordStore {
    pub fn new(files: LocalStore) -> Self {
        Self {
            files,
            write_lock: Mutex::new(()),
        }
    }

    fn key(user_id: Uuid) -> String {
        format!("records-{user_id}")
    }

    fn pending_key(user_id: Uuid) -> String {
        format!("pending-{user_id}")
    }

    async fn load(&self, user_id: Uuid) -> Vec<Record> {
        self.files.load(&Self::key(user_id)).await
    }

    /// Replaces the entry with the same id in place, or appends.
    async fn upsert(&self, user_id: Uuid, record: &Record) -> StoreResult<Record> {
        let _guard = self.write_lock.lock().await;
        let mut all: Vec<Record> = self.files.try_load(&Self::key(user_id)).await?;
        match all.iter_mut().find(|r| r.id == record.id) {
            Some(slot) => *slot = record.clone(),
            None => all.push(record.clone()),
        }
        self.files.save(&Self::key(user_id), &all).await?;
        Ok(record.clone())
    }

    pub async fn pending(&self, user_id: Uuid) -> PendingSync {
        self.files.load(&Self::pending_key(user_id)).await
    }

    async fn edit_pending<F>(&self, user_id: Uuid, edit: F) -> StoreResult<()>
    where
        F: FnOnce(&mut PendingSync),
    {
        let _guard = self.write_lock.lock().await;
        let key = Self::pending_key(user_id);
        let mut pending: PendingSync = self.files.try_load(&key).await?;
        let before = pending.clone();
        edit(&mut pending);
        if pending != before {
            self.files.save(&key, &pending).await?;
        }
        Ok(())
    }

    /// The local copy of `id` is ahead of the remote one.
    pub async fn mark_upsert(&self, user_id: Uuid, id: Uuid) -> StoreResult<()> {
        self.edit_pending(user_id, |p| {
            p.deletes.remove(&id);
            p.upserts.insert(id);
        })
        .await
    }

    /// `id` was deleted here but may still exist remotely.
    pub async fn mark_delete(&self, user_id: Uuid, id: Uuid) -> StoreResult<()> {
        self.edit_pending(user_id, |p| {
            p.upserts.remove(&id);
            p.deletes.insert(id);
        })
        .await
    }

    /// Remote and local agree on `id` again.
    pub async fn mark_synced(&self, user_id: Uuid, id: Uuid) -> StoreResult<()> {
        self.edit_pending(user_id, |p| {
            p.upserts.remove(&id);
            p.deletes.remove(&id);
        })
        .await
    }
}

#[async_trait]
impl RecordStore for LocalRecordStore {
    async fn save(&self, user_id: Uuid, record: &Record) -> StoreResult<Record> {
        self.upsert(user_id, record).await
    }

    async fn list(&self, user_id: Uuid) -> StoreResult<Vec<Record>> {
        Ok(self.load(user_id).await)
    }

    async fn get(&self, id: Uuid, user_id: Uuid) -> StoreResult<Option<Record>> {
        Ok(self.load(user_id).await.into_iter().find(|r| r.id == id))
    }

    /// The local list is a mirror and may never have seen this id; update inserts it then.
    async fn update(&self, id: Uuid, user_id: Uuid, record: &Record) -> StoreResult<Record> {
        let mut record = record.clone();
        record.id = id;
        self.upsert(user_id, &record).await
    }

    async fn delete(&self, id: Uuid, user_id: Uuid) -> StoreResult<bool> {
        let _guard = self.write_lock.lock().await;
        let mut all: Vec<Record> = self.files.try_load(&Self::key(user_id)).await?;
        let before = all.len();
        all.retain(|r| r.id != id);
        if all.len() == before {
            return Ok(false);
        }
        self.files.save(&Self::key(user_id), &all).await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use time::OffsetDateTime;

    use super::*;
    use crate::records::repo_types::{CupSize, Mood, SugarTier};

    fn record(name: &str) -> Record {
        Record {
            id: Uuid::now_v7(),
            drink_name: name.into(),
            brand: "custom".into(),
            product_id: None,
            calories: 200,
            cup_size: CupSize::Medium,
            sugar_level: SugarTier::Half,
            sugar_percent: 50,
            mood: Mood::Happy,
            notes: String::new(),
            date: OffsetDateTime::now_utc(),
            timestamp: 0,
        }
    }

    #[tokio::test]
    async fn save_twice_keeps_single_entry() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalRecordStore::new(LocalStore::new(dir.path()));
        let user = Uuid::new_v4();
        let mut r = record("A");
        store.save(user, &r).await.unwrap();
        r.calories = 321;
        store.save(user, &r).await.unwrap();
        let all = store.list(user).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].calories, 321);
    }

    #[tokio::test]
    async fn preserves_insertion_order_and_user_isolation() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalRecordStore::new(LocalStore::new(dir.path()));
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        store.save(alice, &record("first")).await.unwrap();
        store.save(alice, &record("second")).await.unwrap();
        store.save(bob, &record("bob's")).await.unwrap();
        let names: Vec<_> = store
            .list(alice)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.drink_name)
            .collect();
        assert_eq!(names, vec!["first", "second"]);
        assert_eq!(store.list(bob).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalRecordStore::new(LocalStore::new(dir.path()));
        let user = Uuid::new_v4();
        let keep = record("keep");
        let drop = record("drop");
        store.save(user, &keep).await.unwrap();
        store.save(user, &drop).await.unwrap();

        assert!(store.delete(drop.id, user).await.unwrap());
        assert!(!store.delete(drop.id, user).await.unwrap());
        let left = store.list(user).await.unwrap();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].id, keep.id);
    }

    #[tokio::test]
    async fn survives_restart() {
        let dir = tempfile::tempdir().unwrap();
        let user = Uuid::new_v4();
        let r = record("persisted");
        LocalRecordStore::new(LocalStore::new(dir.path()))
            .save(user, &r)
            .await
            .unwrap();
        let reopened = LocalRecordStore::new(LocalStore::new(dir.path()));
        assert_eq!(reopened.get(r.id, user).await.unwrap(), Some(r));
    }

    #[tokio::test]
    async fn unreadable_file_is_not_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let user = Uuid::new_v4();
        let path = dir.path().join(format!("records-{user}.json"));
        std::fs::create_dir(&path).unwrap();
        let store = LocalRecordStore::new(LocalStore::new(dir.path()));

        assert!(store.save(user, &record("new")).await.is_err());
        assert!(store.delete(Uuid::new_v4(), user).await.is_err());
        assert!(path.is_dir());
    }

    #[tokio::test]
    async fn pending_marks_replace_each_other() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalRecordStore::new(LocalStore::new(dir.path()));
        let user = Uuid::new_v4();
        let id = Uuid::now_v7();

        store.mark_upsert(user, id).await.unwrap();
        assert!(store.pending(user).await.upserts.contains(&id));

        store.mark_delete(user, id).await.unwrap();
        let pending = store.pending(user).await;
        assert!(pending.deletes.contains(&id));
        assert!(!pending.upserts.contains(&id));

        store.mark_synced(user, id).await.unwrap();
        assert!(store.pending(user).await.is_empty());
    }

    #[tokio::test]
    async fn malformed_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let user = Uuid::new_v4();
        std::fs::write(dir.path().join(format!("records-{user}.json")), b"[{oops").unwrap();
        let store = LocalRecordStore::new(LocalStore::new(dir.path()));
        assert!(store.list(user).await.unwrap().is_empty());
        store.save(user, &record("fresh")).await.unwrap();
        assert_eq!(store.list(user).await.unwrap().len(), 1);
    }
}
