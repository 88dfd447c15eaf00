use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::local::{LocalRecordStore, PendingSync};
use super::repo::RecordStore;
use super::repo_types::Record;
use crate::store::{with_timeout, StoreError};

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SavedTo {
    Remote,
    Local,
}

#[derive(Debug, Clone)]
pub struct Saved {
    pub record: Record,
    pub saved_to: SavedTo,
}

/// Both the remote store and the local fallback rejected the operation.
#[derive(Debug, Error)]
#[error("save failed, please retry")]
pub struct BothStoresFailed {
    pub remote: StoreError,
    pub local: StoreError,
}

/// Remote-first record persistence with the local file as the fallback target.
///
/// Successful remote writes are mirrored locally. Writes that only reached the
/// local file are remembered as pending and replayed on the next call that finds
/// the remote reachable; until then the local copy wins over the remote one.
pub struct RecordService {
    remote: Arc<dyn RecordStore>,
    local: Arc<LocalRecordStore>,
    timeout: Duration,
}

impl RecordService {
    pub fn new(remote: Arc<dyn RecordStore>, local: Arc<LocalRecordStore>, timeout: Duration) -> Self {
        Self {
            remote,
            local,
            timeout,
        }
    }

    pub async fn save(&self, user_id: Uuid, record: &Record) -> Result<Saved, BothStoresFailed> {
        let remote = with_timeout(self.timeout, self.remote.save(user_id, record)).await;
        self.settle(user_id, remote, || self.local.save(user_id, record))
            .await
    }

    pub async fn update(
        &self,
        id: Uuid,
        user_id: Uuid,
        record: &Record,
    ) -> Result<Saved, BothStoresFailed> {
        // a record created offline is unknown remotely; the upsert path covers both cases
        let remote = if self.local.pending(user_id).await.upserts.contains(&id) {
            let mut record = record.clone();
            record.id = id;
            with_timeout(self.timeout, self.remote.save(user_id, &record)).await
        } else {
            with_timeout(self.timeout, self.remote.update(id, user_id, record)).await
        };
        self.settle(user_id, remote, || self.local.update(id, user_id, record))
            .await
    }

    async fn settle<F, Fut>(
        &self,
        user_id: Uuid,
        remote: Result<Record, StoreError>,
        local: F,
    ) -> Result<Saved, BothStoresFailed>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<Record, StoreError>>,
    {
        match remote {
            Ok(record) => {
                if let Err(e) = self.local.save(user_id, &record).await {
                    warn!(error = %e, record_id = %record.id, "local mirror write failed");
                }
                if let Err(e) = self.local.mark_synced(user_id, record.id).await {
                    warn!(error = %e, record_id = %record.id, "clearing pending mark failed");
                }
                info!(record_id = %record.id, %user_id, "record saved remotely");
                Ok(Saved {
                    record,
                    saved_to: SavedTo::Remote,
                })
            }
            Err(remote_err) => {
                warn!(error = %remote_err, %user_id, "remote save failed; falling back to local storage");
                let saved = match local().await {
                    Ok(record) => self
                        .local
                        .mark_upsert(user_id, record.id)
                        .await
                        .map(|_| record),
                    Err(e) => Err(e),
                };
                match saved {
                    Ok(record) => {
                        info!(record_id = %record.id, %user_id, "record saved locally");
                        Ok(Saved {
                            record,
                            saved_to: SavedTo::Local,
                        })
                    }
                    Err(local_err) => {
                        error!(remote = %remote_err, local = %local_err, %user_id, "record save failed on both stores");
                        Err(BothStoresFailed {
                            remote: remote_err,
                            local: local_err,
                        })
                    }
                }
            }
        }
    }

    /// Pushes local-only changes to the remote store. Stops at the first remote
    /// failure; whatever is left stays pending for the next attempt.
    async fn replay_pending(&self, user_id: Uuid) -> PendingSync {
        let pending = self.local.pending(user_id).await;
        if pending.is_empty() {
            return pending;
        }

        for &id in &pending.deletes {
            match with_timeout(self.timeout, self.remote.delete(id, user_id)).await {
                Ok(_) => {
                    if let Err(e) = self.local.mark_synced(user_id, id).await {
                        warn!(error = %e, record_id = %id, "clearing pending delete failed");
                    }
                }
                Err(e) => {
                    debug!(error = %e, %user_id, "remote still unavailable; replay deferred");
                    return self.local.pending(user_id).await;
                }
            }
        }

        for &id in &pending.upserts {
            let Ok(Some(record)) = self.local.get(id, user_id).await else {
                // nothing local to push any more
                if let Err(e) = self.local.mark_synced(user_id, id).await {
                    warn!(error = %e, record_id = %id, "clearing pending upsert failed");
                }
                continue;
            };
            match with_timeout(self.timeout, self.remote.save(user_id, &record)).await {
                Ok(_) => {
                    if let Err(e) = self.local.mark_synced(user_id, id).await {
                        warn!(error = %e, record_id = %id, "clearing pending upsert failed");
                    }
                }
                Err(e) => {
                    debug!(error = %e, %user_id, "remote still unavailable; replay deferred");
                    break;
                }
            }
        }

        let left = self.local.pending(user_id).await;
        info!(
            %user_id,
            remaining = left.upserts.len() + left.deletes.len(),
            "pending local changes replayed"
        );
        left
    }

    /// Newest first. Local copies that the remote has not seen yet win over the
    /// remote ones, and pending deletes are hidden.
    pub async fn list(&self, user_id: Uuid) -> Vec<Record> {
        let pending = self.replay_pending(user_id).await;
        let local = self.local.list(user_id).await.unwrap_or_default();
        let mut all = match with_timeout(self.timeout, self.remote.list(user_id)).await {
            Ok(remote) => merge(remote, local, &pending),
            Err(e) => {
                warn!(error = %e, %user_id, "remote list failed; reading local storage");
                local
            }
        };
        all.retain(|r| !pending.deletes.contains(&r.id));
        all.sort_by(|a, b| b.date.cmp(&a.date));
        all
    }

    pub async fn get(&self, id: Uuid, user_id: Uuid) -> Option<Record> {
        let pending = self.replay_pending(user_id).await;
        if pending.deletes.contains(&id) {
            return None;
        }
        if !pending.upserts.contains(&id) {
            match with_timeout(self.timeout, self.remote.get(id, user_id)).await {
                Ok(Some(r)) => return Some(r),
                Ok(None) => {}
                Err(e) => warn!(error = %e, record_id = %id, "remote get failed; reading local storage"),
            }
        }
        self.local.get(id, user_id).await.ok().flatten()
    }

    /// Removes the record from both stores. Deleting an absent id is not an error.
    /// A delete that only reached the local file is replayed remotely later.
    pub async fn delete(&self, id: Uuid, user_id: Uuid) -> Result<bool, BothStoresFailed> {
        let remote = with_timeout(self.timeout, self.remote.delete(id, user_id)).await;
        let local = self.local.delete(id, user_id).await;
        match (remote, local) {
            (Err(remote), Err(local)) => {
                error!(remote = %remote, local = %local, record_id = %id, "record delete failed on both stores");
                Err(BothStoresFailed { remote, local })
            }
            (remote, local) => {
                let mark = match &remote {
                    Ok(_) => self.local.mark_synced(user_id, id).await,
                    Err(e) => {
                        warn!(error = %e, record_id = %id, "remote delete failed; removed locally");
                        self.local.mark_delete(user_id, id).await
                    }
                };
                if let Err(e) = mark {
                    warn!(error = %e, record_id = %id, "updating pending delete failed");
                }
                if let Err(e) = &local {
                    warn!(error = %e, record_id = %id, "local delete failed; removed remotely");
                }
                let removed = matches!(remote, Ok(true)) || matches!(local, Ok(true));
                info!(record_id = %id, %user_id, removed, "record deleted");
                Ok(removed)
            }
        }
    }
}

/// Remote listing with pending local copies substituted and local-only records added.
fn merge(remote: Vec<Record>, local: Vec<Record>, pending: &PendingSync) -> Vec<Record> {
    let mut local_by_id: HashMap<Uuid, Record> = local.into_iter().map(|r| (r.id, r)).collect();
    let mut merged: Vec<Record> = remote
        .into_iter()
        .map(|r| match local_by_id.remove(&r.id) {
            Some(l) if pending.upserts.contains(&l.id) => l,
            _ => r,
        })
        .collect();
    merged.extend(local_by_id.into_values());
    merged
}
