/*!
 * Persistence Queue
 *
 * Mutations enqueue a holder snapshot and return immediately. A single tokio
 * worker drains the channel in order, retrying each save a fixed number of
 * times. In-memory state is never rolled back on failure.
 */

use super::traits::{HolderRecord, Storage};
use crate::core::errors::StorageError;
use crate::holder::HolderId;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tokio::sync::oneshot::error::TryRecvError;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Operation applied by the worker
#[derive(Debug, Clone)]
enum PersistOp {
    Save(HolderRecord),
    DeleteGroup(String),
}

impl PersistOp {
    fn target(&self) -> HolderId {
        match self {
            PersistOp::Save(record) => record.id(),
            PersistOp::DeleteGroup(name) => HolderId::group(name),
        }
    }
}

struct SaveRequest {
    op: PersistOp,
    reply: oneshot::Sender<Result<(), StorageError>>,
}

/// Sending side of the persistence worker
#[derive(Clone)]
pub struct PersistenceQueue {
    tx: flume::Sender<SaveRequest>,
}

impl PersistenceQueue {
    /// Start the worker on the current tokio runtime
    ///
    /// The worker exits once every queue handle is dropped and the backlog is
    /// drained.
    pub fn spawn(
        storage: Arc<dyn Storage>,
        attempts: u32,
        retry_delay: Duration,
    ) -> Result<(Self, JoinHandle<()>), StorageError> {
        let handle = Handle::try_current()
            .map_err(|_| StorageError::Unavailable("no tokio runtime for persistence".to_string()))?;

        let (tx, rx) = flume::unbounded::<SaveRequest>();
        let worker = handle.spawn(async move {
            info!("Persistence worker started");
            while let Ok(request) = rx.recv_async().await {
                let result =
                    apply_with_retry(storage.as_ref(), &request.op, attempts, retry_delay).await;
                // Receiver may have been dropped, that only means nobody waits
                let _ = request.reply.send(result);
            }
            info!("Persistence worker stopped");
        });

        Ok((Self { tx }, worker))
    }

    /// Queue a snapshot; never blocks
    pub fn enqueue(&self, record: HolderRecord) -> PendingSave {
        self.submit(PersistOp::Save(record))
    }

    /// Queue removal of a group record behind any pending saves for it
    pub fn enqueue_delete(&self, group: &str) -> PendingSave {
        self.submit(PersistOp::DeleteGroup(group.to_string()))
    }

    fn submit(&self, op: PersistOp) -> PendingSave {
        let target = op.target();
        let (reply, rx) = oneshot::channel();
        match self.tx.send(SaveRequest { op, reply }) {
            Ok(()) => PendingSave {
                target,
                state: PendingState::Waiting(rx),
            },
            Err(_) => PendingSave {
                target,
                state: PendingState::Done(Err(StorageError::QueueClosed)),
            },
        }
    }

    /// Saves waiting for the worker
    pub fn backlog(&self) -> usize {
        self.tx.len()
    }
}

impl fmt::Debug for PersistenceQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PersistenceQueue")
            .field("backlog", &self.backlog())
            .finish()
    }
}

async fn apply_with_retry(
    storage: &dyn Storage,
    op: &PersistOp,
    attempts: u32,
    retry_delay: Duration,
) -> Result<(), StorageError> {
    let target = op.target();
    let attempts = attempts.max(1);
    let mut last_error = StorageError::QueueClosed;

    for attempt in 1..=attempts {
        let result = match op {
            PersistOp::Save(record) => storage.save_holder(record.clone()).await,
            PersistOp::DeleteGroup(name) => storage.delete_group(name).await,
        };
        match result {
            Ok(()) => {
                debug!(%target, attempt, "Persisted holder");
                return Ok(());
            }
            Err(err) => {
                warn!(%target, attempt, attempts, error = %err, "Save attempt failed");
                last_error = err;
                if attempt < attempts {
                    tokio::time::sleep(retry_delay).await;
                }
            }
        }
    }

    error!(%target, attempts, error = %last_error, "Giving up on save, change kept in memory only");
    Err(StorageError::SaveFailed {
        target: target.to_string(),
        reason: last_error.to_string(),
    })
}

enum PendingState {
    Waiting(oneshot::Receiver<Result<(), StorageError>>),
    Done(Result<(), StorageError>),
}

/// Handle on a queued save
pub struct PendingSave {
    target: HolderId,
    state: PendingState,
}

impl PendingSave {
    pub fn target(&self) -> &HolderId {
        &self.target
    }

    /// Wait for the worker's final answer
    pub async fn wait(self) -> Result<(), StorageError> {
        match self.state {
            PendingState::Done(result) => result,
            PendingState::Waiting(rx) => rx.await.unwrap_or(Err(StorageError::QueueClosed)),
        }
    }

    /// Blocking variant of [`PendingSave::wait`]
    ///
    /// Must not be called from inside an async context.
    pub fn blocking_wait(self) -> Result<(), StorageError> {
        match self.state {
            PendingState::Done(result) => result,
            PendingState::Waiting(rx) => rx.blocking_recv().unwrap_or(Err(StorageError::QueueClosed)),
        }
    }

    /// Result if the save already finished
    pub fn try_result(&mut self) -> Option<Result<(), StorageError>> {
        let result = match &mut self.state {
            PendingState::Done(result) => return Some(result.clone()),
            PendingState::Waiting(rx) => match rx.try_recv() {
                Ok(result) => result,
                Err(TryRecvError::Empty) => return None,
                Err(TryRecvError::Closed) => Err(StorageError::QueueClosed),
            },
        };
        self.state = PendingState::Done(result.clone());
        Some(result)
    }
}

impl fmt::Debug for PendingSave {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match &self.state {
            PendingState::Waiting(_) => "waiting",
            PendingState::Done(Ok(())) => "saved",
            PendingState::Done(Err(_)) => "failed",
        };
        f.debug_struct("PendingSave")
            .field("target", &self.target)
            .field("state", &state)
            .finish()
    }
}
