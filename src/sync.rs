//! Persistence sync: turns confirmed local reorders into store writes.
//!
//! Writes run on the tokio runtime and never block the caller; the drag
//! gesture has already finished visually by the time the store answers.
//! Requests are not queued, so overlapping writes to the same board land in
//! arrival order at the store.

use crate::cache::BoardCache;
use crate::config::{FailurePolicy, SyncConfig};
use crate::domain::{Board, BoardId, ColumnId, TaskId};
use crate::error::Result;
use crate::notify::Notifications;
use crate::storage::BoardStore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::task::JoinHandle;

pub const REORDER_FAILED_MESSAGE: &str = "Unable to save the new order. Please try again later.";

/// An authoritative reorder write
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReorderRequest {
    Columns {
        board_id: BoardId,
        column_ids: Vec<ColumnId>,
    },
    Tasks {
        board_id: BoardId,
        column_id: ColumnId,
        task_ids: Vec<TaskId>,
        /// Set when the task changed columns during the gesture
        moved_task_id: Option<TaskId>,
    },
}

impl ReorderRequest {
    pub fn board_id(&self) -> &BoardId {
        match self {
            Self::Columns { board_id, .. } | Self::Tasks { board_id, .. } => board_id,
        }
    }
}

/// The arrangement to restore if a write fails under `FailurePolicy::Rollback`
#[derive(Debug, Clone)]
pub struct RestorePoint {
    /// Board as it was before the gesture touched the cache
    pub snapshot: Board,
    /// Cache version produced by the optimistic commit
    pub committed_version: u64,
}

/// How the cache was reconciled after a failed write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recovery {
    /// Optimistic arrangement left in place
    Kept,
    RolledBack,
    Refetched,
    /// The board view closed before the response arrived
    Ignored,
    RefetchFailed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    Saved,
    Failed(Recovery),
}

#[derive(Clone)]
pub struct PersistenceSync {
    store: Arc<dyn BoardStore>,
    cache: BoardCache,
    notifications: Notifications,
    policy: FailurePolicy,
}

impl PersistenceSync {
    pub fn new(store: Arc<dyn BoardStore>, cache: BoardCache, notifications: Notifications) -> Self {
        Self {
            store,
            cache,
            notifications,
            policy: FailurePolicy::default(),
        }
    }

    pub fn from_config(
        config: &SyncConfig,
        store: Arc<dyn BoardStore>,
        cache: BoardCache,
    ) -> Self {
        Self::new(store, cache, Notifications::new(config.notification_capacity))
            .with_policy(config.failure_policy)
    }

    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    pub fn cache(&self) -> &BoardCache {
        &self.cache
    }

    pub fn notifications(&self) -> &Notifications {
        &self.notifications
    }

    pub fn store(&self) -> &Arc<dyn BoardStore> {
        &self.store
    }

    /// Loads a board from the store into the cache, replacing any stale copy
    pub async fn open_board(&self, board_id: &BoardId) -> Result<Board> {
        let board = self.store.load_board(board_id).await?;
        self.cache.insert(board.clone());
        Ok(board)
    }

    /// Discards the cached board when its view closes
    pub fn close_board(&self, board_id: &BoardId) {
        self.cache.remove(board_id);
    }

    pub fn persist_column_order(
        &self,
        board_id: BoardId,
        column_ids: Vec<ColumnId>,
    ) -> JoinHandle<SyncOutcome> {
        self.persist(
            ReorderRequest::Columns {
                board_id,
                column_ids,
            },
            None,
        )
    }

    pub fn persist_task_order(
        &self,
        board_id: BoardId,
        column_id: ColumnId,
        task_ids: Vec<TaskId>,
        moved_task_id: Option<TaskId>,
    ) -> JoinHandle<SyncOutcome> {
        self.persist(
            ReorderRequest::Tasks {
                board_id,
                column_id,
                task_ids,
                moved_task_id,
            },
            None,
        )
    }

    /// Sends `request` in the background.
    ///
    /// Must be called from within a tokio runtime. The returned handle may be
    /// dropped; the write still completes.
    pub fn persist(
        &self,
        request: ReorderRequest,
        restore: Option<RestorePoint>,
    ) -> JoinHandle<SyncOutcome> {
        let sync = self.clone();
        tokio::spawn(async move { sync.run(request, restore).await })
    }

    async fn run(self, request: ReorderRequest, restore: Option<RestorePoint>) -> SyncOutcome {
        let board_id = request.board_id().clone();
        let result = match &request {
            ReorderRequest::Columns {
                board_id,
                column_ids,
            } => self.store.reorder_columns(board_id, column_ids).await,
            ReorderRequest::Tasks {
                board_id,
                column_id,
                task_ids,
                moved_task_id,
            } => {
                self.store
                    .reorder_tasks(board_id, column_id, task_ids, moved_task_id.as_ref())
                    .await
            }
        };

        match result {
            Ok(()) => {
                tracing::debug!(board_id = %board_id, ?request, "reorder persisted");
                SyncOutcome::Saved
            }
            Err(e) => {
                tracing::warn!(board_id = %board_id, error = %e, policy = %self.policy, "reorder persistence failed");
                self.notifications
                    .error(Some(board_id.clone()), REORDER_FAILED_MESSAGE);
                SyncOutcome::Failed(self.recover(&board_id, restore).await)
            }
        }
    }

    async fn recover(&self, board_id: &BoardId, restore: Option<RestorePoint>) -> Recovery {
        match self.policy {
            FailurePolicy::Keep => Recovery::Kept,
            FailurePolicy::Rollback => {
                if let Some(point) = restore {
                    if self
                        .cache
                        .restore_if_version(point.committed_version, point.snapshot)
                        .is_some()
                    {
                        tracing::info!(board_id = %board_id, "rolled back optimistic reorder");
                        return Recovery::RolledBack;
                    }
                }
                // A later change superseded the snapshot; only the store knows the truth now
                self.refetch(board_id).await
            }
            FailurePolicy::Refetch => self.refetch(board_id).await,
        }
    }

    async fn refetch(&self, board_id: &BoardId) -> Recovery {
        if !self.cache.contains(board_id) {
            return Recovery::Ignored;
        }

        match self.store.load_board(board_id).await {
            Ok(board) => match self.cache.replace(board) {
                Some(_) => {
                    tracing::info!(board_id = %board_id, "refetched board after failed reorder");
                    Recovery::Refetched
                }
                None => Recovery::Ignored,
            },
            Err(e) => {
                tracing::warn!(board_id = %board_id, error = %e, "refetch after failed reorder also failed");
                Recovery::RefetchFailed
            }
        }
    }
}
