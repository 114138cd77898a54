//! # Kanban Core
//!
//! Domain models and optimistic drag-and-drop reordering for kanban boards.
//!
//! A [`Reconciler`] turns drag events into immediate edits of a shared
//! [`BoardCache`], then hands the resulting order to [`PersistenceSync`],
//! which writes it to a [`BoardStore`] in the background. The board keeps its
//! new arrangement whether or not the write succeeds; failures surface as
//! [`Notifications`].

pub mod cache;
pub mod config;
pub mod domain;
pub mod error;
pub mod notify;
pub mod reconcile;
pub mod storage;
pub mod sync;
pub mod telemetry;

// Re-export commonly used types
pub use cache::{BoardCache, CacheEvent, CacheEventKind};
pub use config::{FailurePolicy, SyncConfig};
pub use domain::{
    move_item, Board, BoardId, BoardSummary, BoardUpdate, Column, ColumnColor, ColumnId,
    NewTask, Ordered, Owner, OwnerId, Plan, Subtask, SubtaskId, Task, TaskId,
};
pub use error::{KanbanError, Result};
pub use notify::{Notification, NotificationLevel, Notifications};
pub use reconcile::{ActiveItem, Dispatched, DragItem, Reconciler};
#[cfg(feature = "file-storage")]
pub use storage::file_storage::FileStorage;
pub use storage::{memory_store::MemoryStore, BoardStore};
pub use sync::{PersistenceSync, ReorderRequest, SyncOutcome};
