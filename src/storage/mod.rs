use crate::{
    domain::{Board, BoardId, BoardSummary, ColumnId, Owner, OwnerId, TaskId},
    error::Result,
};
use async_trait::async_trait;

#[cfg(feature = "file-storage")]
pub mod file_storage;
pub mod memory_store;

/// The authoritative store for boards.
///
/// Each call is atomic on its own; nothing orders concurrent calls, so the
/// last reorder to arrive wins.
#[async_trait]
pub trait BoardStore: Send + Sync {
    /// Initializes the storage backend
    async fn initialize(&self) -> Result<()>;

    /// Lists all boards
    async fn list_boards(&self) -> Result<Vec<BoardSummary>>;

    /// Creates or overwrites a board
    async fn save_board(&self, board: &Board) -> Result<()>;

    /// Loads a board with columns and tasks sorted by their order
    async fn load_board(&self, id: &BoardId) -> Result<Board>;

    /// Deletes a board. The owner's usage is not refunded.
    async fn delete_board(&self, id: &BoardId) -> Result<()>;

    /// Creates or overwrites an owner account
    async fn save_owner(&self, owner: &Owner) -> Result<()>;

    async fn load_owner(&self, id: &OwnerId) -> Result<Owner>;

    /// Stores a new board for `owner_id` and counts it against the owner's
    /// quota. Fails with `UsageExceeded` at the limit, leaving both untouched.
    /// Returns the owner with its updated usage.
    async fn create_board(&self, owner_id: &OwnerId, board: &Board) -> Result<Owner>;

    /// Replaces a board's column order with the given complete id list
    async fn reorder_columns(&self, board_id: &BoardId, ordered: &[ColumnId]) -> Result<()>;

    /// Replaces one column's task order, first moving `moved_task` into the
    /// column when it currently belongs to another one
    async fn reorder_tasks(
        &self,
        board_id: &BoardId,
        column_id: &ColumnId,
        ordered: &[TaskId],
        moved_task: Option<&TaskId>,
    ) -> Result<()>;

    /// Checks if the store is ready for use
    async fn is_initialized(&self) -> bool;
}
