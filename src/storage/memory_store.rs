//! In-memory board store.
//!
//! Useful for tests and short-lived sessions. Fault injection makes every
//! call fail with `RemoteUnavailable` while enabled, which stands in for a
//! network outage in front of a real store.

use crate::{
    domain::{Board, BoardId, BoardSummary, ColumnId, Owner, OwnerId, TaskId},
    error::{KanbanError, Result},
    storage::BoardStore,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Clone, Default)]
pub struct MemoryStore {
    boards: Arc<RwLock<HashMap<BoardId, Board>>>,
    owners: Arc<RwLock<HashMap<OwnerId, Owner>>>,
    unavailable: Arc<AtomicBool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggles simulated outage for every subsequent call
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(KanbanError::RemoteUnavailable(
                "memory store is offline".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl BoardStore for MemoryStore {
    async fn initialize(&self) -> Result<()> {
        Ok(())
    }

    async fn list_boards(&self) -> Result<Vec<BoardSummary>> {
        self.check_available()?;
        let boards = self.boards.read().await;
        let mut summaries: Vec<BoardSummary> = boards.values().map(Board::summary).collect();
        summaries.sort_by(|a, b| a.title.to_lowercase().cmp(&b.title.to_lowercase()));
        Ok(summaries)
    }

    async fn save_board(&self, board: &Board) -> Result<()> {
        self.check_available()?;
        let mut stored = board.clone();
        stored.normalize();
        self.boards.write().await.insert(stored.id.clone(), stored);
        Ok(())
    }

    async fn load_board(&self, id: &BoardId) -> Result<Board> {
        self.check_available()?;
        self.boards
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| KanbanError::BoardNotFound(id.to_string()))
    }

    async fn delete_board(&self, id: &BoardId) -> Result<()> {
        self.check_available()?;
        self.boards
            .write()
            .await
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| KanbanError::BoardNotFound(id.to_string()))
    }

    async fn save_owner(&self, owner: &Owner) -> Result<()> {
        self.check_available()?;
        self.owners
            .write()
            .await
            .insert(owner.id.clone(), owner.clone());
        Ok(())
    }

    async fn load_owner(&self, id: &OwnerId) -> Result<Owner> {
        self.check_available()?;
        self.owners
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| KanbanError::OwnerNotFound(id.to_string()))
    }

    async fn create_board(&self, owner_id: &OwnerId, board: &Board) -> Result<Owner> {
        self.check_available()?;
        // Owners before boards; nothing else takes both locks
        let mut owners = self.owners.write().await;
        let mut boards = self.boards.write().await;

        let owner = owners
            .get_mut(owner_id)
            .ok_or_else(|| KanbanError::OwnerNotFound(owner_id.to_string()))?;
        if boards.contains_key(&board.id) {
            return Err(KanbanError::StorageError(format!(
                "board {} already exists",
                board.id
            )));
        }
        owner.record_board_created()?;

        let mut stored = board.clone();
        stored.owner_id = Some(owner_id.clone());
        stored.normalize();
        boards.insert(stored.id.clone(), stored);
        Ok(owner.clone())
    }

    async fn reorder_columns(&self, board_id: &BoardId, ordered: &[ColumnId]) -> Result<()> {
        self.check_available()?;
        let mut boards = self.boards.write().await;
        let board = boards
            .get_mut(board_id)
            .ok_or_else(|| KanbanError::BoardNotFound(board_id.to_string()))?;
        board.apply_column_order(ordered)
    }

    async fn reorder_tasks(
        &self,
        board_id: &BoardId,
        column_id: &ColumnId,
        ordered: &[TaskId],
        moved_task: Option<&TaskId>,
    ) -> Result<()> {
        self.check_available()?;
        let mut boards = self.boards.write().await;
        let board = boards
            .get_mut(board_id)
            .ok_or_else(|| KanbanError::BoardNotFound(board_id.to_string()))?;
        board.apply_task_order(column_id, ordered, moved_task)
    }

    async fn is_initialized(&self) -> bool {
        true
    }
}
