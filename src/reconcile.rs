//! Drag-and-drop reorder reconciliation.
//!
//! A gesture moves `Idle → Dragging → Idle`. Hovering a task over another
//! column moves it there immediately, so it visibly lands before the pointer
//! is released; same-column and column moves are applied on drop. Each
//! change is one cache mutation, so a task is never observed in zero or two
//! columns. Drops that change anything are handed to [`PersistenceSync`].

use crate::cache::BoardCache;
use crate::domain::ordering::move_item;
use crate::domain::{Board, BoardId, Column, ColumnId, Task, TaskId};
use crate::sync::{PersistenceSync, ReorderRequest, RestorePoint, SyncOutcome};
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;

/// A draggable item or drop target, as reported by the drag input layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "itemType", rename_all = "lowercase")]
pub enum DragItem {
    /// A column header, or the column's background as a drop zone
    Column {
        #[serde(rename = "itemId")]
        id: ColumnId,
    },
    Task {
        #[serde(rename = "itemId")]
        id: TaskId,
        #[serde(rename = "containerId")]
        column_id: ColumnId,
    },
}

impl DragItem {
    pub fn column(id: impl Into<ColumnId>) -> Self {
        Self::Column { id: id.into() }
    }

    pub fn task(id: impl Into<TaskId>, column_id: impl Into<ColumnId>) -> Self {
        Self::Task {
            id: id.into(),
            column_id: column_id.into(),
        }
    }
}

/// What the user picked up
#[derive(Debug, Clone, PartialEq)]
pub enum ActiveItem {
    Column {
        column: Column,
    },
    Task {
        task: Task,
        /// Column the task sits in now, following cross-column hovers
        source_column_id: ColumnId,
    },
}

#[derive(Debug, Clone)]
pub struct DragSession {
    active: ActiveItem,
    /// Task column and index at drag-start
    origin: Option<(ColumnId, usize)>,
    /// Board before the gesture touched the cache
    snapshot: Board,
    crossed_columns: bool,
    /// Cache version written by the latest hover move
    last_version: Option<u64>,
}

impl DragSession {
    pub fn active(&self) -> &ActiveItem {
        &self.active
    }

    pub fn crossed_columns(&self) -> bool {
        self.crossed_columns
    }
}

#[derive(Debug, Clone, Default)]
pub enum DragState {
    #[default]
    Idle,
    Dragging(DragSession),
}

/// A reorder handed to persistence on drop
#[derive(Debug)]
pub struct Dispatched {
    pub request: ReorderRequest,
    pub handle: JoinHandle<SyncOutcome>,
}

/// Drives drag gestures on one open board
pub struct Reconciler {
    board_id: BoardId,
    sync: PersistenceSync,
    state: DragState,
}

impl Reconciler {
    pub fn new(board_id: BoardId, sync: PersistenceSync) -> Self {
        Self {
            board_id,
            sync,
            state: DragState::Idle,
        }
    }

    pub fn board_id(&self) -> &BoardId {
        &self.board_id
    }

    pub fn state(&self) -> &DragState {
        &self.state
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging(_))
    }

    pub fn active(&self) -> Option<&ActiveItem> {
        match &self.state {
            DragState::Dragging(session) => Some(session.active()),
            DragState::Idle => None,
        }
    }

    fn cache(&self) -> &BoardCache {
        self.sync.cache()
    }

    /// Picks up a column or task. Returns false, staying idle, when the item
    /// is not on the cached board.
    pub fn drag_start(&mut self, item: &DragItem) -> bool {
        // An unfinished gesture never got its drop
        self.cancel();

        let Some(board) = self.cache().get(&self.board_id) else {
            tracing::debug!(board_id = %self.board_id, "drag started on a board that is not loaded");
            return false;
        };

        let (active, origin) = match item {
            DragItem::Column { id } => match board.find_column(id) {
                Some(column) => (
                    ActiveItem::Column {
                        column: column.clone(),
                    },
                    None,
                ),
                None => return false,
            },
            DragItem::Task { id, .. } => {
                let Some(loc) = board.locate_task(id) else {
                    return false;
                };
                let column = &board.columns[loc.column_index];
                (
                    ActiveItem::Task {
                        task: column.tasks[loc.task_index].clone(),
                        source_column_id: column.id.clone(),
                    },
                    Some((column.id.clone(), loc.task_index)),
                )
            }
        };

        tracing::debug!(board_id = %self.board_id, ?item, "drag started");
        self.state = DragState::Dragging(DragSession {
            active,
            origin,
            snapshot: board,
            crossed_columns: false,
            last_version: None,
        });
        true
    }

    /// Handles the pointer passing over a candidate target.
    ///
    /// Only a task entering another column changes the board here.
    pub fn drag_over(&mut self, over: Option<&DragItem>) {
        let DragState::Dragging(session) = &mut self.state else {
            return;
        };
        let Some(over) = over else {
            return;
        };
        let ActiveItem::Task {
            task,
            source_column_id,
        } = &mut session.active
        else {
            return;
        };
        if matches!(over, DragItem::Task { id, .. } if *id == task.id) {
            return;
        }

        let task_id = task.id.clone();
        let mut landed_in = None;
        let version = self.sync.cache().set(&self.board_id, |board| {
            let (target, before) = drop_target(board, over)?;
            if board.column_of_task(&task_id)? == &target {
                return None;
            }
            let next = splice_task(board, &task_id, &target, before.as_ref())?;
            landed_in = Some(target);
            Some(next)
        });

        if let (Some(version), Some(column_id)) = (version, landed_in) {
            tracing::debug!(board_id = %self.board_id, task_id = %task_id, column_id = %column_id, "task moved across columns on hover");
            *source_column_id = column_id;
            session.crossed_columns = true;
            session.last_version = Some(version);
        }
    }

    /// Finishes the gesture over `over` (or over nothing).
    ///
    /// Returns the dispatched write when the drop changed the arrangement.
    pub fn drag_end(&mut self, over: Option<&DragItem>) -> Option<Dispatched> {
        let DragState::Dragging(session) = std::mem::take(&mut self.state) else {
            return None;
        };
        let Some(over) = over else {
            tracing::debug!(board_id = %self.board_id, "dropped outside any target");
            self.discard(session);
            return None;
        };

        let DragSession {
            active,
            origin,
            snapshot,
            crossed_columns,
            last_version,
        } = session;

        let dispatched = match active {
            ActiveItem::Column { column } => self.drop_column(&column, over, &snapshot),
            ActiveItem::Task { task, .. } => {
                self.drop_task(&task, over, origin, crossed_columns, &snapshot)
            }
        };
        if dispatched.is_none() {
            // Nothing will reach the store, so a hover move must not outlive the gesture
            self.revert(last_version, snapshot);
        }
        dispatched
    }

    /// Abandons the gesture, undoing any hover move it made
    pub fn cancel(&mut self) {
        if let DragState::Dragging(session) = std::mem::take(&mut self.state) {
            self.discard(session);
        }
    }

    fn drop_column(&self, column: &Column, over: &DragItem, snapshot: &Board) -> Option<Dispatched> {
        let mut column_ids = Vec::new();
        let version = self.cache().set(&self.board_id, |board| {
            let target = match over {
                DragItem::Column { id } => id.clone(),
                DragItem::Task { id, column_id } => board
                    .column_of_task(id)
                    .cloned()
                    .unwrap_or_else(|| column_id.clone()),
            };
            let from = board.column_index(&column.id)?;
            let to = board.column_index(&target)?;
            if from == to {
                return None;
            }

            let mut next = board.clone();
            next.columns = move_item(&board.columns, from, to);
            column_ids = next.column_ids();
            Some(next)
        })?;

        Some(self.dispatch(
            ReorderRequest::Columns {
                board_id: self.board_id.clone(),
                column_ids,
            },
            snapshot,
            version,
        ))
    }

    fn drop_task(
        &self,
        task: &Task,
        over: &DragItem,
        origin: Option<(ColumnId, usize)>,
        crossed_columns: bool,
        snapshot: &Board,
    ) -> Option<Dispatched> {
        let mut crossed = crossed_columns;
        let mut arranged = None;
        let version = self.cache().set(&self.board_id, |board| {
            let (target, before) = drop_target(board, over)?;
            let current = board.column_of_task(&task.id)?;

            let next = if current != &target {
                crossed = true;
                splice_task(board, &task.id, &target, before.as_ref())?
            } else {
                let column_index = board.column_index(&target)?;
                let column = &board.columns[column_index];
                let from = column.task_index(&task.id)?;
                let to = match &before {
                    Some(id) => column.task_index(id)?,
                    None => column.tasks.len().saturating_sub(1),
                };
                let mut next = board.clone();
                next.columns[column_index].tasks = move_item(&column.tasks, from, to);
                next
            };

            let (index, task_ids) = {
                let column = next.find_column(&target)?;
                (column.task_index(&task.id)?, column.task_ids())
            };
            if !crossed && origin.as_ref() == Some(&(target.clone(), index)) {
                return None;
            }
            arranged = Some((target, task_ids));
            Some(next)
        });

        let (Some(version), Some((column_id, task_ids))) = (version, arranged) else {
            tracing::trace!(board_id = %self.board_id, task_id = %task.id, "drop left task in place");
            return None;
        };

        Some(self.dispatch(
            ReorderRequest::Tasks {
                board_id: self.board_id.clone(),
                column_id,
                task_ids,
                moved_task_id: crossed.then(|| task.id.clone()),
            },
            snapshot,
            version,
        ))
    }

    fn dispatch(&self, request: ReorderRequest, snapshot: &Board, version: u64) -> Dispatched {
        tracing::debug!(board_id = %self.board_id, ?request, "dispatching reorder");
        let handle = self.sync.persist(
            request.clone(),
            Some(RestorePoint {
                snapshot: snapshot.clone(),
                committed_version: version,
            }),
        );
        Dispatched { request, handle }
    }

    fn discard(&self, session: DragSession) {
        self.revert(session.last_version, session.snapshot);
    }

    fn revert(&self, last_version: Option<u64>, snapshot: Board) {
        let Some(version) = last_version else {
            return;
        };
        if self.cache().restore_if_version(version, snapshot).is_some() {
            tracing::debug!(board_id = %self.board_id, "reverted hover move");
        }
    }
}

/// Resolves a hovered item to `(column, task to insert before)`. A task
/// target is located on the board, falling back to its reported container.
fn drop_target(board: &Board, over: &DragItem) -> Option<(ColumnId, Option<TaskId>)> {
    match over {
        DragItem::Column { id } => board.find_column(id).map(|c| (c.id.clone(), None)),
        DragItem::Task { id, column_id } => match board.column_of_task(id) {
            Some(column) => Some((column.clone(), Some(id.clone()))),
            None => board.find_column(column_id).map(|c| (c.id.clone(), None)),
        },
    }
}

/// Moves a task into another column, before `before` or at the end.
/// Returns `None` when the task already sits in `target`.
fn splice_task(
    board: &Board,
    task_id: &TaskId,
    target: &ColumnId,
    before: Option<&TaskId>,
) -> Option<Board> {
    let mut next = board.clone();
    let loc = next.locate_task(task_id)?;
    let target_index = next.column_index(target)?;
    if loc.column_index == target_index {
        return None;
    }

    let (_, task) = next.columns[loc.column_index].take_task(task_id)?;
    let column = &mut next.columns[target_index];
    let index = before
        .and_then(|id| column.task_index(id))
        .unwrap_or(column.tasks.len());
    column.insert_task(index, task);
    Some(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FailurePolicy;
    use crate::domain::ordering::is_dense;
    use crate::domain::{BoardSummary, ColumnColor, Owner, OwnerId};
    use crate::error::Result;
    use crate::notify::Notifications;
    use crate::storage::{memory_store::MemoryStore, BoardStore};
    use crate::sync::{Recovery, REORDER_FAILED_MESSAGE};
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    /// Memory store that records every reorder it receives
    #[derive(Clone, Default)]
    struct RecordingStore {
        inner: MemoryStore,
        calls: Arc<Mutex<Vec<ReorderRequest>>>,
    }

    impl RecordingStore {
        fn calls(&self) -> Vec<ReorderRequest> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl BoardStore for RecordingStore {
        async fn initialize(&self) -> Result<()> {
            self.inner.initialize().await
        }

        async fn list_boards(&self) -> Result<Vec<BoardSummary>> {
            self.inner.list_boards().await
        }

        async fn save_board(&self, board: &Board) -> Result<()> {
            self.inner.save_board(board).await
        }

        async fn load_board(&self, id: &BoardId) -> Result<Board> {
            self.inner.load_board(id).await
        }

        async fn delete_board(&self, id: &BoardId) -> Result<()> {
            self.inner.delete_board(id).await
        }

        async fn save_owner(&self, owner: &Owner) -> Result<()> {
            self.inner.save_owner(owner).await
        }

        async fn load_owner(&self, id: &OwnerId) -> Result<Owner> {
            self.inner.load_owner(id).await
        }

        async fn create_board(&self, owner_id: &OwnerId, board: &Board) -> Result<Owner> {
            self.inner.create_board(owner_id, board).await
        }

        async fn reorder_columns(&self, board_id: &BoardId, ordered: &[ColumnId]) -> Result<()> {
            self.calls.lock().unwrap().push(ReorderRequest::Columns {
                board_id: board_id.clone(),
                column_ids: ordered.to_vec(),
            });
            self.inner.reorder_columns(board_id, ordered).await
        }

        async fn reorder_tasks(
            &self,
            board_id: &BoardId,
            column_id: &ColumnId,
            ordered: &[TaskId],
            moved_task: Option<&TaskId>,
        ) -> Result<()> {
            self.calls.lock().unwrap().push(ReorderRequest::Tasks {
                board_id: board_id.clone(),
                column_id: column_id.clone(),
                task_ids: ordered.to_vec(),
                moved_task_id: moved_task.cloned(),
            });
            self.inner
                .reorder_tasks(board_id, column_id, ordered, moved_task)
                .await
        }

        async fn is_initialized(&self) -> bool {
            true
        }
    }

    fn board_of(columns: Vec<(&str, Vec<&str>)>) -> Board {
        let mut board = Board::with_id(BoardId::new("b1"), "Sprint");
        for (i, (column_id, tasks)) in columns.into_iter().enumerate() {
            let mut column = Column::new(
                ColumnId::new(column_id),
                column_id,
                ColumnColor::for_position(i),
            );
            column.order = i as u32;
            for task_id in tasks {
                column.push_task(Task::new(TaskId::new(task_id), task_id));
            }
            board.columns.push(column);
        }
        board
    }

    async fn harness_with(
        columns: Vec<(&str, Vec<&str>)>,
        policy: FailurePolicy,
    ) -> (RecordingStore, Reconciler) {
        let store = RecordingStore::default();
        let board = board_of(columns);
        store.save_board(&board).await.unwrap();

        let sync = PersistenceSync::new(
            Arc::new(store.clone()),
            BoardCache::new(),
            Notifications::default(),
        )
        .with_policy(policy);
        sync.open_board(&board.id).await.unwrap();
        (store, Reconciler::new(board.id.clone(), sync))
    }

    async fn harness(columns: Vec<(&str, Vec<&str>)>) -> (RecordingStore, Reconciler) {
        harness_with(columns, FailurePolicy::Keep).await
    }

    fn cached(reconciler: &Reconciler) -> Board {
        reconciler.cache().get(reconciler.board_id()).unwrap()
    }

    fn tasks_in(board: &Board, column: &str) -> Vec<String> {
        board
            .find_column(&ColumnId::new(column))
            .unwrap()
            .tasks
            .iter()
            .map(|t| t.id.to_string())
            .collect()
    }

    fn column_order(board: &Board) -> Vec<String> {
        board.columns.iter().map(|c| c.id.to_string()).collect()
    }

    #[tokio::test]
    async fn test_task_dropped_on_empty_column_background() {
        let (store, mut reconciler) =
            harness(vec![("todo", vec!["T1", "T2"]), ("doing", vec![])]).await;

        assert!(reconciler.drag_start(&DragItem::task("T1", "todo")));
        reconciler.drag_over(Some(&DragItem::column("doing")));
        let dispatched = reconciler
            .drag_end(Some(&DragItem::column("doing")))
            .unwrap();
        assert_eq!(dispatched.handle.await.unwrap(), SyncOutcome::Saved);

        let board = cached(&reconciler);
        assert_eq!(tasks_in(&board, "todo"), vec!["T2"]);
        assert_eq!(tasks_in(&board, "doing"), vec!["T1"]);
        assert!(is_dense(&board.columns[0].tasks));

        assert_eq!(
            store.calls(),
            vec![ReorderRequest::Tasks {
                board_id: BoardId::new("b1"),
                column_id: ColumnId::new("doing"),
                task_ids: vec![TaskId::new("T1")],
                moved_task_id: Some(TaskId::new("T1")),
            }]
        );

        let stored = store.load_board(&BoardId::new("b1")).await.unwrap();
        assert_eq!(tasks_in(&stored, "todo"), vec!["T2"]);
        assert_eq!(tasks_in(&stored, "doing"), vec!["T1"]);
        assert_eq!(stored.columns[0].tasks[0].order, 0);
    }

    #[tokio::test]
    async fn test_column_dropped_onto_first_column() {
        let (store, mut reconciler) =
            harness(vec![("A", vec![]), ("B", vec![]), ("C", vec![])]).await;

        reconciler.drag_start(&DragItem::column("C"));
        reconciler.drag_over(Some(&DragItem::column("A")));
        let dispatched = reconciler.drag_end(Some(&DragItem::column("A"))).unwrap();
        dispatched.handle.await.unwrap();

        let board = cached(&reconciler);
        assert_eq!(column_order(&board), vec!["C", "A", "B"]);
        assert_eq!(
            board.columns.iter().map(|c| c.order).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
        assert_eq!(
            store.calls(),
            vec![ReorderRequest::Columns {
                board_id: BoardId::new("b1"),
                column_ids: vec![ColumnId::new("C"), ColumnId::new("A"), ColumnId::new("B")],
            }]
        );
    }

    #[tokio::test]
    async fn test_column_hover_does_not_touch_board() {
        let (_store, mut reconciler) = harness(vec![("A", vec![]), ("B", vec![])]).await;
        let version = reconciler.cache().version(reconciler.board_id());

        reconciler.drag_start(&DragItem::column("B"));
        reconciler.drag_over(Some(&DragItem::column("A")));

        assert_eq!(reconciler.cache().version(reconciler.board_id()), version);
        assert!(reconciler.is_dragging());
    }

    #[tokio::test]
    async fn test_column_dropped_on_task_uses_its_column() {
        let (_store, mut reconciler) =
            harness(vec![("A", vec!["T1"]), ("B", vec![]), ("C", vec![])]).await;

        reconciler.drag_start(&DragItem::column("C"));
        let dispatched = reconciler.drag_end(Some(&DragItem::task("T1", "A"))).unwrap();

        assert_eq!(
            dispatched.request,
            ReorderRequest::Columns {
                board_id: BoardId::new("b1"),
                column_ids: vec![ColumnId::new("C"), ColumnId::new("A"), ColumnId::new("B")],
            }
        );
    }

    #[tokio::test]
    async fn test_column_dropped_on_itself_is_noop() {
        let (store, mut reconciler) = harness(vec![("A", vec![]), ("B", vec![])]).await;

        reconciler.drag_start(&DragItem::column("A"));
        assert!(reconciler.drag_end(Some(&DragItem::column("A"))).is_none());
        assert!(store.calls().is_empty());
        assert!(!reconciler.is_dragging());
    }

    #[tokio::test]
    async fn test_hover_moves_task_exactly_once() {
        let (_store, mut reconciler) =
            harness(vec![("todo", vec!["T1", "T2"]), ("doing", vec!["T3"])]).await;

        reconciler.drag_start(&DragItem::task("T1", "todo"));
        reconciler.drag_over(Some(&DragItem::task("T3", "doing")));
        let version = reconciler.cache().version(reconciler.board_id());

        // Further hovers inside the new column are deferred to the drop
        reconciler.drag_over(Some(&DragItem::task("T3", "doing")));
        reconciler.drag_over(Some(&DragItem::column("doing")));
        assert_eq!(reconciler.cache().version(reconciler.board_id()), version);

        let board = cached(&reconciler);
        assert_eq!(tasks_in(&board, "todo"), vec!["T2"]);
        assert_eq!(tasks_in(&board, "doing"), vec!["T1", "T3"]);
        assert_eq!(board.task_count(), 3);
        assert!(is_dense(&board.columns[1].tasks));

        match reconciler.active() {
            Some(ActiveItem::Task {
                source_column_id, ..
            }) => assert_eq!(source_column_id, &ColumnId::new("doing")),
            other => panic!("unexpected active item: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_hover_over_own_task_is_ignored() {
        let (_store, mut reconciler) = harness(vec![("todo", vec!["T1", "T2"])]).await;
        let version = reconciler.cache().version(reconciler.board_id());

        reconciler.drag_start(&DragItem::task("T1", "todo"));
        reconciler.drag_over(Some(&DragItem::task("T1", "todo")));
        reconciler.drag_over(Some(&DragItem::task("T2", "todo")));
        reconciler.drag_over(None);

        assert_eq!(reconciler.cache().version(reconciler.board_id()), version);
    }

    #[tokio::test]
    async fn test_drop_at_original_position_issues_no_write() {
        let (store, mut reconciler) = harness(vec![("todo", vec!["T1", "T2"])]).await;

        reconciler.drag_start(&DragItem::task("T2", "todo"));
        assert!(reconciler.drag_end(Some(&DragItem::task("T2", "todo"))).is_none());

        reconciler.drag_start(&DragItem::task("T2", "todo"));
        assert!(reconciler.drag_end(Some(&DragItem::column("todo"))).is_none());

        reconciler.drag_start(&DragItem::task("T1", "todo"));
        assert!(reconciler.drag_end(None).is_none());

        tokio::task::yield_now().await;
        assert!(store.calls().is_empty());
        assert_eq!(tasks_in(&cached(&reconciler), "todo"), vec!["T1", "T2"]);
    }

    #[tokio::test]
    async fn test_same_column_reorder() {
        let (store, mut reconciler) = harness(vec![("todo", vec!["T1", "T2", "T3"])]).await;

        reconciler.drag_start(&DragItem::task("T1", "todo"));
        reconciler.drag_over(Some(&DragItem::task("T3", "todo")));
        let dispatched = reconciler
            .drag_end(Some(&DragItem::task("T3", "todo")))
            .unwrap();
        dispatched.handle.await.unwrap();

        assert_eq!(tasks_in(&cached(&reconciler), "todo"), vec!["T2", "T3", "T1"]);
        assert_eq!(
            store.calls(),
            vec![ReorderRequest::Tasks {
                board_id: BoardId::new("b1"),
                column_id: ColumnId::new("todo"),
                task_ids: vec![TaskId::new("T2"), TaskId::new("T3"), TaskId::new("T1")],
                moved_task_id: None,
            }]
        );
    }

    #[tokio::test]
    async fn test_drop_on_own_column_background_moves_to_end() {
        let (_store, mut reconciler) = harness(vec![("todo", vec!["T1", "T2", "T3"])]).await;

        reconciler.drag_start(&DragItem::task("T1", "todo"));
        let dispatched = reconciler.drag_end(Some(&DragItem::column("todo"))).unwrap();

        match dispatched.request {
            ReorderRequest::Tasks {
                task_ids,
                moved_task_id,
                ..
            } => {
                assert_eq!(
                    task_ids,
                    vec![TaskId::new("T2"), TaskId::new("T3"), TaskId::new("T1")]
                );
                assert!(moved_task_id.is_none());
            }
            other => panic!("unexpected request: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_cross_column_drop_on_task() {
        let (store, mut reconciler) = harness(vec![
            ("todo", vec!["T1", "T2"]),
            ("doing", vec!["T3", "T4"]),
        ])
        .await;

        reconciler.drag_start(&DragItem::task("T1", "todo"));
        reconciler.drag_over(Some(&DragItem::task("T4", "doing")));
        let dispatched = reconciler
            .drag_end(Some(&DragItem::task("T4", "doing")))
            .unwrap();
        assert_eq!(dispatched.handle.await.unwrap(), SyncOutcome::Saved);

        // Hover placed T1 before T4; dropping on T4 then moves it to T4's slot
        let board = cached(&reconciler);
        assert_eq!(tasks_in(&board, "doing"), vec!["T3", "T4", "T1"]);

        let calls = store.calls();
        assert_eq!(calls.len(), 1);
        match &calls[0] {
            ReorderRequest::Tasks {
                column_id,
                moved_task_id,
                ..
            } => {
                assert_eq!(column_id, &ColumnId::new("doing"));
                assert_eq!(moved_task_id, &Some(TaskId::new("T1")));
            }
            other => panic!("unexpected request: {:?}", other),
        }

        let stored = store.load_board(&BoardId::new("b1")).await.unwrap();
        assert_eq!(tasks_in(&stored, "todo"), vec!["T2"]);
        assert_eq!(tasks_in(&stored, "doing"), vec!["T3", "T4", "T1"]);
    }

    #[tokio::test]
    async fn test_drop_on_other_column_without_hover() {
        let (store, mut reconciler) = harness(vec![
            ("todo", vec!["T1", "T2"]),
            ("doing", vec!["T3"]),
        ])
        .await;

        reconciler.drag_start(&DragItem::task("T2", "todo"));
        let dispatched = reconciler
            .drag_end(Some(&DragItem::task("T3", "doing")))
            .unwrap();
        dispatched.handle.await.unwrap();

        let board = cached(&reconciler);
        assert_eq!(tasks_in(&board, "todo"), vec!["T1"]);
        assert_eq!(tasks_in(&board, "doing"), vec!["T2", "T3"]);
        assert_eq!(store.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_last_task_leaves_empty_column() {
        let (_store, mut reconciler) =
            harness(vec![("todo", vec!["T1"]), ("doing", vec![])]).await;

        reconciler.drag_start(&DragItem::task("T1", "todo"));
        reconciler.drag_over(Some(&DragItem::column("doing")));
        let dispatched = reconciler.drag_end(Some(&DragItem::column("doing")));

        assert!(dispatched.is_some());
        let board = cached(&reconciler);
        assert!(tasks_in(&board, "todo").is_empty());
        assert_eq!(tasks_in(&board, "doing"), vec!["T1"]);
    }

    #[tokio::test]
    async fn test_hover_there_and_back_still_persists() {
        let (store, mut reconciler) =
            harness(vec![("todo", vec!["T1", "T2"]), ("doing", vec![])]).await;

        reconciler.drag_start(&DragItem::task("T1", "todo"));
        reconciler.drag_over(Some(&DragItem::column("doing")));
        reconciler.drag_over(Some(&DragItem::task("T2", "todo")));
        let dispatched = reconciler
            .drag_end(Some(&DragItem::task("T1", "todo")))
            .unwrap();
        dispatched.handle.await.unwrap();

        assert_eq!(tasks_in(&cached(&reconciler), "todo"), vec!["T1", "T2"]);
        assert_eq!(store.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_drop_outside_reverts_hover_move() {
        let (store, mut reconciler) =
            harness(vec![("todo", vec!["T1", "T2"]), ("doing", vec![])]).await;

        reconciler.drag_start(&DragItem::task("T1", "todo"));
        reconciler.drag_over(Some(&DragItem::column("doing")));
        assert_eq!(tasks_in(&cached(&reconciler), "doing"), vec!["T1"]);

        assert!(reconciler.drag_end(None).is_none());

        let board = cached(&reconciler);
        assert_eq!(tasks_in(&board, "todo"), vec!["T1", "T2"]);
        assert!(tasks_in(&board, "doing").is_empty());
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn test_drop_on_unknown_target_reverts_hover_move() {
        let (store, mut reconciler) =
            harness(vec![("todo", vec!["T1", "T2"]), ("doing", vec![])]).await;

        reconciler.drag_start(&DragItem::task("T1", "todo"));
        reconciler.drag_over(Some(&DragItem::column("doing")));
        assert!(reconciler
            .drag_end(Some(&DragItem::column("ghost")))
            .is_none());

        let board = cached(&reconciler);
        let stored = store.load_board(&BoardId::new("b1")).await.unwrap();
        assert_eq!(tasks_in(&board, "todo"), vec!["T1", "T2"]);
        assert_eq!(tasks_in(&board, "doing"), tasks_in(&stored, "doing"));
        assert!(store.calls().is_empty());

        // Same for a task target that is nowhere on the board
        reconciler.drag_start(&DragItem::task("T2", "todo"));
        reconciler.drag_over(Some(&DragItem::column("doing")));
        assert!(reconciler
            .drag_end(Some(&DragItem::task("gone", "ghost")))
            .is_none());
        assert_eq!(tasks_in(&cached(&reconciler), "todo"), vec!["T1", "T2"]);
        assert!(!reconciler.is_dragging());
    }

    #[tokio::test]
    async fn test_cancel_returns_to_idle() {
        let (_store, mut reconciler) =
            harness(vec![("todo", vec!["T1"]), ("doing", vec![])]).await;

        reconciler.drag_start(&DragItem::task("T1", "todo"));
        reconciler.drag_over(Some(&DragItem::column("doing")));
        reconciler.cancel();

        assert!(!reconciler.is_dragging());
        assert_eq!(tasks_in(&cached(&reconciler), "todo"), vec!["T1"]);
    }

    #[tokio::test]
    async fn test_events_without_gesture_are_ignored() {
        let (store, mut reconciler) = harness(vec![("todo", vec!["T1"])]).await;

        reconciler.drag_over(Some(&DragItem::column("todo")));
        assert!(reconciler.drag_end(Some(&DragItem::column("todo"))).is_none());
        assert!(!reconciler.drag_start(&DragItem::task("missing", "todo")));
        assert!(!reconciler.is_dragging());
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn test_drag_start_on_unloaded_board() {
        let (_store, mut reconciler) = harness(vec![("todo", vec!["T1"])]).await;
        reconciler.cache().remove(&BoardId::new("b1"));

        assert!(!reconciler.drag_start(&DragItem::task("T1", "todo")));
        assert!(reconciler.active().is_none());
    }

    #[tokio::test]
    async fn test_failed_write_keeps_optimistic_order() {
        let (store, mut reconciler) =
            harness(vec![("A", vec![]), ("B", vec![]), ("C", vec![])]).await;
        store.inner.set_unavailable(true);

        reconciler.drag_start(&DragItem::column("C"));
        let dispatched = reconciler.drag_end(Some(&DragItem::column("A"))).unwrap();
        let outcome = dispatched.handle.await.unwrap();

        assert_eq!(outcome, SyncOutcome::Failed(Recovery::Kept));
        assert_eq!(column_order(&cached(&reconciler)), vec!["C", "A", "B"]);

        let notifications = reconciler.sync.notifications().recent();
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].message, REORDER_FAILED_MESSAGE);
    }

    #[tokio::test]
    async fn test_failed_write_rolls_back_when_configured() {
        let (store, mut reconciler) = harness_with(
            vec![("todo", vec!["T1", "T2"]), ("doing", vec![])],
            FailurePolicy::Rollback,
        )
        .await;
        store.inner.set_unavailable(true);

        reconciler.drag_start(&DragItem::task("T1", "todo"));
        reconciler.drag_over(Some(&DragItem::column("doing")));
        let dispatched = reconciler.drag_end(Some(&DragItem::column("doing"))).unwrap();

        assert_eq!(
            dispatched.handle.await.unwrap(),
            SyncOutcome::Failed(Recovery::RolledBack)
        );
        let board = cached(&reconciler);
        assert_eq!(tasks_in(&board, "todo"), vec!["T1", "T2"]);
        assert!(tasks_in(&board, "doing").is_empty());
    }

    #[test]
    fn test_drag_item_wire_shape() {
        let task: DragItem = serde_json::from_str(
            r#"{"itemId":"T1","itemType":"task","containerId":"todo"}"#,
        )
        .unwrap();
        assert_eq!(task, DragItem::task("T1", "todo"));

        let column = serde_json::to_value(DragItem::column("todo")).unwrap();
        assert_eq!(
            column,
            serde_json::json!({"itemType": "column", "itemId": "todo"})
        );
    }
}
