use crate::domain::column::{Column, ColumnColor};
use crate::domain::ids::{BoardId, ColumnId, OwnerId, TaskId};
use crate::domain::ordering::{ids_of, position_of, restamp, sort_by_order};
use crate::domain::task::{NewTask, Task};
use crate::domain::validate_title;
use crate::error::{KanbanError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

const BOARD_TITLE_MIN: usize = 2;
const BOARD_TITLE_MAX: usize = 50;
const COLUMN_TITLE_MIN: usize = 2;
const COLUMN_TITLE_MAX: usize = 50;
/// Bulk board edits accept shorter column titles than single-column creation
const EDITED_COLUMN_TITLE_MIN: usize = 1;

/// Where a task currently sits on a board
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskLocation {
    pub column_index: usize,
    pub task_index: usize,
}

/// Lightweight listing entry for a board
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardSummary {
    pub id: BoardId,
    pub title: String,
    pub column_count: usize,
    pub task_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnRename {
    pub column_id: ColumnId,
    pub title: String,
}

/// A batch edit of a board's title and columns, applied atomically
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BoardUpdate {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub rename_columns: Vec<ColumnRename>,
    #[serde(default)]
    pub delete_columns: Vec<ColumnId>,
    #[serde(default)]
    pub create_columns: Vec<String>,
}

/// Kanban board: the top-level owner of columns and, through them, tasks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Board {
    pub id: BoardId,
    pub title: String,
    /// Set when the board was created against an owner's quota
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<OwnerId>,
    #[serde(default)]
    pub columns: Vec<Column>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Board {
    /// Creates a board with an initial set of columns, ordered as given
    pub fn new<I, S>(title: impl Into<String>, column_titles: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let title = title.into();
        validate_title("board title", &title, BOARD_TITLE_MIN, BOARD_TITLE_MAX)?;

        let now = Utc::now();
        let mut board = Self {
            id: BoardId::generate(),
            title: title.trim().to_string(),
            owner_id: None,
            columns: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        for column_title in column_titles {
            board.add_column(column_title)?;
        }
        Ok(board)
    }

    /// Creates an empty board with a known id
    pub fn with_id(id: BoardId, title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            title: title.into(),
            owner_id: None,
            columns: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn summary(&self) -> BoardSummary {
        BoardSummary {
            id: self.id.clone(),
            title: self.title.clone(),
            column_count: self.columns.len(),
            task_count: self.task_count(),
        }
    }

    pub fn task_count(&self) -> usize {
        self.columns.iter().map(|c| c.tasks.len()).sum()
    }

    pub fn column_ids(&self) -> Vec<ColumnId> {
        ids_of(&self.columns)
    }

    pub fn column_index(&self, id: &ColumnId) -> Option<usize> {
        position_of(&self.columns, id)
    }

    pub fn find_column(&self, id: &ColumnId) -> Option<&Column> {
        self.columns.iter().find(|c| &c.id == id)
    }

    pub fn find_column_mut(&mut self, id: &ColumnId) -> Option<&mut Column> {
        self.columns.iter_mut().find(|c| &c.id == id)
    }

    pub fn locate_task(&self, id: &TaskId) -> Option<TaskLocation> {
        self.columns
            .iter()
            .enumerate()
            .find_map(|(column_index, column)| {
                column.task_index(id).map(|task_index| TaskLocation {
                    column_index,
                    task_index,
                })
            })
    }

    /// Returns the id of the column currently owning the task
    pub fn column_of_task(&self, id: &TaskId) -> Option<&ColumnId> {
        self.locate_task(id)
            .map(|loc| &self.columns[loc.column_index].id)
    }

    pub fn find_task(&self, id: &TaskId) -> Option<&Task> {
        self.locate_task(id)
            .map(|loc| &self.columns[loc.column_index].tasks[loc.task_index])
    }

    pub fn find_task_mut(&mut self, id: &TaskId) -> Option<&mut Task> {
        let loc = self.locate_task(id)?;
        Some(&mut self.columns[loc.column_index].tasks[loc.task_index])
    }

    /// Appends a new column to the right of the existing ones
    pub fn add_column(&mut self, title: impl Into<String>) -> Result<ColumnId> {
        let title = title.into();
        validate_title("column title", &title, COLUMN_TITLE_MIN, COLUMN_TITLE_MAX)?;
        Ok(self.push_column(&title))
    }

    fn push_column(&mut self, title: &str) -> ColumnId {
        let position = self.columns.len();
        let mut column = Column::new(
            ColumnId::generate(),
            title.trim(),
            ColumnColor::for_position(position),
        );
        column.order = position as u32;
        let id = column.id.clone();
        self.columns.push(column);
        self.touch();
        id
    }

    /// Removes a column together with its tasks
    pub fn remove_column(&mut self, id: &ColumnId) -> Result<Column> {
        let index = self
            .column_index(id)
            .ok_or_else(|| KanbanError::ColumnNotFound(id.to_string()))?;
        let column = self.columns.remove(index);
        restamp(&mut self.columns);
        self.touch();
        Ok(column)
    }

    /// Applies renames, deletions, and new columns in one step.
    ///
    /// Everything is validated before anything changes; on error the board
    /// is left untouched.
    pub fn update(&mut self, update: BoardUpdate) -> Result<()> {
        if let Some(title) = &update.title {
            validate_title("board title", title, BOARD_TITLE_MIN, BOARD_TITLE_MAX)?;
        }
        for rename in &update.rename_columns {
            validate_title(
                "column title",
                &rename.title,
                EDITED_COLUMN_TITLE_MIN,
                COLUMN_TITLE_MAX,
            )?;
            if self.column_index(&rename.column_id).is_none() {
                return Err(KanbanError::ColumnNotFound(rename.column_id.to_string()));
            }
        }
        for id in &update.delete_columns {
            if self.column_index(id).is_none() {
                return Err(KanbanError::ColumnNotFound(id.to_string()));
            }
        }
        for title in &update.create_columns {
            validate_title("column title", title, EDITED_COLUMN_TITLE_MIN, COLUMN_TITLE_MAX)?;
        }

        if let Some(title) = update.title {
            self.title = title.trim().to_string();
        }
        for rename in update.rename_columns {
            if let Some(column) = self.find_column_mut(&rename.column_id) {
                column.title = rename.title.trim().to_string();
            }
        }
        let deleted: HashSet<ColumnId> = update.delete_columns.into_iter().collect();
        self.columns.retain(|c| !deleted.contains(&c.id));
        restamp(&mut self.columns);
        for title in &update.create_columns {
            self.push_column(title);
        }
        self.touch();
        Ok(())
    }

    /// Adds a task at the bottom of a column
    pub fn add_task(&mut self, column_id: &ColumnId, input: NewTask) -> Result<TaskId> {
        let task = Task::from_new(input)?;
        let column = self
            .find_column_mut(column_id)
            .ok_or_else(|| KanbanError::ColumnNotFound(column_id.to_string()))?;
        let id = task.id.clone();
        column.push_task(task);
        self.touch();
        Ok(id)
    }

    pub fn remove_task(&mut self, id: &TaskId) -> Result<Task> {
        let loc = self
            .locate_task(id)
            .ok_or_else(|| KanbanError::TaskNotFound(id.to_string()))?;
        let (_, task) = self.columns[loc.column_index]
            .take_task(id)
            .ok_or_else(|| KanbanError::TaskNotFound(id.to_string()))?;
        self.touch();
        Ok(task)
    }

    /// Moves a task to the bottom of another column; no-op for its own column
    pub fn move_task_to_column(&mut self, id: &TaskId, column_id: &ColumnId) -> Result<()> {
        let target = self
            .column_index(column_id)
            .ok_or_else(|| KanbanError::ColumnNotFound(column_id.to_string()))?;
        let loc = self
            .locate_task(id)
            .ok_or_else(|| KanbanError::TaskNotFound(id.to_string()))?;
        if loc.column_index == target {
            return Ok(());
        }

        if let Some((_, task)) = self.columns[loc.column_index].take_task(id) {
            self.columns[target].push_task(task);
        }
        self.touch();
        Ok(())
    }

    /// Rewrites column order from a complete, ordered list of column ids.
    ///
    /// The list must name every column exactly once.
    pub fn apply_column_order(&mut self, ordered: &[ColumnId]) -> Result<()> {
        check_permutation(
            &format!("board {}", self.id),
            &self.column_ids(),
            ordered,
        )?;

        let mut columns = Vec::with_capacity(self.columns.len());
        for id in ordered {
            if let Some(index) = self.column_index(id) {
                columns.push(self.columns[index].clone());
            }
        }
        restamp(&mut columns);
        self.columns = columns;
        self.touch();
        Ok(())
    }

    /// Rewrites one column's task order.
    ///
    /// When `moved_task` currently lives in another column it is first moved
    /// into `column_id`, and the column it left is re-stamped. The ordered
    /// list must then name every task of the column exactly once. Validation
    /// happens on a copy, so a rejected reorder leaves the board unchanged.
    pub fn apply_task_order(
        &mut self,
        column_id: &ColumnId,
        ordered: &[TaskId],
        moved_task: Option<&TaskId>,
    ) -> Result<()> {
        let mut next = self.clone();
        let target = next
            .column_index(column_id)
            .ok_or_else(|| KanbanError::ColumnNotFound(column_id.to_string()))?;

        if let Some(task_id) = moved_task {
            let loc = next
                .locate_task(task_id)
                .ok_or_else(|| KanbanError::TaskNotFound(task_id.to_string()))?;
            if loc.column_index != target {
                if let Some((_, task)) = next.columns[loc.column_index].take_task(task_id) {
                    next.columns[target].push_task(task);
                }
            }
        }

        let column = &mut next.columns[target];
        check_permutation(&format!("column {}", column.id), &column.task_ids(), ordered)?;

        let mut tasks = Vec::with_capacity(column.tasks.len());
        for id in ordered {
            if let Some(index) = column.task_index(id) {
                tasks.push(column.tasks[index].clone());
            }
        }
        restamp(&mut tasks);
        column.tasks = tasks;

        next.touch();
        *self = next;
        Ok(())
    }

    /// Sorts columns and tasks by their persisted order and closes gaps
    pub fn normalize(&mut self) {
        sort_by_order(&mut self.columns);
        restamp(&mut self.columns);
        for column in &mut self.columns {
            sort_by_order(&mut column.tasks);
            restamp(&mut column.tasks);
        }
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

fn check_permutation<T>(scope: &str, current: &[T], ordered: &[T]) -> Result<()>
where
    T: std::hash::Hash + Eq + std::fmt::Display,
{
    let invalid = |reason: String| KanbanError::InvalidReorder {
        scope: scope.to_string(),
        reason,
    };

    if current.len() != ordered.len() {
        return Err(invalid(format!(
            "expected {} ids, got {}",
            current.len(),
            ordered.len()
        )));
    }

    let known: HashSet<&T> = current.iter().collect();
    let mut seen = HashSet::with_capacity(ordered.len());
    for id in ordered {
        if !known.contains(id) {
            return Err(invalid(format!("unknown id {}", id)));
        }
        if !seen.insert(id) {
            return Err(invalid(format!("duplicate id {}", id)));
        }
    }
    Ok(())
}
