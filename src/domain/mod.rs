pub mod board;
pub mod column;
pub mod ids;
pub mod ordering;
pub mod owner;
pub mod task;

pub use board::{Board, BoardSummary, BoardUpdate, ColumnRename, TaskLocation};
pub use column::{Column, ColumnColor};
pub use ids::{BoardId, ColumnId, OwnerId, SubtaskId, TaskId};
pub use ordering::{move_item, Ordered};
pub use owner::{Owner, Plan};
pub use task::{NewTask, Subtask, Task};

use crate::error::{KanbanError, Result};

/// Checks a user-supplied title against inclusive character bounds, ignoring
/// surrounding whitespace
pub(crate) fn validate_title(field: &'static str, title: &str, min: usize, max: usize) -> Result<()> {
    let len = title.trim().chars().count();
    if len < min {
        return Err(KanbanError::Validation {
            field,
            reason: format!("must be at least {} characters", min),
        });
    }
    if len > max {
        return Err(KanbanError::Validation {
            field,
            reason: format!("must be at most {} characters", max),
        });
    }
    Ok(())
}
