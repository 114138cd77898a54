use crate::domain::ids::{SubtaskId, TaskId};
use crate::domain::ordering::Ordered;
use crate::domain::validate_title;
use crate::error::{KanbanError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A checklist item belonging to exactly one task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subtask {
    pub id: SubtaskId,
    pub title: String,
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Subtask {
    pub fn new(id: SubtaskId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            completed: false,
            completed_at: None,
        }
    }

    pub fn mark_completed(&mut self) {
        self.completed = true;
        self.completed_at = Some(Utc::now());
    }

    pub fn mark_incomplete(&mut self) {
        self.completed = false;
        self.completed_at = None;
    }

    pub fn toggle(&mut self) {
        if self.completed {
            self.mark_incomplete();
        } else {
            self.mark_completed();
        }
    }
}

/// Input for creating a task in a column
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewTask {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub subtasks: Vec<String>,
}

impl NewTask {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }
}

/// A kanban task, owned by exactly one column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Position among sibling tasks in the owning column
    pub order: u32,
    #[serde(default)]
    pub subtasks: Vec<Subtask>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Creates a new task with the given ID and title
    pub fn new(id: TaskId, title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            title: title.into(),
            description: None,
            order: 0,
            subtasks: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Builds a task from creation input, validating the title
    pub fn from_new(input: NewTask) -> Result<Self> {
        validate_title("task title", &input.title, 1, usize::MAX)?;

        let mut task = Self::new(TaskId::generate(), input.title.trim());
        task.description = input.description.filter(|d| !d.trim().is_empty());
        for title in input.subtasks {
            task.add_subtask(title);
        }
        Ok(task)
    }

    /// Sets the title
    pub fn set_title(&mut self, title: impl Into<String>) -> Result<()> {
        let title = title.into();
        validate_title("task title", &title, 1, usize::MAX)?;
        self.title = title;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Sets or clears the description
    pub fn set_description(&mut self, description: Option<String>) {
        self.description = description;
        self.updated_at = Utc::now();
    }

    /// Appends a subtask and returns its id
    pub fn add_subtask(&mut self, title: impl Into<String>) -> SubtaskId {
        let subtask = Subtask::new(SubtaskId::generate(), title);
        let id = subtask.id.clone();
        self.subtasks.push(subtask);
        self.updated_at = Utc::now();
        id
    }

    pub fn remove_subtask(&mut self, id: &SubtaskId) -> Result<Subtask> {
        let pos = self.subtask_position(id)?;
        self.updated_at = Utc::now();
        Ok(self.subtasks.remove(pos))
    }

    /// Flips a subtask's completion and returns the new state
    pub fn toggle_subtask(&mut self, id: &SubtaskId) -> Result<bool> {
        let pos = self.subtask_position(id)?;
        self.subtasks[pos].toggle();
        self.updated_at = Utc::now();
        Ok(self.subtasks[pos].completed)
    }

    pub fn set_subtask_completed(&mut self, id: &SubtaskId, completed: bool) -> Result<()> {
        let pos = self.subtask_position(id)?;
        let subtask = &mut self.subtasks[pos];
        if subtask.completed != completed {
            if completed {
                subtask.mark_completed();
            } else {
                subtask.mark_incomplete();
            }
            self.updated_at = Utc::now();
        }
        Ok(())
    }

    /// Returns `(completed, total)` subtask counts, as shown on task cards
    pub fn progress(&self) -> (usize, usize) {
        let completed = self.subtasks.iter().filter(|s| s.completed).count();
        (completed, self.subtasks.len())
    }

    /// Checks if every subtask is completed (false when there are none)
    pub fn all_subtasks_completed(&self) -> bool {
        !self.subtasks.is_empty() && self.subtasks.iter().all(|s| s.completed)
    }

    fn subtask_position(&self, id: &SubtaskId) -> Result<usize> {
        self.subtasks
            .iter()
            .position(|s| &s.id == id)
            .ok_or_else(|| KanbanError::SubtaskNotFound(id.to_string()))
    }
}

impl Ordered for Task {
    type Id = TaskId;

    fn item_id(&self) -> &TaskId {
        &self.id
    }

    fn order(&self) -> u32 {
        self.order
    }

    fn set_order(&mut self, order: u32) {
        self.order = order;
    }
}
