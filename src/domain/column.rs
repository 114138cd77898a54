use crate::domain::ids::{ColumnId, TaskId};
use crate::domain::ordering::{ids_of, position_of, restamp, Ordered};
use crate::domain::task::Task;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Accent colour shown next to a column title
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnColor {
    Sky,
    Violet,
    Emerald,
    Amber,
    Rose,
    Indigo,
    Teal,
    Orange,
}

impl ColumnColor {
    pub const PALETTE: [ColumnColor; 8] = [
        Self::Sky,
        Self::Violet,
        Self::Emerald,
        Self::Amber,
        Self::Rose,
        Self::Indigo,
        Self::Teal,
        Self::Orange,
    ];

    /// Picks the palette colour for the n-th column, cycling when exhausted
    pub fn for_position(position: usize) -> Self {
        Self::PALETTE[position % Self::PALETTE.len()]
    }
}

impl fmt::Display for ColumnColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Sky => "sky",
            Self::Violet => "violet",
            Self::Emerald => "emerald",
            Self::Amber => "amber",
            Self::Rose => "rose",
            Self::Indigo => "indigo",
            Self::Teal => "teal",
            Self::Orange => "orange",
        };
        write!(f, "{}", name)
    }
}

/// An ordered container of tasks within a board
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub id: ColumnId,
    pub title: String,
    pub color: ColumnColor,
    /// Horizontal position among sibling columns
    pub order: u32,
    #[serde(default)]
    pub tasks: Vec<Task>,
}

impl Column {
    pub fn new(id: ColumnId, title: impl Into<String>, color: ColumnColor) -> Self {
        Self {
            id,
            title: title.into(),
            color,
            order: 0,
            tasks: Vec::new(),
        }
    }

    pub fn task_index(&self, id: &TaskId) -> Option<usize> {
        position_of(&self.tasks, id)
    }

    pub fn contains_task(&self, id: &TaskId) -> bool {
        self.task_index(id).is_some()
    }

    pub fn task_ids(&self) -> Vec<TaskId> {
        ids_of(&self.tasks)
    }

    /// Appends a task at the bottom of the column
    pub fn push_task(&mut self, mut task: Task) {
        task.order = self.tasks.len() as u32;
        self.tasks.push(task);
    }

    /// Inserts a task at `index` (clamped to the end) and re-stamps the column
    pub fn insert_task(&mut self, index: usize, task: Task) {
        let index = index.min(self.tasks.len());
        self.tasks.insert(index, task);
        restamp(&mut self.tasks);
    }

    /// Removes a task, returning it with its former index
    pub fn take_task(&mut self, id: &TaskId) -> Option<(usize, Task)> {
        let index = self.task_index(id)?;
        let task = self.tasks.remove(index);
        restamp(&mut self.tasks);
        Some((index, task))
    }
}

impl Ordered for Column {
    type Id = ColumnId;

    fn item_id(&self) -> &ColumnId {
        &self.id
    }

    fn order(&self) -> u32 {
        self.order
    }

    fn set_order(&mut self, order: u32) {
        self.order = order;
    }
}
