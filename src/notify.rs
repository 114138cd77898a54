//! User-facing notifications raised by background persistence.

use crate::domain::BoardId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::broadcast;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub level: NotificationLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub board_id: Option<BoardId>,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// Bounded notification history with live fan-out to subscribers
#[derive(Clone)]
pub struct Notifications {
    history: Arc<Mutex<VecDeque<Notification>>>,
    capacity: usize,
    tx: broadcast::Sender<Notification>,
}

impl Notifications {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (tx, _) = broadcast::channel(capacity);
        Self {
            history: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            capacity,
            tx,
        }
    }

    pub fn push(&self, notification: Notification) {
        {
            let mut history = self.history();
            if history.len() == self.capacity {
                history.pop_front();
            }
            history.push_back(notification.clone());
        }
        // No receivers is fine; the history still has it
        let _ = self.tx.send(notification);
    }

    pub fn error(&self, board_id: Option<BoardId>, message: impl Into<String>) {
        self.push(Notification {
            level: NotificationLevel::Error,
            board_id,
            message: message.into(),
            created_at: Utc::now(),
        });
    }

    pub fn info(&self, board_id: Option<BoardId>, message: impl Into<String>) {
        self.push(Notification {
            level: NotificationLevel::Info,
            board_id,
            message: message.into(),
            created_at: Utc::now(),
        });
    }

    /// Returns the retained notifications, oldest first
    pub fn recent(&self) -> Vec<Notification> {
        self.history().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.history().len()
    }

    pub fn is_empty(&self) -> bool {
        self.history().is_empty()
    }

    pub fn clear(&self) {
        self.history().clear();
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.tx.subscribe()
    }

    fn history(&self) -> MutexGuard<'_, VecDeque<Notification>> {
        self.history.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for Notifications {
    fn default() -> Self {
        Self::new(32)
    }
}
