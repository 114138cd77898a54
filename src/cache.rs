//! Local board cache.
//!
//! Holds the client's best-known view of each open board. The arrangement is
//! a hypothesis: reorders land here before the store confirms them, and the
//! store stays the source of truth.
//!
//! All handles returned by `clone` share one map. Every effective change
//! bumps a monotonic version and is published to subscribers before the
//! mutating call returns.

use crate::domain::{Board, BoardId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::broadcast;

const DEFAULT_EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheEventKind {
    /// Fresh load from the store
    Loaded,
    /// Optimistic change through `set`
    Updated,
    /// Replaced by a rollback or refetch
    Restored,
    /// View closed
    Evicted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEvent {
    pub board_id: BoardId,
    pub version: u64,
    pub kind: CacheEventKind,
}

struct CacheEntry {
    board: Board,
    version: u64,
}

struct CacheInner {
    entries: HashMap<BoardId, CacheEntry>,
    next_version: u64,
}

impl CacheInner {
    fn bump(&mut self) -> u64 {
        self.next_version += 1;
        self.next_version
    }
}

#[derive(Clone)]
pub struct BoardCache {
    inner: Arc<Mutex<CacheInner>>,
    events: broadcast::Sender<CacheEvent>,
}

impl BoardCache {
    pub fn new() -> Self {
        Self::with_event_capacity(DEFAULT_EVENT_CAPACITY)
    }

    pub fn with_event_capacity(capacity: usize) -> Self {
        let (events, _) = broadcast::channel(capacity.max(1));
        Self {
            inner: Arc::new(Mutex::new(CacheInner {
                entries: HashMap::new(),
                next_version: 0,
            })),
            events,
        }
    }

    pub fn get(&self, board_id: &BoardId) -> Option<Board> {
        self.lock().entries.get(board_id).map(|e| e.board.clone())
    }

    pub fn contains(&self, board_id: &BoardId) -> bool {
        self.lock().entries.contains_key(board_id)
    }

    pub fn version(&self, board_id: &BoardId) -> Option<u64> {
        self.lock().entries.get(board_id).map(|e| e.version)
    }

    /// Stores a freshly loaded board, replacing any previous entry
    pub fn insert(&self, board: Board) -> u64 {
        let board_id = board.id.clone();
        let version = {
            let mut inner = self.lock();
            let version = inner.bump();
            inner
                .entries
                .insert(board_id.clone(), CacheEntry { board, version });
            version
        };
        tracing::debug!(board_id = %board_id, version, "board loaded into cache");
        self.publish(board_id, version, CacheEventKind::Loaded);
        version
    }

    /// Drops a board when its view closes
    pub fn remove(&self, board_id: &BoardId) -> Option<Board> {
        let (entry, version) = {
            let mut inner = self.lock();
            let entry = inner.entries.remove(board_id)?;
            let version = inner.bump();
            (entry, version)
        };
        tracing::debug!(board_id = %board_id, "board evicted from cache");
        self.publish(board_id.clone(), version, CacheEventKind::Evicted);
        Some(entry.board)
    }

    /// Applies `updater` to the cached board.
    ///
    /// Nothing happens when the board is not cached or the updater returns
    /// `None`; this covers updates racing a board that is not loaded yet.
    /// Returns the new version when the change was stored.
    ///
    /// The updater runs while the cache is locked and must not call back
    /// into the cache.
    pub fn set<F>(&self, board_id: &BoardId, updater: F) -> Option<u64>
    where
        F: FnOnce(&Board) -> Option<Board>,
    {
        let version = {
            let mut inner = self.lock();
            let next = updater(&inner.entries.get(board_id)?.board)?;
            let version = inner.bump();
            let entry = inner.entries.get_mut(board_id)?;
            entry.board = next;
            entry.version = version;
            version
        };
        tracing::trace!(board_id = %board_id, version, "cache updated");
        self.publish(board_id.clone(), version, CacheEventKind::Updated);
        Some(version)
    }

    /// Replaces a cached board with authoritative data, if the view is still open
    pub fn replace(&self, board: Board) -> Option<u64> {
        let board_id = board.id.clone();
        let version = {
            let mut inner = self.lock();
            if !inner.entries.contains_key(&board_id) {
                return None;
            }
            let version = inner.bump();
            inner
                .entries
                .insert(board_id.clone(), CacheEntry { board, version });
            version
        };
        self.publish(board_id, version, CacheEventKind::Restored);
        Some(version)
    }

    /// Restores `board` only if the entry is still at `expected_version`,
    /// i.e. nothing changed it since the caller last wrote it
    pub fn restore_if_version(&self, expected_version: u64, board: Board) -> Option<u64> {
        let board_id = board.id.clone();
        let version = {
            let mut inner = self.lock();
            match inner.entries.get(&board_id) {
                Some(entry) if entry.version == expected_version => {}
                _ => return None,
            }
            let version = inner.bump();
            inner
                .entries
                .insert(board_id.clone(), CacheEntry { board, version });
            version
        };
        self.publish(board_id, version, CacheEventKind::Restored);
        Some(version)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CacheEvent> {
        self.events.subscribe()
    }

    fn publish(&self, board_id: BoardId, version: u64, kind: CacheEventKind) {
        let _ = self.events.send(CacheEvent {
            board_id,
            version,
            kind,
        });
    }

    fn lock(&self) -> MutexGuard<'_, CacheInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for BoardCache {
    fn default() -> Self {
        Self::new()
    }
}
