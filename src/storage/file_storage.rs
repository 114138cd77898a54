use crate::{
    config::SyncConfig,
    domain::{Board, BoardId, BoardSummary, ColumnId, Owner, OwnerId, TaskId},
    error::{KanbanError, Result},
    storage::BoardStore,
};
use async_trait::async_trait;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;

/// File-based storage: one JSON document per board and per owner
pub struct FileStorage {
    root_path: PathBuf,
    // Serializes read-modify-write cycles so each reorder stays atomic
    write_lock: Mutex<()>,
}

impl FileStorage {
    const KANBAN_DIR: &'static str = ".kanban";
    const BOARDS_DIR: &'static str = "boards";
    const OWNERS_DIR: &'static str = "owners";

    /// Creates a new FileStorage instance for the given project root
    pub fn new(project_root: impl AsRef<Path>) -> Self {
        Self {
            root_path: project_root.as_ref().join(Self::KANBAN_DIR),
            write_lock: Mutex::new(()),
        }
    }

    /// Creates a FileStorage rooted at the configured data directory
    pub fn from_config(config: &SyncConfig) -> Self {
        Self::new(&config.data_dir)
    }

    fn boards_dir(&self) -> PathBuf {
        self.root_path.join(Self::BOARDS_DIR)
    }

    fn owners_dir(&self) -> PathBuf {
        self.root_path.join(Self::OWNERS_DIR)
    }

    fn board_file(&self, id: &BoardId) -> Result<PathBuf> {
        Ok(self.boards_dir().join(json_file_name("board id", id.as_str())?))
    }

    fn owner_file(&self, id: &OwnerId) -> Result<PathBuf> {
        Ok(self.owners_dir().join(json_file_name("owner id", id.as_str())?))
    }

    async fn ensure_directory_exists(&self, path: &Path) -> Result<()> {
        if !path.exists() {
            fs::create_dir_all(path).await?;
        }
        Ok(())
    }

    async fn read_board(&self, id: &BoardId) -> Result<Board> {
        let file_path = self.board_file(id)?;

        if !file_path.exists() {
            return Err(KanbanError::BoardNotFound(id.to_string()));
        }

        let contents = fs::read_to_string(&file_path).await?;
        let mut board: Board = serde_json::from_str(&contents)?;
        board.normalize();

        Ok(board)
    }

    async fn write_board(&self, board: &Board) -> Result<()> {
        self.ensure_directory_exists(&self.boards_dir()).await?;
        let file_path = self.board_file(&board.id)?;
        write_json_atomic(&file_path, board).await
    }

    async fn read_owner(&self, id: &OwnerId) -> Result<Owner> {
        let file_path = self.owner_file(id)?;

        if !file_path.exists() {
            return Err(KanbanError::OwnerNotFound(id.to_string()));
        }

        let contents = fs::read_to_string(&file_path).await?;
        Ok(serde_json::from_str(&contents)?)
    }

    async fn write_owner(&self, owner: &Owner) -> Result<()> {
        self.ensure_directory_exists(&self.owners_dir()).await?;
        let file_path = self.owner_file(&owner.id)?;
        write_json_atomic(&file_path, owner).await
    }

    async fn update_board<F>(&self, id: &BoardId, apply: F) -> Result<()>
    where
        F: FnOnce(&mut Board) -> Result<()> + Send,
    {
        let _guard = self.write_lock.lock().await;
        let mut board = self.read_board(id).await?;
        apply(&mut board)?;
        self.write_board(&board).await
    }
}

/// Maps an id to `<id>.json`, refusing ids that would escape their directory
fn json_file_name(field: &'static str, raw: &str) -> Result<String> {
    if raw.is_empty() || raw.contains(['/', '\\']) || raw.contains("..") {
        return Err(KanbanError::Validation {
            field,
            reason: format!("'{}' is not a valid file name", raw),
        });
    }
    Ok(format!("{}.json", raw))
}

/// Writes to a sibling temp file and renames it over the target
async fn write_json_atomic<T: Serialize + Sync>(file_path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    let tmp_path = file_path.with_extension("json.tmp");

    fs::write(&tmp_path, json).await?;
    fs::rename(&tmp_path, file_path).await?;
    Ok(())
}

#[async_trait]
impl BoardStore for FileStorage {
    async fn initialize(&self) -> Result<()> {
        self.ensure_directory_exists(&self.root_path).await?;
        self.ensure_directory_exists(&self.boards_dir()).await?;
        Ok(())
    }

    async fn list_boards(&self) -> Result<Vec<BoardSummary>> {
        let boards_dir = self.boards_dir();

        if !boards_dir.exists() {
            return Ok(Vec::new());
        }

        let mut entries = fs::read_dir(&boards_dir).await?;
        let mut summaries = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|s| s.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                match self.read_board(&BoardId::new(stem)).await {
                    Ok(board) => summaries.push(board.summary()),
                    Err(e) => {
                        tracing::warn!(path = %path.display(), error = %e, "skipping unreadable board file");
                    }
                }
            }
        }

        summaries.sort_by(|a, b| a.title.to_lowercase().cmp(&b.title.to_lowercase()));
        Ok(summaries)
    }

    async fn save_board(&self, board: &Board) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut stored = board.clone();
        stored.normalize();
        self.write_board(&stored).await
    }

    async fn load_board(&self, id: &BoardId) -> Result<Board> {
        self.read_board(id).await
    }

    async fn delete_board(&self, id: &BoardId) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let file_path = self.board_file(id)?;

        if !file_path.exists() {
            return Err(KanbanError::BoardNotFound(id.to_string()));
        }

        fs::remove_file(file_path).await?;
        Ok(())
    }

    async fn save_owner(&self, owner: &Owner) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.write_owner(owner).await
    }

    async fn load_owner(&self, id: &OwnerId) -> Result<Owner> {
        self.read_owner(id).await
    }

    async fn create_board(&self, owner_id: &OwnerId, board: &Board) -> Result<Owner> {
        let _guard = self.write_lock.lock().await;
        let mut owner = self.read_owner(owner_id).await?;
        let file_path = self.board_file(&board.id)?;
        if file_path.exists() {
            return Err(KanbanError::StorageError(format!(
                "board {} already exists",
                board.id
            )));
        }
        owner.record_board_created()?;

        let mut stored = board.clone();
        stored.owner_id = Some(owner_id.clone());
        stored.normalize();
        self.write_board(&stored).await?;

        if let Err(e) = self.write_owner(&owner).await {
            // Usage must never fall behind the boards on disk
            if let Err(cleanup) = fs::remove_file(&file_path).await {
                tracing::warn!(board_id = %board.id, error = %cleanup, "failed to remove board after owner write failed");
            }
            return Err(e);
        }
        Ok(owner)
    }

    async fn reorder_columns(&self, board_id: &BoardId, ordered: &[ColumnId]) -> Result<()> {
        self.update_board(board_id, |board| board.apply_column_order(ordered))
            .await
    }

    async fn reorder_tasks(
        &self,
        board_id: &BoardId,
        column_id: &ColumnId,
        ordered: &[TaskId],
        moved_task: Option<&TaskId>,
    ) -> Result<()> {
        self.update_board(board_id, |board| {
            board.apply_task_order(column_id, ordered, moved_task)
        })
        .await
    }

    async fn is_initialized(&self) -> bool {
        self.root_path.exists() && self.boards_dir().exists()
    }
}
