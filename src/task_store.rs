use chrono::Utc;
use tracing::{debug, error, info};

use crate::storage::{keys, KeyValueStore, StorageError};
use crate::task::{Task, TaskDraft, TaskId, TaskPatch};

#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    #[error("task {0} not found")]
    NotFound(TaskId),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// The only component that reads or writes the `tasks` key. Every mutation
/// rewrites the whole collection.
pub struct TaskStore {
    kv: Box<dyn KeyValueStore>,
}

impl TaskStore {
    pub fn new(kv: Box<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    /// Access to the other persisted keys (active board, preferences).
    pub fn kv(&self) -> &dyn KeyValueStore {
        self.kv.as_ref()
    }

    pub fn kv_mut(&mut self) -> &mut dyn KeyValueStore {
        self.kv.as_mut()
    }

    /// All tasks in insertion order. A missing or unreadable collection is empty.
    pub fn list_tasks(&self) -> Vec<Task> {
        self.load().unwrap_or_else(|err| {
            error!(error = %err, "stored task collection is unreadable, treating as empty");
            Vec::new()
        })
    }

    /// Strict read used by mutations, so an undecodable collection is never
    /// overwritten.
    fn load(&self) -> Result<Vec<Task>, StorageError> {
        match self.kv.get(keys::TASKS) {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(Vec::new()),
        }
    }

    pub fn get_task(&self, id: TaskId) -> Option<Task> {
        self.list_tasks().into_iter().find(|t| t.id == id)
    }

    #[tracing::instrument(skip(self, draft), fields(board = %draft.board, status = %draft.status))]
    pub fn create_task(&mut self, draft: TaskDraft) -> Result<Task, TaskError> {
        let mut tasks = self.load()?;
        let id = next_id(&tasks, Utc::now().timestamp_millis());
        let task = draft.into_task(id);
        tasks.push(task.clone());
        self.save(&tasks)?;
        info!(id, "created task");
        Ok(task)
    }

    #[tracing::instrument(skip(self, patch))]
    pub fn patch_task(&mut self, id: TaskId, patch: TaskPatch) -> Result<(), TaskError> {
        let mut tasks = self.load()?;
        let task = tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(TaskError::NotFound(id))?;
        patch.apply(task);
        self.save(&tasks)?;
        info!(id, "patched task");
        Ok(())
    }

    /// Removing an unknown id is a no-op.
    #[tracing::instrument(skip(self))]
    pub fn delete_task(&mut self, id: TaskId) -> Result<(), TaskError> {
        let mut tasks = self.load()?;
        let before = tasks.len();
        tasks.retain(|t| t.id != id);
        if tasks.len() == before {
            debug!(id, "delete of unknown task ignored");
            return Ok(());
        }
        self.save(&tasks)?;
        info!(id, "deleted task");
        Ok(())
    }

    /// Replace the whole collection; used by seeding.
    pub fn replace_all(&mut self, tasks: &[Task]) -> Result<(), StorageError> {
        self.save(tasks)
    }

    pub fn has_collection(&self) -> bool {
        self.kv.get(keys::TASKS).is_some()
    }

    fn save(&mut self, tasks: &[Task]) -> Result<(), StorageError> {
        let encoded = serde_json::to_string(tasks)?;
        self.kv.set(keys::TASKS, encoded)
    }
}

/// Timestamp id, bumped past the largest existing id so ids stay unique
/// when two tasks land in the same millisecond.
fn next_id(tasks: &[Task], now_millis: i64) -> TaskId {
    match tasks.iter().map(|t| t.id).max() {
        Some(max) if max >= now_millis => max + 1,
        _ => now_millis,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use crate::task::Status;

    fn store() -> TaskStore {
        TaskStore::new(Box::new(MemoryStore::new()))
    }

    fn draft(title: &str, status: Status, board: &str) -> TaskDraft {
        TaskDraft {
            title: title.into(),
            description: String::new(),
            status,
            board: board.into(),
        }
    }

    #[test]
    fn test_empty_store_lists_nothing() {
        let s = store();
        assert!(s.list_tasks().is_empty());
        assert!(!s.has_collection());
    }

    #[test]
    fn test_create_patch_delete_replay() {
        let mut s = store();
        let a = s.create_task(draft("a", Status::Todo, "A")).unwrap();
        let b = s.create_task(draft("b", Status::Doing, "A")).unwrap();
        let c = s.create_task(draft("c", Status::Done, "B")).unwrap();

        s.patch_task(
            b.id,
            TaskPatch {
                title: Some("b2".into()),
                status: Some(Status::Done),
                ..TaskPatch::default()
            },
        )
        .unwrap();
        s.delete_task(a.id).unwrap();

        let tasks = s.list_tasks();
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].id, b.id);
        assert_eq!(tasks[0].title, "b2");
        assert_eq!(tasks[0].status, Status::Done);
        assert_eq!(tasks[0].board, "A");
        assert_eq!(tasks[1], c);
    }

    #[test]
    fn test_ids_unique_within_same_millisecond() {
        let mut s = store();
        let ids: Vec<TaskId> = (0..20)
            .map(|i| s.create_task(draft(&format!("t{i}"), Status::Todo, "A")).unwrap().id)
            .collect();
        let mut sorted = ids.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), ids.len());
    }

    #[test]
    fn test_next_id_bumps_past_future_ids() {
        let existing = vec![draft("x", Status::Todo, "A").into_task(5_000)];
        assert_eq!(next_id(&existing, 1_000), 5_001);
        assert_eq!(next_id(&existing, 9_000), 9_000);
        assert_eq!(next_id(&[], 42), 42);
    }

    #[test]
    fn test_delete_unknown_is_noop() {
        let mut s = store();
        s.create_task(draft("a", Status::Todo, "A")).unwrap();
        s.delete_task(-1).unwrap();
        assert_eq!(s.list_tasks().len(), 1);
    }

    #[test]
    fn test_patch_unknown_is_not_found() {
        let mut s = store();
        let a = s.create_task(draft("a", Status::Todo, "A")).unwrap();
        let err = s.patch_task(a.id + 1000, TaskPatch::default()).unwrap_err();
        assert!(matches!(err, TaskError::NotFound(id) if id == a.id + 1000));
        assert_eq!(s.list_tasks(), vec![a]);
    }

    #[test]
    fn test_create_fails_on_full_store_and_keeps_collection() {
        let mut s = TaskStore::new(Box::new(MemoryStore::with_quota(150)));
        let first = s.create_task(draft("fits", Status::Todo, "A")).unwrap();
        let err = s
            .create_task(draft(&"long title ".repeat(20), Status::Todo, "A"))
            .unwrap_err();
        assert!(matches!(err, TaskError::Storage(StorageError::QuotaExceeded { .. })));
        assert_eq!(s.list_tasks(), vec![first]);
    }

    #[test]
    fn test_unreadable_collection_is_empty() {
        let mut kv = MemoryStore::new();
        kv.set(keys::TASKS, "{oops".into()).unwrap();
        let s = TaskStore::new(Box::new(kv));
        assert!(s.list_tasks().is_empty());
    }

    #[test]
    fn test_mutations_leave_undecodable_collection_untouched() {
        let raw = concat!(
            r#"[{"id":1,"title":"keep me","description":"","status":"todo","board":"A"},"#,
            r#"{"id":2,"title":"odd","description":"","status":"blocked","board":"A"}]"#,
        );
        let mut kv = MemoryStore::new();
        kv.set(keys::TASKS, raw.into()).unwrap();
        let mut s = TaskStore::new(Box::new(kv));

        let err = s.create_task(draft("new", Status::Todo, "A")).unwrap_err();
        assert!(matches!(err, TaskError::Storage(StorageError::Json(_))));
        assert!(matches!(
            s.patch_task(1, TaskPatch::default()),
            Err(TaskError::Storage(StorageError::Json(_)))
        ));
        assert!(matches!(s.delete_task(1), Err(TaskError::Storage(StorageError::Json(_)))));

        assert_eq!(s.kv().get(keys::TASKS).as_deref(), Some(raw));
        assert!(s.list_tasks().is_empty());
    }

    #[test]
    fn test_get_task() {
        let mut s = store();
        let a = s.create_task(draft("a", Status::Todo, "A")).unwrap();
        assert_eq!(s.get_task(a.id), Some(a.clone()));
        assert_eq!(s.get_task(a.id + 1), None);
    }
}
