use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Mutex;

use crate::task::{Task, TaskStatus};

/// Concurrency-safe store of active tasks, keyed by task id.
///
/// The registry is the single source of truth for task status. Every compound
/// check happens under one lock acquisition, so concurrent submitters and
/// pollers can never interleave between the check and the mutation. The lock
/// is only ever held for map operations, never across engine calls.
#[derive(Debug, Default)]
pub struct TaskRegistry {
    tasks: Mutex<HashMap<u64, Task>>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `task`, replacing any existing entry with the same id.
    pub fn put(&self, task: Task) {
        self.tasks.lock().unwrap().insert(task.id, task);
    }

    /// Store `task` unless its id is already present.
    ///
    /// Returns `true` when the task was stored. When submitters race on one
    /// id, exactly one of them sees `true`; the losers must not enqueue.
    pub fn insert_new(&self, task: Task) -> bool {
        match self.tasks.lock().unwrap().entry(task.id) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(task);
                true
            }
        }
    }

    /// Snapshot of the task stored for `id`.
    pub fn get(&self, id: u64) -> Option<Task> {
        self.tasks.lock().unwrap().get(&id).cloned()
    }

    /// Mark `id` as running and return the updated task.
    ///
    /// Returns `None` when the id is not registered (a stale queue entry).
    pub fn claim(&self, id: u64) -> Option<Task> {
        let mut tasks = self.tasks.lock().unwrap();
        let task = tasks.get_mut(&id)?;
        task.status = TaskStatus::Running;
        Some(task.clone())
    }

    /// Overwrite the status for `id`. A removed id is ignored.
    pub fn set_status(&self, id: u64, status: TaskStatus) {
        if let Some(task) = self.tasks.lock().unwrap().get_mut(&id) {
            task.status = status;
        }
    }

    /// Status read with consume-once semantics: observing a terminal status
    /// removes the task, so of N concurrent readers exactly one sees
    /// `Finished` or `Error` and the rest see `None`.
    ///
    /// Clients get a single chance to read a terminal status; a retry reports
    /// the task as unknown.
    pub fn observe(&self, id: u64) -> Option<TaskStatus> {
        let mut tasks = self.tasks.lock().unwrap();
        let status = tasks.get(&id)?.status;
        if status.is_terminal() {
            tasks.remove(&id);
        }
        Some(status)
    }

    /// Remove `id` outright, returning the stored task if there was one.
    pub fn remove(&self, id: u64) -> Option<Task> {
        self.tasks.lock().unwrap().remove(&id)
    }

    /// Number of active tasks (pending, running, or unconsumed terminal).
    pub fn len(&self) -> usize {
        self.tasks.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.lock().unwrap().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(id: u64) -> Task {
        Task::new(id, format!("/tmp/{id}.wav"), None)
    }

    #[test]
    fn insert_new_is_idempotent() {
        let registry = TaskRegistry::new();
        assert!(registry.insert_new(task(1)));
        assert!(!registry.insert_new(task(1)));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn insert_new_keeps_the_existing_task() {
        let registry = TaskRegistry::new();
        registry.insert_new(task(1));
        registry.set_status(1, TaskStatus::Running);

        // A duplicate submission must not reset state.
        registry.insert_new(task(1));
        assert_eq!(registry.get(1).map(|t| t.status), Some(TaskStatus::Running));
    }

    #[test]
    fn claim_flips_to_running() {
        let registry = TaskRegistry::new();
        registry.insert_new(task(3));

        let claimed = registry.claim(3).expect("task should be registered");
        assert_eq!(claimed.status, TaskStatus::Running);
        assert_eq!(registry.get(3).map(|t| t.status), Some(TaskStatus::Running));
    }

    #[test]
    fn claim_of_unknown_id_returns_none() {
        let registry = TaskRegistry::new();
        assert!(registry.claim(42).is_none());
    }

    #[test]
    fn observe_keeps_non_terminal_tasks() {
        let registry = TaskRegistry::new();
        registry.insert_new(task(5));

        assert_eq!(registry.observe(5), Some(TaskStatus::Pending));
        assert_eq!(registry.observe(5), Some(TaskStatus::Pending));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn observe_consumes_terminal_tasks() {
        let registry = TaskRegistry::new();
        registry.insert_new(task(5));
        registry.set_status(5, TaskStatus::Finished);

        assert_eq!(registry.observe(5), Some(TaskStatus::Finished));
        assert_eq!(registry.observe(5), None);
        assert!(registry.is_empty());
    }

    #[test]
    fn observe_consumes_error_tasks() {
        let registry = TaskRegistry::new();
        registry.insert_new(task(6));
        registry.set_status(6, TaskStatus::Error);

        assert_eq!(registry.observe(6), Some(TaskStatus::Error));
        assert_eq!(registry.observe(6), None);
    }

    #[test]
    fn set_status_on_removed_id_is_ignored() {
        let registry = TaskRegistry::new();
        registry.set_status(9, TaskStatus::Finished);
        assert!(registry.get(9).is_none());
    }

    #[test]
    fn put_overwrites() {
        let registry = TaskRegistry::new();
        registry.put(task(2));
        let mut replacement = task(2);
        replacement.status = TaskStatus::Error;
        registry.put(replacement);
        assert_eq!(registry.get(2).map(|t| t.status), Some(TaskStatus::Error));
    }

    #[test]
    fn remove_returns_the_task() {
        let registry = TaskRegistry::new();
        registry.insert_new(task(8));
        assert_eq!(registry.remove(8).map(|t| t.id), Some(8));
        assert!(registry.remove(8).is_none());
    }
}
