use std::path::PathBuf;

/// Lifecycle states for a transcription task.
///
/// The discriminants are the wire contract: status polls report the decimal
/// code, so the values are stable and must not be reordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    /// Accepted and waiting in the dispatch queue.
    Pending = 1,
    /// Claimed by the worker; execution in progress.
    Running = 2,
    /// Execution succeeded and artifacts were written.
    Finished = 3,
    /// Execution failed; no retry is attempted.
    Error = 4,
}

impl TaskStatus {
    /// Stable wire code for this status.
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Whether this status admits no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Finished | Self::Error)
    }
}

/// A single transcription job, identified by a client-supplied integer id.
#[derive(Debug, Clone)]
pub struct Task {
    pub id: u64,
    /// Path to the source audio. Validated at submission and again by the
    /// worker right before execution.
    pub input_path: PathBuf,
    /// Language hint. `None` means the worker auto-detects at execution time.
    pub language: Option<String>,
    pub status: TaskStatus,
}

impl Task {
    /// Build a freshly submitted task.
    ///
    /// An empty or whitespace-only language hint is normalized to `None` so
    /// "no hint" has a single representation everywhere downstream.
    pub fn new(id: u64, input_path: impl Into<PathBuf>, language: Option<String>) -> Self {
        let language = language.filter(|lang| !lang.trim().is_empty());
        Self {
            id,
            input_path: input_path.into(),
            language,
            status: TaskStatus::Pending,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_are_stable() {
        assert_eq!(TaskStatus::Pending.code(), 1);
        assert_eq!(TaskStatus::Running.code(), 2);
        assert_eq!(TaskStatus::Finished.code(), 3);
        assert_eq!(TaskStatus::Error.code(), 4);
    }

    #[test]
    fn only_finished_and_error_are_terminal() {
        assert!(!TaskStatus::Pending.is_terminal());
        assert!(!TaskStatus::Running.is_terminal());
        assert!(TaskStatus::Finished.is_terminal());
        assert!(TaskStatus::Error.is_terminal());
    }

    #[test]
    fn new_tasks_start_pending() {
        let task = Task::new(7, "/tmp/a.wav", None);
        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(task.id, 7);
    }

    #[test]
    fn blank_language_hint_normalizes_to_none() {
        assert_eq!(Task::new(1, "a.wav", Some(String::new())).language, None);
        assert_eq!(Task::new(1, "a.wav", Some("  ".to_owned())).language, None);
        assert_eq!(
            Task::new(1, "a.wav", Some("de".to_owned())).language.as_deref(),
            Some("de")
        );
    }
}
