//! The application context shared by HTTP handlers and the worker.
//!
//! We build one `Scrivener` per process at startup: it loads the engine once
//! (expensive), composes the task registry and dispatch queue, and hands out
//! the operations the gateway and worker need. Nothing in here blocks beyond
//! a map or queue mutation; engine calls happen on the worker thread without
//! any registry lock held.

use std::path::Path;
use std::sync::Arc;

use tracing::warn;

use crate::engine::{Engine, EngineKind};
use crate::output::OutputWriter;
use crate::queue::DispatchQueue;
use crate::registry::TaskRegistry;
use crate::task::{Task, TaskStatus};

/// The process-wide transcription context.
///
/// Typical usage:
/// - Construct once at startup (`new` loads the model).
/// - Share behind an `Arc` with the HTTP gateway and the worker.
pub struct Scrivener {
    engine: Box<dyn Engine>,
    writer: OutputWriter,
    registry: TaskRegistry,
    queue: DispatchQueue,
}

impl Scrivener {
    /// Load the configured engine variant and build the context around it.
    pub fn new(kind: EngineKind, model_path: &str, gpu_device: i32) -> crate::Result<Arc<Self>> {
        let engine = crate::engines::load(kind, model_path, gpu_device)?;
        Ok(Arc::new(Self::with_engine(engine, kind)))
    }

    /// Build the context around an already-constructed engine.
    ///
    /// This is the seam tests use to substitute the engine.
    pub fn with_engine(engine: Box<dyn Engine>, kind: EngineKind) -> Self {
        Self {
            engine,
            writer: OutputWriter::new(kind),
            registry: TaskRegistry::new(),
            queue: DispatchQueue::new(),
        }
    }

    /// Admit a task for execution.
    ///
    /// Returns `true` when the task was newly registered and queued. An id
    /// that is still active (pending, running, or terminal-but-unread) is
    /// left untouched and `false` is returned; only the registering caller
    /// enqueues, so one submission means one queue entry.
    pub fn submit(&self, id: u64, input_path: &Path, language: Option<String>) -> bool {
        let inserted = self.registry.insert_new(Task::new(id, input_path, language));
        if inserted {
            self.queue.enqueue(id);
        }
        inserted
    }

    /// Status poll with consume-once semantics (see [`TaskRegistry::observe`]).
    pub fn status(&self, id: u64) -> Option<TaskStatus> {
        self.registry.observe(id)
    }

    /// Claim the next runnable task: dequeue its id, mark it `Running`, and
    /// return it. Returns `None` when the queue is empty.
    ///
    /// Ids whose registry entry has vanished are logged and skipped.
    pub fn claim_next(&self) -> Option<Task> {
        while let Some(id) = self.queue.dequeue() {
            match self.registry.claim(id) {
                Some(task) => return Some(task),
                None => warn!(task_id = id, "dequeued unknown task id, skipping"),
            }
        }
        None
    }

    /// Record a terminal status for `id`.
    pub fn finish(&self, id: u64, status: TaskStatus) {
        self.registry.set_status(id, status);
    }

    /// The engine selected at startup.
    pub fn engine(&self) -> &dyn Engine {
        self.engine.as_ref()
    }

    /// The artifact writer keyed to the selected engine variant.
    pub fn writer(&self) -> &OutputWriter {
        &self.writer
    }

    /// Number of tasks waiting in the dispatch queue.
    pub fn queue_depth(&self) -> usize {
        self.queue.len()
    }

    /// Number of active tasks (pending, running, or unconsumed terminal).
    pub fn task_count(&self) -> usize {
        self.registry.len()
    }
}
