//! The background worker: a single dedicated thread that drains the dispatch
//! queue and runs one task at a time to a terminal status.
//!
//! The loop never exits on a failed task; failures are recorded as task
//! state and the worker moves on. Only the stop flag ends the loop.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::Result;
use tracing::{error, info, warn};

use crate::scrivener::Scrivener;
use crate::task::{Task, TaskStatus};

/// Default idle backoff between queue polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Handle to the background worker thread.
pub struct WorkerHandle {
    stop: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

impl WorkerHandle {
    /// Signal the worker to stop and wait for the in-flight task to finish.
    ///
    /// The stop flag is checked between tasks, so shutdown waits for at most
    /// one task execution plus one poll interval.
    pub fn shutdown(self) {
        self.stop.store(true, Ordering::Relaxed);
        if self.handle.join().is_err() {
            error!("worker thread panicked");
        }
    }
}

/// Spawn the transcription worker.
///
/// One worker per process: tasks execute strictly one at a time, in
/// submission order.
pub fn spawn(core: Arc<Scrivener>, poll_interval: Duration) -> WorkerHandle {
    let stop = Arc::new(AtomicBool::new(false));
    let stop_flag = stop.clone();
    let handle = thread::spawn(move || run(core, poll_interval, stop_flag));

    WorkerHandle { stop, handle }
}

fn run(core: Arc<Scrivener>, poll_interval: Duration, stop: Arc<AtomicBool>) {
    info!("worker started");

    while !stop.load(Ordering::Relaxed) {
        let Some(task) = core.claim_next() else {
            thread::sleep(poll_interval);
            continue;
        };
        execute(&core, &task);
    }

    info!("worker stopped");
}

/// Run one claimed task to a terminal status. Errors never propagate out.
fn execute(core: &Scrivener, task: &Task) {
    info!(
        task_id = task.id,
        path = %task.input_path.display(),
        "task started"
    );

    // The file was present at submission time; it may be gone by now.
    if !task.input_path.exists() {
        warn!(
            task_id = task.id,
            path = %task.input_path.display(),
            "input file missing"
        );
        core.finish(task.id, TaskStatus::Error);
        return;
    }

    match transcribe(core, task) {
        Ok(written) => {
            for path in &written {
                info!(task_id = task.id, path = %path.display(), "artifact written");
            }
            core.finish(task.id, TaskStatus::Finished);
            info!(task_id = task.id, "task complete");
        }
        Err(err) => {
            error!(task_id = task.id, error = ?err, "task failed");
            core.finish(task.id, TaskStatus::Error);
        }
    }
}

fn transcribe(core: &Scrivener, task: &Task) -> Result<Vec<PathBuf>> {
    let language = match &task.language {
        Some(language) => language.clone(),
        None => core.engine().detect_language(&task.input_path)?,
    };
    info!(task_id = task.id, %language, "language resolved");

    let segments = core.engine().transcribe(&task.input_path, &language)?;

    // Artifacts land next to the input, named by its stem.
    let output_dir = task.input_path.parent().unwrap_or_else(|| Path::new("."));
    let written = core.writer().write(&segments, &task.input_path, output_dir)?;

    Ok(written)
}
