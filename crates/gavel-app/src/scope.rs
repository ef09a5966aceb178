// Owned handles for background tasks.
//
// Every timer and network call the control loop starts is wrapped in a
// `ScopedTask`; dropping or cancelling the handle aborts the task, so nothing
// outlives the loop that started it.

use std::future::Future;

use tokio::task::JoinHandle;
use tracing::debug;

/// A spawned task that is aborted when cancelled or dropped.
#[derive(Debug)]
pub struct ScopedTask {
    label: &'static str,
    handle: Option<JoinHandle<()>>,
}

impl ScopedTask {
    pub fn spawn<F>(label: &'static str, future: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        ScopedTask {
            label,
            handle: Some(tokio::spawn(future)),
        }
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Abort the task. Safe to call any number of times.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            if !handle.is_finished() {
                debug!(task = self.label, "cancelling task");
            }
            handle.abort();
        }
    }

    /// True once the task has completed or been cancelled.
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, JoinHandle::is_finished)
    }
}

impl Drop for ScopedTask {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// A set of tasks torn down together.
#[derive(Debug, Default)]
pub struct TaskScope {
    tasks: Vec<ScopedTask>,
}

impl TaskScope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn<F>(&mut self, label: &'static str, future: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.tasks.retain(|t| !t.is_finished());
        self.tasks.push(ScopedTask::spawn(label, future));
    }

    /// Number of tasks that have not finished yet.
    pub fn running(&self) -> usize {
        self.tasks.iter().filter(|t| !t.is_finished()).count()
    }

    pub fn cancel_all(&mut self) {
        for task in &mut self.tasks {
            task.cancel();
        }
        self.tasks.clear();
    }
}

impl Drop for TaskScope {
    fn drop(&mut self) {
        self.cancel_all();
    }
}
