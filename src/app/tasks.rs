//! Bounded background task pool
//!
//! Each user action (login, fetch, download) runs as one task on the tokio
//! runtime. A semaphore caps how many run at once. Every task gets a
//! [`ProgressReporter`], and its [`TaskHandle`] exposes the three channels the
//! caller listens on: progress updates, the result, and the error.
//!
//! A panicking task is caught at the task boundary and surfaces as
//! [`TaskError::Panicked`]; the pool itself is unaffected.

use std::any::Any;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::{mpsc, Semaphore};
use tokio::task::{JoinError, JoinHandle};

use crate::constants::tasks;
use crate::errors::TaskError;

/// Progress update sent from a running task
#[derive(Debug, Clone, PartialEq)]
pub struct TaskProgress {
    /// Whole percent, when the task knows it
    pub percent: Option<u8>,
    /// Human-readable status
    pub message: String,
}

/// Sending half of a task's progress channel
#[derive(Debug, Clone)]
pub struct ProgressReporter {
    sender: mpsc::UnboundedSender<TaskProgress>,
}

impl ProgressReporter {
    /// Reports a percentage with a message
    pub fn percent(&self, percent: u8, message: impl Into<String>) {
        self.send(TaskProgress {
            percent: Some(percent.min(100)),
            message: message.into(),
        });
    }

    /// Reports a status message without a percentage
    pub fn message(&self, message: impl Into<String>) {
        self.send(TaskProgress {
            percent: None,
            message: message.into(),
        });
    }

    fn send(&self, progress: TaskProgress) {
        // receiver gone means nobody is watching; the task carries on
        let _ = self.sender.send(progress);
    }
}

/// Handle to one spawned task
#[derive(Debug)]
pub struct TaskHandle<T> {
    name: String,
    handle: JoinHandle<T>,
    progress: mpsc::UnboundedReceiver<TaskProgress>,
}

impl<T> TaskHandle<T> {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Next progress update, or `None` once the task has finished reporting
    pub async fn next_progress(&mut self) -> Option<TaskProgress> {
        self.progress.recv().await
    }

    /// Waits for the task's result
    ///
    /// # Errors
    ///
    /// Returns `TaskError::Panicked` if the task panicked and
    /// `TaskError::Aborted` if it was cancelled by the runtime
    pub async fn join(self) -> Result<T, TaskError> {
        let name = self.name;
        self.handle
            .await
            .map_err(|e| join_error_to_task_error(&name, e))
    }

    /// Forwards every progress update to `on_progress`, then waits for the result
    pub async fn wait_with_progress<F>(mut self, mut on_progress: F) -> Result<T, TaskError>
    where
        F: FnMut(TaskProgress),
    {
        while let Some(progress) = self.progress.recv().await {
            on_progress(progress);
        }
        self.join().await
    }
}

/// Pool that runs tasks with bounded concurrency
#[derive(Debug, Clone)]
pub struct TaskPool {
    permits: Arc<Semaphore>,
    max_concurrent: usize,
}

impl Default for TaskPool {
    fn default() -> Self {
        Self::new(tasks::DEFAULT_MAX_CONCURRENT_TASKS)
    }
}

impl TaskPool {
    /// Pool allowing `max_concurrent` tasks at once (at least one)
    pub fn new(max_concurrent: usize) -> Self {
        let max_concurrent = max_concurrent.max(1);
        Self {
            permits: Arc::new(Semaphore::new(max_concurrent)),
            max_concurrent,
        }
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Permits currently free
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    /// Spawns `task`, which starts once a permit is free
    pub fn spawn<F, Fut, T>(&self, name: impl Into<String>, task: F) -> TaskHandle<T>
    where
        F: FnOnce(ProgressReporter) -> Fut + Send + 'static,
        Fut: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let name = name.into();
        let (sender, receiver) = mpsc::unbounded_channel();
        let reporter = ProgressReporter { sender };
        let permits = Arc::clone(&self.permits);
        let task_name = name.clone();

        let handle = tokio::spawn(async move {
            // the semaphore is never closed
            let _permit = permits.acquire_owned().await;
            tracing::debug!("Task '{}' started", task_name);
            let output = task(reporter).await;
            tracing::debug!("Task '{}' finished", task_name);
            output
        });

        TaskHandle {
            name,
            handle,
            progress: receiver,
        }
    }
}

fn join_error_to_task_error(name: &str, error: JoinError) -> TaskError {
    if error.is_panic() {
        let message = panic_message(error.into_panic());
        tracing::error!("Unexpected error in task '{}': {}", name, message);
        TaskError::Panicked {
            task: name.to_string(),
            message,
        }
    } else {
        tracing::warn!("Task '{}' was aborted", name);
        TaskError::Aborted {
            task: name.to_string(),
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
