//! Pipeline lifecycle.
//!
//! A [`Pipeline`] owns the cancellation signal and the set of live tasks for one
//! processing network. Every stage spawns through it, so [`Pipeline::shutdown`]
//! can cancel the network and wait until the last task has exited.
//!
//! ```text
//! Pipeline::new() ──► spawn / stages ──► shutdown()
//!                                          │
//!                                          ├─ fire `done`
//!                                          └─ wait live tasks == 0
//! ```

use std::future::Future;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::task::TaskTracker;

use crate::error::{Error, Result};
use crate::metrics::LiveTaskGuard;
use crate::signal::{Signal, SignalMut};

/// Configuration for a pipeline
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PipelineConfig {
    /// Capacity of every conduit created by the stages
    pub buffer_size: usize,
    /// Name attached to log events
    pub name: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            buffer_size: 1,
            name: "pipeline".to_string(),
        }
    }
}

struct Inner {
    config: PipelineConfig,
    done: Signal,
    cancel: Mutex<Option<SignalMut>>,
    cause: OnceLock<Error>,
    tracker: TaskTracker,
}

/// Handle to a running processing network.
///
/// Cloning is cheap; every clone refers to the same pipeline. A pipeline is not
/// reused after shutdown: tasks spawned afterwards observe cancellation at once.
#[derive(Clone)]
pub struct Pipeline {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("name", &self.inner.config.name)
            .field("cancelled", &self.is_cancelled())
            .field("live_tasks", &self.live_tasks())
            .finish()
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl Pipeline {
    /// Create a pipeline with the default configuration
    pub fn new() -> Self {
        Self::with_config(PipelineConfig::default())
    }

    /// Create a pipeline with `config`
    pub fn with_config(config: PipelineConfig) -> Self {
        let cancel = SignalMut::new();
        log_debug!(pipeline = %config.name, buffer_size = config.buffer_size, "pipeline created");

        Self {
            inner: Arc::new(Inner {
                done: cancel.signal(),
                cancel: Mutex::new(Some(cancel)),
                cause: OnceLock::new(),
                tracker: TaskTracker::new(),
                config,
            }),
        }
    }

    /// Start building a pipeline
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    /// The configuration this pipeline was built with
    pub fn config(&self) -> &PipelineConfig {
        &self.inner.config
    }

    /// The cancellation signal
    pub fn done(&self) -> Signal {
        self.inner.done.clone()
    }

    /// Whether cancellation has fired
    pub fn is_cancelled(&self) -> bool {
        self.inner.done.is_set()
    }

    /// Number of tracked tasks that have not exited yet
    pub fn live_tasks(&self) -> usize {
        self.inner.tracker.len()
    }

    /// Why the pipeline was cancelled; [`Error::Cancelled`] unless a cause was given.
    pub fn cause(&self) -> Error {
        self.inner
            .cause
            .get()
            .cloned()
            .unwrap_or(Error::Cancelled)
    }

    /// Spawn a tracked task.
    ///
    /// The task counts as live until its future completes or panics. It must
    /// observe cancellation on every blocking wait, or [`shutdown`](Self::shutdown)
    /// will not return.
    pub fn spawn<F>(&self, task: F) -> JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        let guard = LiveTaskGuard::enter();
        self.inner.tracker.spawn(async move {
            let _guard = guard;
            task.await
        })
    }

    /// Fire cancellation without waiting for tasks to exit.
    ///
    /// Safe to call from inside a tracked task, where awaiting
    /// [`shutdown`](Self::shutdown) would wait on itself.
    pub fn cancel(&self) {
        self.fire(None);
    }

    /// Fire cancellation, recording `cause` if this is the first cancellation.
    pub fn cancel_with(&self, cause: Error) {
        self.fire(Some(cause));
    }

    fn fire(&self, cause: Option<Error>) {
        let mut cancel = self
            .inner
            .cancel
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        // The cause is recorded under the same lock that decides the first cancellation.
        if let Some(fired) = cancel.take() {
            if let Some(cause) = cause {
                let _ = self.inner.cause.set(cause);
            }
            log_debug!(pipeline = %self.inner.config.name, live_tasks = self.live_tasks(), "cancelling pipeline");
            fired.set();
        }
    }

    /// Cancel the pipeline and wait until every tracked task has exited.
    ///
    /// Calling it again after it completed returns immediately.
    pub async fn shutdown(&self) {
        self.cancel();
        self.inner.tracker.close();
        self.inner.tracker.wait().await;
        log_info!(pipeline = %self.inner.config.name, "pipeline shut down");
    }

    /// Like [`shutdown`](Self::shutdown) but gives up waiting after `grace`.
    ///
    /// Cancellation has fired either way; on timeout the remaining tasks keep
    /// running until they notice it.
    pub async fn shutdown_with_grace(&self, grace: Duration) -> Result<()> {
        match tokio::time::timeout(grace, self.shutdown()).await {
            Ok(()) => Ok(()),
            Err(_) => {
                log_warn!(
                    pipeline = %self.inner.config.name,
                    live_tasks = self.live_tasks(),
                    grace_ms = grace.as_millis() as u64,
                    "shutdown grace exceeded"
                );
                Err(Error::timeout(grace.as_millis() as u64))
            }
        }
    }
}

/// Builder for [`Pipeline`]
#[derive(Debug, Default)]
pub struct PipelineBuilder {
    config: PipelineConfig,
}

impl PipelineBuilder {
    /// Set the conduit capacity used by stages
    pub fn buffer_size(mut self, size: usize) -> Self {
        self.config.buffer_size = size.max(1);
        self
    }

    /// Set the name attached to log events
    pub fn name<S: Into<String>>(mut self, name: S) -> Self {
        self.config.name = name.into();
        self
    }

    /// Build the pipeline
    pub fn build(self) -> Pipeline {
        Pipeline::with_config(self.config)
    }
}
