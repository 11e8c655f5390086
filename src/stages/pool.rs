//! Worker pool plumbing shared by transform and process.

use futures::future::join_all;
use std::future::Future;
use tokio::task::JoinHandle;

use crate::error::Error;
use crate::oneshot::OneshotMut;
use crate::pipeline::Pipeline;
use crate::task::report;

/// How a worker left its loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Exit {
    /// A read or write gave up: the input closed or the pipeline was cancelled
    Drained,
    /// The callback reported an error
    Failed,
}

pub(crate) fn assert_workers(workers: usize) {
    assert!(workers > 0, "a worker pool needs at least one worker");
}

/// Spawn `workers` tracked tasks built by `worker`.
pub(crate) fn spawn_pool<W, Fut>(pp: &Pipeline, workers: usize, worker: W) -> Vec<JoinHandle<Exit>>
where
    W: Fn() -> Fut,
    Fut: Future<Output = Exit> + Send + 'static,
{
    assert_workers(workers);
    (0..workers).map(|_| pp.spawn(worker())).collect()
}

/// Spawn a tracked task that waits for the pool and runs `on_success` unless a
/// worker failed or panicked.
///
/// Panicked workers are reported on `errors` when the stage has an error slot;
/// they never wrote to it, so the group's capacity still holds.
pub(crate) fn after_all<F>(
    pp: &Pipeline,
    stage: &'static str,
    handles: Vec<JoinHandle<Exit>>,
    errors: Option<OneshotMut<Error>>,
    on_success: F,
) where
    F: FnOnce() + Send + 'static,
{
    pp.spawn(async move {
        let mut succeeded = true;

        for joined in join_all(handles).await {
            match joined {
                Ok(Exit::Drained) => {}
                Ok(Exit::Failed) => succeeded = false,
                Err(err) => {
                    succeeded = false;
                    log_warn!(stage = stage, error = %err, "stage worker panicked");
                    if let Some(errors) = &errors {
                        report(errors, Error::from(err));
                    }
                }
            }
        }

        if succeeded {
            log_debug!(stage = stage, "all workers exited without error");
            on_success();
        }
    });
}
