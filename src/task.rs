//! Tracked task primitives.
//!
//! These are the lowest-level stages: a single task spawned through the pipeline,
//! optionally reporting completion through a [`Signal`] and failure through a
//! [`Oneshot`].

use std::future::Future;

use crate::error::{Error, Result};
use crate::metrics::record_stage_error;
use crate::oneshot::{Oneshot, OneshotMut};
use crate::pipeline::Pipeline;
use crate::signal::{Signal, SignalMut};

/// Spawn a tracked task with no completion report.
pub fn go<F>(pp: &Pipeline, task: F)
where
    F: Future<Output = ()> + Send + 'static,
{
    pp.spawn(task);
}

/// Spawn a tracked task that can fail; its error is written to the returned slot.
pub fn go_err<F>(pp: &Pipeline, task: F) -> Oneshot<Error>
where
    F: Future<Output = Result<()>> + Send + 'static,
{
    let errors = OneshotMut::new();
    let reader = errors.reader();

    pp.spawn(async move {
        if let Err(err) = task.await {
            report(&errors, err);
        }
    });

    reader
}

/// Spawn a tracked task; the returned signal fires when it finishes.
///
/// The signal stays pending if the task panics.
pub fn run<F>(pp: &Pipeline, task: F) -> Signal
where
    F: Future<Output = ()> + Send + 'static,
{
    let finished = SignalMut::new();
    let signal = finished.signal();

    pp.spawn(async move {
        task.await;
        finished.set();
    });

    signal
}

/// Spawn a tracked task that can fail.
///
/// The signal fires only on success; an error is delivered through the slot
/// instead and the signal stays pending.
pub fn run_err<F>(pp: &Pipeline, task: F) -> (Signal, Oneshot<Error>)
where
    F: Future<Output = Result<()>> + Send + 'static,
{
    let finished = SignalMut::new();
    let signal = finished.signal();
    let errors = OneshotMut::new();
    let reader = errors.reader();

    pp.spawn(async move {
        match task.await {
            Ok(()) => finished.set(),
            Err(err) => report(&errors, err),
        }
    });

    (signal, reader)
}

pub(crate) fn report(errors: &OneshotMut<Error>, err: Error) {
    log_debug!(error = %err, label = err.as_label(), "stage reported an error");
    record_stage_error(err.as_label());
    errors.write(err);
}
