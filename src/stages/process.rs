use std::future::Future;
use std::sync::Arc;

use super::pool::{after_all, assert_workers, spawn_pool, Exit};
use crate::conduit::read;
use crate::error::{Error, Result};
use crate::oneshot::{Oneshot, OneshotMut};
use crate::pipeline::Pipeline;
use crate::signal::{Signal, SignalMut};
use crate::task::report;
use crate::traits::Receive;

/// Consume `input` with `f` on `workers` concurrent workers.
///
/// The returned signal fires once every worker has exited, whether the input
/// closed or the pipeline was cancelled.
///
/// # Panics
///
/// Panics if `workers` is zero.
pub fn process<S, F, Fut>(pp: &Pipeline, workers: usize, input: S, f: F) -> Signal
where
    S: Receive + 'static,
    F: Fn(S::Item) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let finished = SignalMut::new();
    let signal = finished.signal();
    let input = Arc::new(input);
    let f = Arc::new(f);

    let handles = spawn_pool(pp, workers, || {
        let pp = pp.clone();
        let input = input.clone();
        let f = f.clone();

        async move {
            while let Some(value) = read(&pp, input.as_ref()).await {
                f(value).await;
            }
            Exit::Drained
        }
    });

    after_all(pp, "process", handles, None, move || finished.set());
    signal
}

/// Like [`process`] for sinks that can fail.
///
/// A failing worker reports its error and stops, and the signal stays pending.
///
/// # Panics
///
/// Panics if `workers` is zero.
pub fn process_err<S, F, Fut>(
    pp: &Pipeline,
    workers: usize,
    input: S,
    f: F,
) -> (Signal, Oneshot<Error>)
where
    S: Receive + 'static,
    F: Fn(S::Item) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    assert_workers(workers);
    let finished = SignalMut::new();
    let signal = finished.signal();
    let errors = OneshotMut::group(workers);
    let error_reader = errors.reader();
    let input = Arc::new(input);
    let f = Arc::new(f);

    let handles = spawn_pool(pp, workers, || {
        let pp = pp.clone();
        let input = input.clone();
        let f = f.clone();
        let errors = errors.clone();

        async move {
            while let Some(value) = read(&pp, input.as_ref()).await {
                if let Err(err) = f(value).await {
                    report(&errors, err);
                    return Exit::Failed;
                }
            }
            Exit::Drained
        }
    });

    after_all(pp, "process", handles, Some(errors), move || finished.set());
    (signal, error_reader)
}
