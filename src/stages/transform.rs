use std::future::Future;
use std::sync::Arc;

use super::pool::{after_all, assert_workers, spawn_pool, Exit};
use crate::conduit::{conduit, read, write, Conduit};
use crate::error::{Error, Result};
use crate::oneshot::{Oneshot, OneshotMut};
use crate::pipeline::Pipeline;
use crate::task::report;
use crate::traits::Receive;

/// Map `input` through `f` on `workers` concurrent workers.
///
/// Output order follows completion, not input order. The output closes once every
/// worker has exited, whether the input closed or the pipeline was cancelled.
///
/// # Panics
///
/// Panics if `workers` is zero.
pub fn transform<S, U, F, Fut>(pp: &Pipeline, workers: usize, input: S, f: F) -> Conduit<U>
where
    S: Receive + 'static,
    U: Send + 'static,
    F: Fn(S::Item) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = U> + Send + 'static,
{
    let (out, reader) = conduit(pp.config().buffer_size);
    let input = Arc::new(input);
    let f = Arc::new(f);

    let handles = spawn_pool(pp, workers, || {
        let pp = pp.clone();
        let input = input.clone();
        let f = f.clone();
        let out = out.clone();

        async move {
            while let Some(value) = read(&pp, input.as_ref()).await {
                if !write(&pp, &out, f(value).await).await {
                    break;
                }
            }
            Exit::Drained
        }
    });

    after_all(pp, "transform", handles, None, move || out.close());
    reader
}

/// Like [`transform`] for callbacks that can fail.
///
/// A worker whose callback fails reports the error and stops; the others keep
/// going. The output then never closes, so consumers should watch the error slot
/// with [`read_err`](crate::read_err). The slot holds up to one error per worker.
///
/// # Panics
///
/// Panics if `workers` is zero.
pub fn transform_err<S, U, F, Fut>(
    pp: &Pipeline,
    workers: usize,
    input: S,
    f: F,
) -> (Conduit<U>, Oneshot<Error>)
where
    S: Receive + 'static,
    U: Send + 'static,
    F: Fn(S::Item) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<U>> + Send + 'static,
{
    assert_workers(workers);
    let (out, reader) = conduit(pp.config().buffer_size);
    let errors = OneshotMut::group(workers);
    let error_reader = errors.reader();
    let input = Arc::new(input);
    let f = Arc::new(f);

    let handles = spawn_pool(pp, workers, || {
        let pp = pp.clone();
        let input = input.clone();
        let f = f.clone();
        let out = out.clone();
        let errors = errors.clone();

        async move {
            while let Some(value) = read(&pp, input.as_ref()).await {
                match f(value).await {
                    Ok(mapped) => {
                        if !write(&pp, &out, mapped).await {
                            break;
                        }
                    }
                    Err(err) => {
                        report(&errors, err);
                        return Exit::Failed;
                    }
                }
            }
            Exit::Drained
        }
    });

    after_all(pp, "transform", handles, Some(errors), move || out.close());
    (reader, error_reader)
}
