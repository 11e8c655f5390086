//! Waiting on a variable number of inputs at once.
//!
//! Every operation here keeps a live set of inputs. An input whose `recv`
//! reports closure is retired from the set without counting as a value or as
//! cancellation; when the set runs dry the wait reports exhaustion. The
//! pipeline's cancellation is always checked first.

use futures::future::select_all;

use crate::conduit::{conduit, read, write, Conduit};
use crate::error::{Error, Result};
use crate::oneshot::{Oneshot, OneshotMut};
use crate::pipeline::Pipeline;
use crate::traits::Receive;

enum Race<T> {
    Value(T),
    Exhausted,
    Cancelled,
}

/// Wait for the first value from any input in `live`, retiring closed inputs.
async fn race<'a, S>(pp: &Pipeline, live: &mut Vec<&'a S>) -> Race<S::Item>
where
    S: Receive + ?Sized,
{
    if pp.is_cancelled() {
        return Race::Cancelled;
    }

    let done = pp.done();
    loop {
        if live.is_empty() {
            return Race::Exhausted;
        }

        let pending = select_all(live.iter().copied().map(|input| input.recv()));
        tokio::select! {
            biased;
            _ = done.wait() => return Race::Cancelled,
            (received, index, _) = pending => match received {
                Some(value) => return Race::Value(value),
                None => {
                    live.swap_remove(index);
                }
            },
        }
    }
}

/// Wait for a value from any of `inputs`.
///
/// Returns `None` once the pipeline is cancelled, even if a value is ready, or
/// once every input has closed. Ties between ready inputs go to either.
pub async fn wait_first<S: Receive>(pp: &Pipeline, inputs: &[S]) -> Option<S::Item> {
    let mut live: Vec<&S> = inputs.iter().collect();
    match race(pp, &mut live).await {
        Race::Value(value) => Some(value),
        Race::Exhausted | Race::Cancelled => None,
    }
}

/// Spawn a task that delivers the first value from any of `inputs`.
///
/// If every input closes without a value the oneshot is never written.
pub fn first<S>(pp: &Pipeline, inputs: Vec<S>) -> Oneshot<S::Item>
where
    S: Receive + 'static,
{
    let result = OneshotMut::new();
    let reader = result.reader();
    let task_pp = pp.clone();

    pp.spawn(async move {
        if let Some(value) = wait_first(&task_pp, &inputs).await {
            result.write(value);
        }
    });

    reader
}

/// Merge several error slots or conduits into one slot carrying the first error.
pub fn first_err<S>(pp: &Pipeline, errors: Vec<S>) -> Oneshot<Error>
where
    S: Receive<Item = Error> + 'static,
{
    first(pp, errors)
}

/// Merge `inputs` into one conduit.
///
/// The merged conduit closes after every input has closed; on cancellation it is
/// abandoned. Ordering across inputs is unspecified.
pub fn fan_in<S>(pp: &Pipeline, inputs: Vec<S>) -> Conduit<S::Item>
where
    S: Receive + 'static,
{
    let (out, reader) = conduit(pp.config().buffer_size);
    let task_pp = pp.clone();

    pp.spawn(async move {
        let pp = task_pp;
        let mut live: Vec<&S> = inputs.iter().collect();
        loop {
            match race(&pp, &mut live).await {
                Race::Value(value) => {
                    if !write(&pp, &out, value).await {
                        return;
                    }
                }
                Race::Exhausted => {
                    log_debug!(inputs = inputs.len(), "fan-in inputs exhausted");
                    out.close();
                    return;
                }
                Race::Cancelled => return,
            }
        }
    });

    reader
}

enum Step<T> {
    Value(Option<T>),
    Error(Option<Error>, usize),
}

/// Read a value from `values` unless an error arrives first.
///
/// Cancellation wins over everything and yields [`Pipeline::cause`]. Between a
/// ready value and a ready error either may win. Error inputs that close are
/// retired; once none remain this is a plain [`read`] of `values`, and a closed
/// `values` reports [`Error::ChannelClosed`].
pub async fn read_err<V, E>(pp: &Pipeline, values: &V, errors: &[E]) -> Result<V::Item>
where
    V: Receive + ?Sized,
    E: Receive<Item = Error>,
{
    if pp.is_cancelled() {
        return Err(pp.cause());
    }

    let done = pp.done();
    let mut live: Vec<&E> = errors.iter().collect();
    while !live.is_empty() {
        let pending_errors = select_all(live.iter().copied().map(|input| input.recv()));
        let step = async move {
            tokio::select! {
                value = values.recv() => Step::Value(value),
                (error, index, _) = pending_errors => Step::Error(error, index),
            }
        };

        tokio::select! {
            biased;
            _ = done.wait() => return Err(pp.cause()),
            step = step => match step {
                Step::Value(Some(value)) => return Ok(value),
                Step::Value(None) => return Err(Error::ChannelClosed),
                Step::Error(Some(err), _) => return Err(err),
                Step::Error(None, index) => {
                    live.swap_remove(index);
                }
            },
        }
    }

    match read(pp, values).await {
        Some(value) => Ok(value),
        None if pp.is_cancelled() => Err(pp.cause()),
        None => Err(Error::ChannelClosed),
    }
}
