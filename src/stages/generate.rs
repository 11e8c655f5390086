use std::future::Future;

use crate::conduit::{conduit, write, Conduit, ConduitWriter};
use crate::error::{Error, Result};
use crate::oneshot::{Oneshot, OneshotMut};
use crate::pipeline::Pipeline;
use crate::task::report;

/// Cancellation-aware handle a producer writes through.
pub struct Writer<T> {
    pp: Pipeline,
    out: ConduitWriter<T>,
}

impl<T: Send + 'static> Writer<T> {
    /// Deliver `value` downstream; `false` once the pipeline is cancelled.
    ///
    /// A producer should stop as soon as this returns `false`.
    pub async fn write(&self, value: T) -> bool {
        write(&self.pp, &self.out, value).await
    }

    /// Whether the pipeline has been cancelled
    pub fn is_cancelled(&self) -> bool {
        self.pp.is_cancelled()
    }
}

// Closes the output however the producer task ends, panics included.
struct CloseOnExit<T: Send + 'static>(Option<ConduitWriter<T>>);

impl<T: Send + 'static> Drop for CloseOnExit<T> {
    fn drop(&mut self) {
        if let Some(out) = self.0.take() {
            out.close();
        }
    }
}

/// Spawn `producer` with a [`Writer`] bound to a new conduit.
///
/// The conduit closes when the producer returns, whether it finished, stopped
/// early or was cancelled.
pub fn generate<T, F, Fut>(pp: &Pipeline, producer: F) -> Conduit<T>
where
    T: Send + 'static,
    F: FnOnce(Writer<T>) -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let (out, reader) = conduit(pp.config().buffer_size);
    let writer = Writer {
        pp: pp.clone(),
        out: out.clone(),
    };

    pp.spawn(async move {
        let _close = CloseOnExit(Some(out));
        producer(writer).await;
    });

    reader
}

/// Like [`generate`] for producers that can fail.
///
/// The error goes to the returned slot; the conduit is still closed so values
/// written before the failure stay readable.
pub fn generate_err<T, F, Fut>(pp: &Pipeline, producer: F) -> (Conduit<T>, Oneshot<Error>)
where
    T: Send + 'static,
    F: FnOnce(Writer<T>) -> Fut + Send + 'static,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    let (out, reader) = conduit(pp.config().buffer_size);
    let errors = OneshotMut::new();
    let error_reader = errors.reader();
    let writer = Writer {
        pp: pp.clone(),
        out: out.clone(),
    };

    pp.spawn(async move {
        let _close = CloseOnExit(Some(out));
        if let Err(err) = producer(writer).await {
            report(&errors, err);
        }
    });

    (reader, error_reader)
}
