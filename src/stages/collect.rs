use std::future::Future;

use crate::error::{Error, Result};
use crate::oneshot::{Oneshot, OneshotMut};
use crate::pipeline::Pipeline;
use crate::task::report;

/// Run an aggregation task and deliver its result through a oneshot.
///
/// The task is expected to read its inputs with [`read`](crate::read) and stop on
/// `None`; after cancellation it should return whatever partial result it has.
pub fn collect<T, F>(pp: &Pipeline, task: F) -> Oneshot<T>
where
    T: Send + 'static,
    F: Future<Output = T> + Send + 'static,
{
    let result = OneshotMut::new();
    let reader = result.reader();

    pp.spawn(async move {
        result.write(task.await);
    });

    reader
}

/// Like [`collect`] for aggregations that can fail.
///
/// Exactly one of the two slots is written.
pub fn collect_err<T, F>(pp: &Pipeline, task: F) -> (Oneshot<T>, Oneshot<Error>)
where
    T: Send + 'static,
    F: Future<Output = Result<T>> + Send + 'static,
{
    let result = OneshotMut::new();
    let reader = result.reader();
    let errors = OneshotMut::new();
    let error_reader = errors.reader();

    pp.spawn(async move {
        match task.await {
            Ok(value) => result.write(value),
            Err(err) => report(&errors, err),
        }
    });

    (reader, error_reader)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conduit::read;
    use crate::stages::generate;
    use crate::traits::Receive;

    #[tokio::test]
    async fn sums_until_input_closes() {
        let pp = Pipeline::new();
        let input = generate(&pp, |w| async move {
            for k in 0..10u32 {
                if !w.write(k).await {
                    return;
                }
            }
        });

        let reader = pp.clone();
        let sum = collect(&pp, async move {
            let mut acc = 0;
            while let Some(v) = read(&reader, &input).await {
                acc += v;
            }
            acc
        });

        assert_eq!(sum.recv().await, Some(45));
        pp.shutdown().await;
    }

    #[tokio::test]
    async fn error_goes_to_error_slot_only() {
        let pp = Pipeline::new();
        let (value, errors) = collect_err(&pp, async { Err::<u32, _>(Error::custom("nope")) });

        let err = errors.recv().await.expect("error slot closed");
        assert_eq!(err.to_string(), "nope");
        pp.shutdown().await;
        assert_eq!(value.try_recv(), None);
    }
}
