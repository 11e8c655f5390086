//! Conduits: the bounded queues that connect stages.
//!
//! A conduit has any number of writers and readers. It closes only when a writer
//! calls [`ConduitWriter::close`] and every other writer handle is gone; dropping
//! writers without closing leaves the conduit open (abandoned). Stages rely on this
//! to tell "finished" apart from "gave up".

use async_trait::async_trait;
use futures::stream::{self, Stream};
use std::sync::{Arc, Mutex as StdMutex, PoisonError};
use thiserror::Error;
use tokio::sync::{mpsc, Mutex};

use crate::pipeline::Pipeline;
use crate::traits::Receive;
use crate::util::CancellableExt;

struct Shared<T> {
    rx: Mutex<mpsc::Receiver<T>>,
    // Holds the channel open until an explicit close.
    keepalive: StdMutex<Option<mpsc::Sender<T>>>,
}

/// Create a conduit buffering up to `capacity` values (at least one).
pub fn conduit<T: Send + 'static>(capacity: usize) -> (ConduitWriter<T>, Conduit<T>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    let shared = Arc::new(Shared {
        rx: Mutex::new(rx),
        keepalive: StdMutex::new(Some(tx.clone())),
    });

    (
        ConduitWriter {
            tx,
            shared: shared.clone(),
        },
        Conduit { shared },
    )
}

/// Reading end of a conduit. Clones share the same queue.
pub struct Conduit<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for Conduit<T> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<T> std::fmt::Debug for Conduit<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Conduit").finish_non_exhaustive()
    }
}

/// Why [`Conduit::try_recv`] returned no value
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TryRecvError {
    /// Nothing is available right now
    #[error("conduit is empty")]
    Empty,
    /// Another reader is parked on the conduit; its state could not be inspected
    #[error("conduit is held by another reader")]
    Busy,
    /// The conduit was closed and drained
    #[error("conduit is closed")]
    Closed,
}

impl<T: Send + 'static> Conduit<T> {
    /// Take a value without waiting.
    ///
    /// Reports `Busy` while another reader is waiting in `recv`, whether or not
    /// values are queued or the conduit has closed.
    pub fn try_recv(&self) -> Result<T, TryRecvError> {
        let Ok(mut rx) = self.shared.rx.try_lock() else {
            return Err(TryRecvError::Busy);
        };
        rx.try_recv().map_err(|err| match err {
            mpsc::error::TryRecvError::Empty => TryRecvError::Empty,
            mpsc::error::TryRecvError::Disconnected => TryRecvError::Closed,
        })
    }

    /// Turn this reader into a stream that ends when the conduit closes or the
    /// pipeline is cancelled.
    pub fn into_stream(self, pp: &Pipeline) -> impl Stream<Item = T> + Send + 'static {
        let pp = pp.clone();
        stream::unfold(self, move |conduit| {
            let pp = pp.clone();
            async move {
                let value = read(&pp, &conduit).await?;
                Some((value, conduit))
            }
        })
    }
}

#[async_trait]
impl<T: Send + 'static> Receive for Conduit<T> {
    type Item = T;

    async fn recv(&self) -> Option<T> {
        self.shared.rx.lock().await.recv().await
    }
}

/// Writing end of a conduit. Clones feed the same queue.
pub struct ConduitWriter<T> {
    tx: mpsc::Sender<T>,
    shared: Arc<Shared<T>>,
}

impl<T> Clone for ConduitWriter<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            shared: self.shared.clone(),
        }
    }
}

impl<T> std::fmt::Debug for ConduitWriter<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConduitWriter").finish_non_exhaustive()
    }
}

impl<T: Send + 'static> ConduitWriter<T> {
    /// Enqueue a value, waiting for room. `false` if the conduit can never be read.
    pub(crate) async fn send(&self, value: T) -> bool {
        self.tx.send(value).await.is_ok()
    }

    pub(crate) fn try_send(&self, value: T) -> Result<(), mpsc::error::TrySendError<T>> {
        self.tx.try_send(value)
    }

    /// Close the conduit.
    ///
    /// Readers see the end of the stream once buffered values are drained and
    /// every other writer handle has been dropped.
    pub fn close(self) {
        self.shared
            .keepalive
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }
}

/// Write `value`, racing the pipeline's cancellation.
///
/// Returns `false` without delivering if the pipeline is cancelled first.
pub async fn write<T: Send + 'static>(pp: &Pipeline, out: &ConduitWriter<T>, value: T) -> bool {
    if pp.is_cancelled() {
        return false;
    }
    out.send(value).cancellable(pp).await.unwrap_or(false)
}

/// Read one value, racing the pipeline's cancellation.
///
/// `None` means no more values will come, either because the input closed or
/// because the pipeline is shutting down.
pub async fn read<R: Receive + ?Sized>(pp: &Pipeline, input: &R) -> Option<R::Item> {
    if pp.is_cancelled() {
        return None;
    }
    input.recv().cancellable(pp).await.flatten()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn dropping_writers_does_not_close() {
        let (tx, rx) = conduit::<u32>(1);
        let extra = tx.clone();
        drop(tx);
        drop(extra);

        assert_eq!(rx.try_recv(), Err(TryRecvError::Empty));
        let waited = tokio::time::timeout(Duration::from_millis(20), rx.recv()).await;
        assert!(waited.is_err(), "abandoned conduit must stay open");
    }

    #[tokio::test]
    async fn close_drains_then_ends() {
        let (tx, rx) = conduit::<u32>(4);
        tx.send(1).await;
        tx.send(2).await;
        tx.close();

        assert_eq!(rx.recv().await, Some(1));
        assert_eq!(rx.try_recv(), Ok(2));
        assert_eq!(rx.recv().await, None);
        assert_eq!(rx.try_recv(), Err(TryRecvError::Closed));
    }

    #[tokio::test]
    async fn close_waits_for_other_writers() {
        let (tx, rx) = conduit::<u32>(1);
        let other = tx.clone();
        tx.close();

        assert_eq!(rx.try_recv(), Err(TryRecvError::Empty));
        other.send(7).await;
        drop(other);

        assert_eq!(rx.recv().await, Some(7));
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn try_recv_reports_busy_while_reader_parked() {
        let (tx, rx) = conduit::<u32>(1);
        tx.close();

        let parked = rx.clone();
        let mut waiting = tokio_test::task::spawn(async move {
            let guard = parked.shared.rx.lock().await;
            futures::future::pending::<()>().await;
            drop(guard);
        });
        tokio_test::assert_pending!(waiting.poll());

        assert_eq!(rx.try_recv(), Err(TryRecvError::Busy));
        drop(waiting);
        assert_eq!(rx.try_recv(), Err(TryRecvError::Closed));
    }

    #[tokio::test]
    async fn readers_share_one_queue() {
        let (tx, rx) = conduit::<u32>(8);
        let rx2 = rx.clone();
        for k in 0..4 {
            tx.send(k).await;
        }
        tx.close();

        let mut seen = Vec::new();
        while let Some(v) = rx.recv().await {
            seen.push(v);
            if let Some(v) = rx2.recv().await {
                seen.push(v);
            }
        }
        seen.sort();
        assert_eq!(seen, vec![0, 1, 2, 3]);
    }
}
