//! Write-once value slots.
//!
//! A [`OneshotMut`] accepts at most `capacity` writes over its whole life (one for
//! a plain oneshot, `n` for a group shared by `n` workers). Writing never blocks;
//! going over capacity is a bug in the caller and panics. The reading side,
//! [`Oneshot`], never closes: if nothing is ever written, readers wait until
//! something else (usually cancellation) ends the wait.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc::error::TrySendError;

use crate::conduit::{conduit, Conduit, ConduitWriter};
use crate::traits::Receive;

/// Writing side of a oneshot slot (or group of slots).
pub struct OneshotMut<T> {
    tx: ConduitWriter<T>,
    rx: Conduit<T>,
    written: Arc<AtomicUsize>,
    capacity: usize,
}

impl<T> Clone for OneshotMut<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            rx: self.rx.clone(),
            written: self.written.clone(),
            capacity: self.capacity,
        }
    }
}

impl<T> std::fmt::Debug for OneshotMut<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OneshotMut")
            .field("written", &self.written.load(Ordering::Relaxed))
            .field("capacity", &self.capacity)
            .finish()
    }
}

impl<T: Send + 'static> OneshotMut<T> {
    /// A slot that accepts exactly one write
    pub fn new() -> Self {
        Self::group(1)
    }

    /// A slot group that `size` independent writers may each write once
    pub fn group(size: usize) -> Self {
        let capacity = size.max(1);
        let (tx, rx) = conduit(capacity);
        Self {
            tx,
            rx,
            written: Arc::new(AtomicUsize::new(0)),
            capacity,
        }
    }

    /// Reading side of this slot
    pub fn reader(&self) -> Oneshot<T> {
        Oneshot {
            rx: self.rx.clone(),
        }
    }

    /// Store a value without blocking.
    ///
    /// # Panics
    ///
    /// Panics when the slot (or every slot of the group) has already been written.
    /// The panic unwinds only the calling task: inside a tracked task it ends that
    /// task with a panicking [`JoinError`](tokio::task::JoinError) and the rest of
    /// the process keeps running, so every writer must write at most once.
    pub fn write(&self, value: T) {
        let previous = self.written.fetch_add(1, Ordering::AcqRel);
        if previous >= self.capacity {
            log_error!(capacity = self.capacity, "oneshot written too many times");
            panic!(
                "oneshot write must not block: slot of capacity {} was already written; \
                 make sure each writer writes at most once",
                self.capacity
            );
        }

        match self.tx.try_send(value) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) | Err(TrySendError::Closed(_)) => {
                unreachable!("oneshot buffer is sized to its write budget")
            }
        }
    }

    /// Number of writes performed so far
    pub fn written(&self) -> usize {
        self.written.load(Ordering::Acquire).min(self.capacity)
    }
}

impl<T: Send + 'static> Default for OneshotMut<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Reading side of a oneshot.
///
/// Each written value is delivered to exactly one reader; clones share the slot.
pub struct Oneshot<T> {
    rx: Conduit<T>,
}

impl<T> Clone for Oneshot<T> {
    fn clone(&self) -> Self {
        Self {
            rx: self.rx.clone(),
        }
    }
}

impl<T> std::fmt::Debug for Oneshot<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Oneshot").finish_non_exhaustive()
    }
}

impl<T: Send + 'static> Oneshot<T> {
    /// Take the value if one has been written
    pub fn try_recv(&self) -> Option<T> {
        self.rx.try_recv().ok()
    }
}

#[async_trait]
impl<T: Send + 'static> Receive for Oneshot<T> {
    type Item = T;

    /// Never resolves to `None`; pends until a value is written.
    async fn recv(&self) -> Option<T> {
        self.rx.recv().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_pending, assert_ready_eq, task};

    #[test]
    fn write_is_non_blocking_and_readable() {
        let slot = OneshotMut::<u32>::new();
        let reader = slot.reader();

        let mut pending = task::spawn(reader.recv());
        assert_pending!(pending.poll());

        slot.write(42);
        assert!(pending.is_woken());
        assert_ready_eq!(pending.poll(), Some(42));
        assert_eq!(slot.written(), 1);
    }

    #[test]
    fn unwritten_slot_never_closes() {
        let slot = OneshotMut::<u32>::new();
        let reader = slot.reader();
        drop(slot);

        let mut pending = task::spawn(reader.recv());
        assert_pending!(pending.poll());
        assert_eq!(reader.try_recv(), None);
    }

    #[test]
    #[should_panic(expected = "oneshot write must not block")]
    fn second_write_panics() {
        let slot = OneshotMut::new();
        slot.write(1);
        slot.write(2);
    }

    #[test]
    #[should_panic(expected = "oneshot write must not block")]
    fn second_write_panics_even_after_read() {
        let slot = OneshotMut::new();
        let reader = slot.reader();
        slot.write(1);
        assert_eq!(reader.try_recv(), Some(1));
        slot.write(2);
    }

    #[test]
    fn group_accepts_one_write_per_member() {
        let group = OneshotMut::group(3);
        let reader = group.reader();
        for k in 0..3 {
            group.clone().write(k);
        }

        assert_eq!(reader.try_recv(), Some(0));
        assert_eq!(reader.try_recv(), Some(1));
        assert_eq!(reader.try_recv(), Some(2));
        assert_eq!(reader.try_recv(), None);
    }

    #[test]
    #[should_panic]
    fn group_overflow_panics() {
        let group = OneshotMut::group(2);
        group.write('a');
        group.write('b');
        group.write('c');
    }
}
