use std::fmt;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering::*;
use std::time::Instant;

use crossbeam_queue::ArrayQueue;
use parking_lot::{Condvar, Mutex, RwLock};

use crate::{PoolError, Result};

/// A bounded FIFO buffer with blocking transfers.
///
/// Single-item transfers (`try_put`, `try_take` and the blocking waits built on
/// them) go straight to the lock-free [`ArrayQueue`] and only share the
/// `structure` lock with each other. Whole-buffer edits (`remove`, `edit`) hold
/// `structure` exclusively, so a transfer never observes a half-rotated queue.
///
/// Waiters park on `signal`. Every state change that can unblock a waiter
/// acquires `signal` before notifying, which closes the window between a
/// waiter's last check and its wait.
///
/// Lock order is `signal` then `structure`. Exclusive edits release
/// `structure` before touching `signal`.
pub(crate) struct Buffer<R> {
    queue: ArrayQueue<R>,
    structure: RwLock<()>,
    signal: Mutex<Signal>,
    not_empty: Condvar,
    not_full: Condvar,
}

#[derive(Debug, Default)]
struct Signal {
    /// Set once by `shut`. Every present and future waiter fails with `Closed`.
    closed: bool,
    /// Threads parked on `not_empty`.
    takers: usize,
    /// Threads parked on `not_full`.
    putters: usize,
}

/// Snapshot of the pool's interrupt counter taken when a blocking call starts.
///
/// A wait fails with [`PoolError::Interrupted`] once the counter has moved on
/// from the snapshot.
#[derive(Debug, Clone, Copy)]
pub(crate) struct WaitTicket<'a> {
    counter: &'a AtomicU64,
    seen: u64,
}

impl<'a> WaitTicket<'a> {
    pub(crate) fn new(counter: &'a AtomicU64) -> Self {
        Self {
            counter,
            seen: counter.load(SeqCst),
        }
    }

    fn is_interrupted(&self) -> bool {
        self.counter.load(SeqCst) != self.seen
    }
}

impl<R> fmt::Debug for Buffer<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Buffer")
            .field("capacity", &self.queue.capacity())
            .field("len", &self.queue.len())
            .field("signal", &*self.signal.lock())
            .finish()
    }
}

impl<R> Buffer<R> {
    /// Create an empty buffer. `capacity` must be non-zero.
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            queue: ArrayQueue::new(capacity),
            structure: RwLock::new(()),
            signal: Mutex::new(Signal::default()),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.queue.len()
    }

    /// Push without blocking. Hands the item back if the buffer is full.
    pub(crate) fn try_put(&self, item: R) -> std::result::Result<(), R> {
        let pushed = {
            let _shared = self.structure.read();
            self.queue.push(item)
        };
        if pushed.is_ok() {
            self.wake_takers(1);
        }
        pushed
    }

    /// Pop without blocking.
    pub(crate) fn try_take(&self) -> Option<R> {
        let item = self.pop_shared();
        if item.is_some() {
            self.wake_putters(1);
        }
        item
    }

    /// Pop, waiting while the buffer is empty.
    ///
    /// Returns `Ok(None)` only when `deadline` passes with nothing to take. With
    /// no deadline the wait is unbounded.
    pub(crate) fn take_until(
        &self,
        deadline: Option<Instant>,
        ticket: &WaitTicket<'_>,
    ) -> Result<Option<R>> {
        if let Some(item) = self.try_take() {
            return Ok(Some(item));
        }

        let mut signal = self.signal.lock();
        let mut expired = false;
        loop {
            if let Some(item) = self.pop_shared() {
                if signal.putters > 0 {
                    self.not_full.notify_one();
                }
                return Ok(Some(item));
            }
            if signal.closed {
                return Err(PoolError::Closed);
            }
            if ticket.is_interrupted() {
                return Err(PoolError::Interrupted);
            }
            if expired {
                return Ok(None);
            }

            signal.takers += 1;
            expired = match deadline {
                Some(deadline) => self.not_empty.wait_until(&mut signal, deadline).timed_out(),
                None => {
                    self.not_empty.wait(&mut signal);
                    false
                }
            };
            signal.takers -= 1;
        }
    }

    /// Wait until the buffer has at least one free slot.
    ///
    /// The slot is not reserved. Callers retry their insert and come back here
    /// if somebody else filled it first.
    pub(crate) fn wait_for_space(&self, ticket: &WaitTicket<'_>) -> Result<()> {
        let mut signal = self.signal.lock();
        while self.queue.is_full() {
            if signal.closed {
                return Err(PoolError::Closed);
            }
            if ticket.is_interrupted() {
                return Err(PoolError::Interrupted);
            }

            signal.putters += 1;
            self.not_full.wait(&mut signal);
            signal.putters -= 1;
        }
        Ok(())
    }

    /// Remove the first item equal to `target` by rotating the queue once.
    ///
    /// Relative order of the remaining items is preserved.
    pub(crate) fn remove(&self, target: &R) -> Option<R>
    where
        R: PartialEq,
    {
        let removed = {
            let _exclusive = self.structure.write();
            let mut removed = None;
            for _ in 0..self.queue.len() {
                let Some(item) = self.queue.pop() else {
                    break;
                };
                if removed.is_none() && item == *target {
                    removed = Some(item);
                } else {
                    self.push_exclusive(item);
                }
            }
            removed
        };
        if removed.is_some() {
            self.wake_putters(1);
        }
        removed
    }

    /// Drain every item into a `Vec`, let `func` edit it, then refill the
    /// buffer from what is left, in order.
    ///
    /// `func` may remove and reorder items but must not add any.
    pub(crate) fn edit<T, F>(&self, func: F) -> T
    where
        F: FnOnce(&mut Vec<R>) -> T,
    {
        let (output, freed) = {
            let _exclusive = self.structure.write();
            let mut items = Vec::with_capacity(self.queue.len());
            while let Some(item) = self.queue.pop() {
                items.push(item);
            }
            let drained = items.len();
            let output = func(&mut items);
            debug_assert!(items.len() <= drained, "edit must not grow the buffer");
            let freed = drained.saturating_sub(items.len());
            for item in items {
                self.push_exclusive(item);
            }
            (output, freed)
        };
        self.wake_putters(freed);
        output
    }

    /// Fail every current and future wait with [`PoolError::Closed`].
    pub(crate) fn shut(&self) {
        let mut signal = self.signal.lock();
        signal.closed = true;
        self.not_empty.notify_all();
        self.not_full.notify_all();
    }

    /// Wake every waiter so it can re-check its [`WaitTicket`].
    pub(crate) fn wake_all(&self) {
        let _signal = self.signal.lock();
        self.not_empty.notify_all();
        self.not_full.notify_all();
    }

    fn pop_shared(&self) -> Option<R> {
        let _shared = self.structure.read();
        self.queue.pop()
    }

    fn push_exclusive(&self, item: R) {
        if self.queue.push(item).is_err() {
            unreachable!("buffer cannot fill up while it is edited exclusively");
        }
    }

    fn wake_takers(&self, count: usize) {
        let signal = self.signal.lock();
        Self::wake(&self.not_empty, signal.takers, count);
    }

    fn wake_putters(&self, count: usize) {
        if count == 0 {
            return;
        }
        let signal = self.signal.lock();
        Self::wake(&self.not_full, signal.putters, count);
    }

    fn wake(condvar: &Condvar, waiting: usize, count: usize) {
        if waiting == 0 {
            return;
        }
        if count >= waiting {
            condvar.notify_all();
        } else {
            for _ in 0..count {
                condvar.notify_one();
            }
        }
    }
}
