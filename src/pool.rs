use std::collections::HashSet;
use std::hash::Hash;
use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering::*;
use std::time::{Duration, Instant};

use arc_swap::ArcSwapOption;
use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::buffer::{Buffer, WaitTicket};
use crate::{Lease, OwnedLease, PoolError, Result};

/// Default number of resources the buffer holds when no capacity is given.
pub const DEFAULT_CAPACITY: usize = 10;

/// A bounded, thread-safe pool of reusable resources.
///
/// The pool never creates a resource. Callers admit them with
/// [`add`](Self::add), borrow them with [`acquire`](Self::acquire) and hand
/// them back with [`release`](Self::release). Resources are told apart by
/// equality, so the same value can be managed only once at a time.
///
/// A pool starts closed. Call [`open`](Self::open) before using it.
///
/// # Examples
///
/// ```rust
/// use resource_pool::ResourcePool;
/// use std::sync::Arc;
///
/// let pool: Arc<ResourcePool<String>> = Arc::new(ResourcePool::with_capacity(4));
/// pool.open();
/// assert!(pool.add("conn-1".to_string()).unwrap());
///
/// let handles: Vec<_> = (0..4)
///     .map(|_| {
///         let pool = pool.clone();
///         std::thread::spawn(move || {
///             for _ in 0..100 {
///                 let conn = pool.acquire().unwrap();
///                 assert_eq!(conn, "conn-1");
///                 pool.release(conn).unwrap();
///             }
///         })
///     })
///     .collect();
/// for handle in handles {
///     handle.join().unwrap();
/// }
/// assert_eq!(pool.size(), 1);
/// ```
#[derive(Debug)]
pub struct ResourcePool<R> {
    /// Configuration of the pool.
    config: Config,
    /// Buffer of available resources. `None` while the pool is closed.
    buffer: ArcSwapOption<Buffer<R>>,
    /// Every resource the pool manages, available or checked out.
    ///
    /// This mutex is also the pool lock: lifecycle changes and the buffer
    /// pointer swap happen only while it is held.
    managed: Mutex<HashSet<R>>,
    /// Bumped by `interrupt` to abort the waits that are in progress.
    interrupts: AtomicU64,
}

impl<R: Eq + Hash + Clone> Default for ResourcePool<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Eq + Hash + Clone> ResourcePool<R> {
    /// Create a closed pool with the default capacity of 10.
    ///
    /// # Example
    ///
    /// ```rust
    /// use resource_pool::ResourcePool;
    ///
    /// let pool: ResourcePool<u32> = ResourcePool::new();
    /// assert_eq!(pool.capacity(), 10);
    /// assert!(!pool.is_open());
    /// ```
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Create a closed pool with the given capacity.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_config(Config {
            capacity,
            ..Default::default()
        })
    }

    /// Create a closed pool with the given configuration.
    ///
    /// # Panics
    ///
    /// Panics if `config.capacity` is zero.
    pub fn with_config(config: Config) -> Self {
        assert!(config.capacity > 0, "capacity must be greater than zero");
        Self {
            config,
            buffer: ArcSwapOption::const_empty(),
            managed: Mutex::new(HashSet::new()),
            interrupts: AtomicU64::new(0),
        }
    }

    /// Get the capacity of the pool.
    pub fn capacity(&self) -> usize {
        self.config.capacity
    }

    /// Get the configured name of the pool, if any.
    pub fn name(&self) -> Option<&str> {
        self.config.name.as_deref()
    }

    /// Open the pool with an empty buffer and no managed resources.
    ///
    /// Opening an open pool does nothing.
    ///
    /// # Example
    ///
    /// ```rust
    /// use resource_pool::ResourcePool;
    ///
    /// let pool: ResourcePool<u32> = ResourcePool::new();
    /// pool.open();
    /// pool.add(1).unwrap();
    /// pool.open();
    /// assert_eq!(pool.size(), 1);
    /// ```
    pub fn open(&self) {
        let mut managed = self.managed.lock();
        if self.buffer.load().is_some() {
            return;
        }
        managed.clear();
        self.buffer
            .store(Some(Arc::new(Buffer::new(self.config.capacity))));
        debug!(pool = self.label(), capacity = self.config.capacity, "pool opened");
    }

    /// Check if the pool is open.
    pub fn is_open(&self) -> bool {
        self.buffer.load().is_some()
    }

    /// Drain the available resources one at a time, then close the pool.
    ///
    /// Checked-out resources are not reclaimed. Releasing them after the
    /// close drops them. Threads blocked on the pool fail with
    /// [`PoolError::Closed`]. Returns the drained resources so the caller
    /// can dispose of them. Closing a closed pool returns nothing.
    ///
    /// # Example
    ///
    /// ```rust
    /// use resource_pool::ResourcePool;
    ///
    /// let pool: ResourcePool<u32> = ResourcePool::new();
    /// pool.open();
    /// pool.add(1).unwrap();
    /// pool.add(2).unwrap();
    /// assert_eq!(pool.close(), vec![1, 2]);
    /// assert!(!pool.is_open());
    /// ```
    pub fn close(&self) -> Vec<R> {
        let _managed = self.managed.lock();
        let Some(buffer) = self.buffer.load_full() else {
            return Vec::new();
        };

        // Inserts all go through the pool lock, so nothing refills the
        // buffer while it drains.
        let mut drained = Vec::with_capacity(buffer.len());
        while let Some(resource) = buffer.try_take() {
            drained.push(resource);
        }
        self.buffer.store(None);
        buffer.shut();

        debug!(pool = self.label(), drained = drained.len(), "pool closed");
        drained
    }

    /// Discard every available resource in one step, leaving the pool open.
    ///
    /// The discarded resources stop being managed and are returned to the
    /// caller. Checked-out resources stay managed.
    ///
    /// # Example
    ///
    /// ```rust
    /// use resource_pool::ResourcePool;
    ///
    /// let pool: ResourcePool<u32> = ResourcePool::new();
    /// pool.open();
    /// pool.add(1).unwrap();
    /// pool.add(2).unwrap();
    /// assert_eq!(pool.close_now().unwrap(), vec![1, 2]);
    /// assert_eq!(pool.size(), 0);
    /// assert!(pool.is_open());
    /// ```
    pub fn close_now(&self) -> Result<Vec<R>> {
        let mut managed = self.managed.lock();
        let buffer = self.buffer.load_full().ok_or(PoolError::Closed)?;
        let discarded = buffer.edit(std::mem::take);
        for resource in &discarded {
            managed.remove(resource);
        }
        debug!(pool = self.label(), discarded = discarded.len(), "pool emptied");
        Ok(discarded)
    }

    /// Admit a resource, waiting while the buffer is full.
    ///
    /// Returns `false` without blocking if an equal resource is already
    /// managed.
    ///
    /// # Errors
    ///
    /// Fails with [`PoolError::Closed`] if the pool is closed, before or during
    /// the wait, and with [`PoolError::Interrupted`] if the wait is
    /// interrupted. In both cases the resource is dropped, not admitted. Pass
    /// a clone, or an `Arc`, to keep a handle for disposal.
    ///
    /// # Example
    ///
    /// ```rust
    /// use resource_pool::ResourcePool;
    ///
    /// let pool: ResourcePool<&str> = ResourcePool::new();
    /// pool.open();
    /// assert!(pool.add("x").unwrap());
    /// assert!(!pool.add("x").unwrap());
    /// assert_eq!(pool.size(), 1);
    /// ```
    pub fn add(&self, resource: R) -> Result<bool> {
        let ticket = WaitTicket::new(&self.interrupts);
        let mut pending = resource;
        loop {
            let buffer = {
                let mut managed = self.managed.lock();
                let buffer = self.buffer.load_full().ok_or(PoolError::Closed)?;
                if managed.contains(&pending) {
                    return Ok(false);
                }
                managed.insert(pending.clone());
                match buffer.try_put(pending) {
                    Ok(()) => {
                        trace!(pool = self.label(), managed = managed.len(), "resource added");
                        return Ok(true);
                    }
                    Err(resource) => {
                        managed.remove(&resource);
                        pending = resource;
                    }
                }
                buffer
            };
            buffer.wait_for_space(&ticket)?;
        }
    }

    /// Withdraw a resource, wherever it is.
    ///
    /// An available resource is taken out of the buffer. A checked-out
    /// resource is only forgotten, so releasing it later does nothing.
    /// Returns `false` if the resource is not managed.
    ///
    /// # Example
    ///
    /// ```rust
    /// use resource_pool::ResourcePool;
    ///
    /// let pool: ResourcePool<&str> = ResourcePool::new();
    /// pool.open();
    /// pool.add("x").unwrap();
    /// assert!(pool.remove(&"x").unwrap());
    /// assert!(!pool.remove(&"x").unwrap());
    /// assert_eq!(pool.size(), 0);
    /// ```
    pub fn remove(&self, resource: &R) -> Result<bool> {
        let mut managed = self.managed.lock();
        let buffer = self.buffer.load_full().ok_or(PoolError::Closed)?;
        if !managed.remove(resource) {
            return Ok(false);
        }
        let available = buffer.remove(resource).is_some();
        trace!(pool = self.label(), available, "resource removed");
        Ok(true)
    }

    /// Withdraw a resource by draining the whole buffer, cutting the
    /// resource out and refilling the buffer with the rest.
    ///
    /// The outcome is the same as [`remove`](Self::remove).
    pub fn remove_now(&self, resource: &R) -> Result<bool> {
        let mut managed = self.managed.lock();
        let buffer = self.buffer.load_full().ok_or(PoolError::Closed)?;
        if !managed.remove(resource) {
            return Ok(false);
        }
        let available = buffer.edit(|items| {
            items
                .iter()
                .position(|item| item == resource)
                .map(|index| items.remove(index))
                .is_some()
        });
        trace!(pool = self.label(), available, "resource removed by drain");
        Ok(true)
    }

    /// Borrow a resource, waiting as long as it takes for one to become
    /// available.
    ///
    /// The resource stays managed while checked out. Hand it back with
    /// [`release`](Self::release).
    pub fn acquire(&self) -> Result<R> {
        let buffer = self.buffer.load_full().ok_or(PoolError::Closed)?;
        let ticket = WaitTicket::new(&self.interrupts);
        loop {
            if let Some(resource) = buffer.take_until(None, &ticket)? {
                return Ok(resource);
            }
        }
    }

    /// Borrow a resource, waiting at most `timeout`. Return `None` if nothing
    /// became available in time.
    ///
    /// # Example
    ///
    /// ```rust
    /// use resource_pool::ResourcePool;
    /// use std::time::Duration;
    ///
    /// let pool: ResourcePool<u32> = ResourcePool::new();
    /// pool.open();
    /// assert_eq!(pool.acquire_timeout(Duration::from_nanos(1)).unwrap(), None);
    /// ```
    pub fn acquire_timeout(&self, timeout: Duration) -> Result<Option<R>> {
        let buffer = self.buffer.load_full().ok_or(PoolError::Closed)?;
        let ticket = WaitTicket::new(&self.interrupts);
        // A timeout too large to represent waits without a deadline.
        let deadline = Instant::now().checked_add(timeout);
        buffer.take_until(deadline, &ticket)
    }

    /// Return a borrowed resource to the pool, waiting while the buffer is
    /// full.
    ///
    /// A resource that is no longer managed, or that comes back after the pool
    /// closed, is dropped instead.
    ///
    /// Membership is checked by equality, not by which borrow the value came
    /// from. If a checked-out resource is removed and an equal one is added
    /// again, releasing the old copy puts a second equal value into the
    /// buffer.
    ///
    /// # Errors
    ///
    /// Fails with [`PoolError::Interrupted`] if the wait for space is
    /// interrupted. The resource is dropped and stays managed.
    pub fn release(&self, resource: R) -> Result<()> {
        let ticket = WaitTicket::new(&self.interrupts);
        let mut pending = resource;
        loop {
            let buffer = {
                let managed = self.managed.lock();
                let Some(buffer) = self.buffer.load_full() else {
                    trace!(pool = self.label(), "released into closed pool, dropped");
                    return Ok(());
                };
                if !managed.contains(&pending) {
                    trace!(pool = self.label(), "released unmanaged resource, dropped");
                    return Ok(());
                }
                match buffer.try_put(pending) {
                    Ok(()) => return Ok(()),
                    Err(resource) => pending = resource,
                }
                buffer
            };
            buffer.wait_for_space(&ticket)?;
        }
    }

    /// Get the number of available resources. Returns 0 if the pool is closed.
    pub fn size(&self) -> usize {
        self.buffer.load_full().map_or(0, |buffer| buffer.len())
    }

    /// Check if the resource is managed by the pool, available or not.
    pub fn contains(&self, resource: &R) -> bool {
        let managed = self.managed.lock();
        self.is_open() && managed.contains(resource)
    }

    /// Get the number of managed resources, available or checked out.
    pub fn managed(&self) -> usize {
        let managed = self.managed.lock();
        if self.is_open() { managed.len() } else { 0 }
    }

    /// Abort every wait currently in progress on the pool.
    ///
    /// Threads blocked in [`add`](Self::add), [`acquire`](Self::acquire),
    /// [`acquire_timeout`](Self::acquire_timeout) or
    /// [`release`](Self::release) return [`PoolError::Interrupted`]. Calls
    /// made after this one are not affected.
    pub fn interrupt(&self) {
        self.interrupts.fetch_add(1, SeqCst);
        if let Some(buffer) = self.buffer.load_full() {
            buffer.wake_all();
        }
        debug!(pool = self.label(), "pool waiters interrupted");
    }

    /// Borrow a resource that is released back when the lease is dropped.
    ///
    /// # Example
    ///
    /// ```rust
    /// use resource_pool::ResourcePool;
    ///
    /// let pool: ResourcePool<u32> = ResourcePool::new();
    /// pool.open();
    /// pool.add(7).unwrap();
    /// {
    ///     let lease = pool.lease().unwrap();
    ///     assert_eq!(*lease, 7);
    ///     assert_eq!(pool.size(), 0);
    /// }
    /// assert_eq!(pool.size(), 1);
    /// ```
    pub fn lease(&self) -> Result<Lease<'_, R>> {
        self.acquire().map(|resource| Lease::new(resource, self))
    }

    /// Like [`lease`](Self::lease), waiting at most `timeout`.
    pub fn lease_timeout(&self, timeout: Duration) -> Result<Option<Lease<'_, R>>> {
        self.acquire_timeout(timeout)
            .map(|taken| taken.map(|resource| Lease::new(resource, self)))
    }

    /// Borrow a resource through a lease that owns a handle to the pool, so it
    /// can move to another thread.
    pub fn lease_owned(self: &Arc<Self>) -> Result<OwnedLease<R>> {
        self.acquire()
            .map(|resource| OwnedLease::new(resource, Arc::clone(self)))
    }

    fn label(&self) -> &str {
        self.name().unwrap_or("unnamed")
    }
}

/// Configuration for the pool.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Config {
    /// Maximum number of available resources the pool holds at once.
    pub capacity: usize,
    /// Name used to tell pools apart in log events.
    pub name: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            name: None,
        }
    }
}
