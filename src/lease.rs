use std::fmt::{Debug, Display};
use std::hash::Hash;
use std::ops::Deref;
use std::sync::Arc;

use tracing::warn;

use crate::ResourcePool;

/// A resource borrowed from a [`ResourcePool`].
///
/// `Lease` holds the resource and a reference to the pool. When it is dropped,
/// the resource is released back to the pool.
///
/// Only shared access is given out: the pool tells resources apart by
/// equality, so a resource must not change while it is checked out.
pub struct Lease<'a, R: Eq + Hash + Clone> {
    // `resource` is always `Some` until the lease is dropped or detached.
    resource: Option<R>,
    pool: &'a ResourcePool<R>,
}

impl<'a, R: Eq + Hash + Clone> Lease<'a, R> {
    pub(crate) fn new(resource: R, pool: &'a ResourcePool<R>) -> Self {
        Self {
            resource: Some(resource),
            pool,
        }
    }

    /// Take the resource out without returning it to the pool.
    ///
    /// The resource stays managed and checked out. Pass it to
    /// [`ResourcePool::release`] later to hand it back.
    pub fn into_inner(mut self) -> R {
        self.resource.take().unwrap()
    }
}

impl<R: Eq + Hash + Clone> Deref for Lease<'_, R> {
    type Target = R;
    fn deref(&self) -> &Self::Target {
        self.resource.as_ref().unwrap()
    }
}

impl<R: Eq + Hash + Clone> Drop for Lease<'_, R> {
    fn drop(&mut self) {
        if let Some(resource) = self.resource.take() {
            release_on_drop(self.pool, resource);
        }
    }
}

impl<R: Eq + Hash + Clone + Debug> Debug for Lease<'_, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Debug::fmt(&**self, f)
    }
}

impl<R: Eq + Hash + Clone + Display> Display for Lease<'_, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&**self, f)
    }
}

/// A resource borrowed from a [`ResourcePool`] held in an `Arc`.
///
/// Unlike [`Lease`] it is not tied to a borrow of the pool, so it can be sent
/// to another thread. When it is dropped, the resource is released back to
/// the pool.
pub struct OwnedLease<R: Eq + Hash + Clone> {
    // `resource` is always `Some` until the lease is dropped or detached.
    resource: Option<R>,
    pool: Arc<ResourcePool<R>>,
}

impl<R: Eq + Hash + Clone> OwnedLease<R> {
    pub(crate) fn new(resource: R, pool: Arc<ResourcePool<R>>) -> Self {
        Self {
            resource: Some(resource),
            pool,
        }
    }

    /// Get the pool the resource came from.
    pub fn pool(&self) -> &Arc<ResourcePool<R>> {
        &self.pool
    }

    /// Take the resource out without returning it to the pool.
    ///
    /// The resource stays managed and checked out.
    pub fn into_inner(mut self) -> R {
        self.resource.take().unwrap()
    }
}

impl<R: Eq + Hash + Clone> Deref for OwnedLease<R> {
    type Target = R;
    fn deref(&self) -> &Self::Target {
        self.resource.as_ref().unwrap()
    }
}

impl<R: Eq + Hash + Clone> Drop for OwnedLease<R> {
    fn drop(&mut self) {
        if let Some(resource) = self.resource.take() {
            release_on_drop(&self.pool, resource);
        }
    }
}

impl<R: Eq + Hash + Clone + Debug> Debug for OwnedLease<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Debug::fmt(&**self, f)
    }
}

impl<R: Eq + Hash + Clone + Display> Display for OwnedLease<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&**self, f)
    }
}

fn release_on_drop<R: Eq + Hash + Clone>(pool: &ResourcePool<R>, resource: R) {
    if let Err(error) = pool.release(resource) {
        warn!(pool = pool.name().unwrap_or("unnamed"), %error, "lease dropped its resource");
    }
}
