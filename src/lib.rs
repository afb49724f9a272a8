//! A bounded, thread-safe pool of reusable resources.
//!
//! # Features
//!
//! - Fixed capacity, 10 by default.
//! - Resources are deduplicated by equality. A value can be managed only once.
//! - Thread-safe: many threads can add, acquire, release and remove resources
//!   concurrently.
//! - Borrowing and returning never contend with admission and withdrawal on
//!   the same lock.
//! - Blocking waits can be bounded with a timeout, aborted with
//!   [`ResourcePool::interrupt`], or ended by closing the pool.
//!
//! # Lifecycle
//!
//! A pool starts closed. [`ResourcePool::open`] allocates the buffer,
//! [`ResourcePool::close`] drains it and deallocates it. Between the two,
//! every managed resource is either *available* (in the buffer) or *checked
//! out* (held by the caller that acquired it).
//!
//! # Examples
//!
//! ## Borrowing and returning
//!
//! ```rust
//! use resource_pool::ResourcePool;
//!
//! let pool: ResourcePool<&str> = ResourcePool::with_capacity(10);
//! pool.open();
//! assert!(pool.add("x").unwrap());
//! assert!(!pool.add("x").unwrap());
//!
//! let resource = pool.acquire().unwrap();
//! assert_eq!(pool.size(), 0);
//! pool.release(resource).unwrap();
//! assert_eq!(pool.size(), 1);
//! ```
//!
//! ## Withdrawing a checked-out resource
//!
//! ```rust
//! use resource_pool::ResourcePool;
//!
//! let pool: ResourcePool<&str> = ResourcePool::new();
//! pool.open();
//! pool.add("x").unwrap();
//! let resource = pool.acquire().unwrap();
//! assert!(pool.remove(&"x").unwrap());
//! // The pool forgot about it, so releasing does nothing.
//! pool.release(resource).unwrap();
//! assert_eq!(pool.size(), 0);
//! ```
//!
//! ## Sharing across threads
//!
//! ```rust
//! use resource_pool::ResourcePool;
//! use std::sync::Arc;
//!
//! let pool: Arc<ResourcePool<u32>> = Arc::new(ResourcePool::new());
//! pool.open();
//! pool.add(1).unwrap();
//!
//! let worker = {
//!     let pool = pool.clone();
//!     std::thread::spawn(move || {
//!         let lease = pool.lease_owned().unwrap();
//!         *lease + 1
//!     })
//! };
//! assert_eq!(worker.join().unwrap(), 2);
//! assert_eq!(pool.size(), 1);
//! ```

mod buffer;
mod builder;
mod error;
mod lease;
mod pool;

pub use builder::Builder;
pub use error::{PoolError, Result};
pub use lease::{Lease, OwnedLease};
pub use pool::{Config, DEFAULT_CAPACITY, ResourcePool};
