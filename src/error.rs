use thiserror::Error;

/// Errors returned by [`ResourcePool`](crate::ResourcePool) operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum PoolError {
    /// The pool is not open, or it was closed while the caller was waiting.
    #[error("pool is closed")]
    Closed,

    /// A blocking wait was aborted by [`ResourcePool::interrupt`](crate::ResourcePool::interrupt).
    #[error("interrupted while waiting on the pool")]
    Interrupted,
}

/// A specialized `Result` type for pool operations, returning the crate's
/// [`PoolError`] type as the error value.
pub type Result<T> = std::result::Result<T, PoolError>;
