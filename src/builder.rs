use std::hash::Hash;

use crate::{Config, ResourcePool};

/// A builder for creating a [`ResourcePool`] with custom configuration.
///
/// # Example
///
/// ```rust
/// use resource_pool::Builder;
///
/// let pool = Builder::new().capacity(4).name("connections").build::<String>();
/// assert_eq!(pool.capacity(), 4);
/// assert_eq!(pool.name(), Some("connections"));
/// assert!(!pool.is_open());
/// ```
#[derive(Debug, Default)]
pub struct Builder {
    /// Configuration of the pool.
    config: Config,
}

impl Builder {
    /// Create a new builder with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder starting from an existing configuration.
    pub fn from_config(config: Config) -> Self {
        Self { config }
    }

    /// Set the maximum number of available resources in the pool.
    pub fn capacity(&mut self, capacity: usize) -> &mut Self {
        self.config.capacity = capacity;
        self
    }

    /// Set the name used for the pool in log events.
    pub fn name(&mut self, name: impl Into<String>) -> &mut Self {
        self.config.name = Some(name.into());
        self
    }

    /// Build a closed pool with the current configuration.
    ///
    /// # Panics
    ///
    /// Panics if the capacity is zero.
    pub fn build<R: Eq + Hash + Clone>(&mut self) -> ResourcePool<R> {
        let config = std::mem::take(&mut self.config);
        ResourcePool::with_config(config)
    }
}
