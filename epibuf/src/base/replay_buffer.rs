//! Buffer interfaces used by training loops.
//!
//! A training loop pushes collected experiences into a buffer and pulls batches
//! out of it. The two sides are separate traits so that a process only
//! collecting experiences does not need to know how batches are made.
use anyhow::Result;

/// Interface for buffers that store experiences from environments.
///
/// # Examples
///
/// ```ignore
/// struct SimpleBuffer<T> {
///     items: Vec<T>,
/// }
///
/// impl<T> ExperienceBufferBase for SimpleBuffer<T> {
///     type Item = T;
///
///     fn push(&mut self, tr: T) -> Result<()> {
///         self.items.push(tr);
///         Ok(())
///     }
///
///     fn len(&self) -> usize {
///         self.items.len()
///     }
/// }
/// ```
pub trait ExperienceBufferBase {
    /// The type of items pushed into the buffer.
    type Item;

    /// Pushes experiences into the buffer.
    fn push(&mut self, tr: Self::Item) -> Result<()>;

    /// Returns the number of steps currently stored.
    fn len(&self) -> usize;
}

/// Interface for buffers that generate batches for training.
///
/// This trait is independent of [`ExperienceBufferBase`] and only covers
/// building the buffer and drawing batches from it.
pub trait ReplayBufferBase {
    /// Configuration parameters of the buffer.
    type Config: Clone;

    /// The type of batch generated for training.
    type Batch;

    /// Builds a new buffer from the given configuration.
    fn build(config: &Self::Config) -> Self;

    /// Draws a batch of `size` steps for training.
    fn batch(&mut self, size: usize) -> Result<Self::Batch>;
}
